//! Common repository traits
//!
//! Generic interfaces shared by the table repositories. Table-specific queries
//! (filters, joins, transactions) live as inherent methods on each repository.

/// Inserts a new row and returns the stored entity
///
/// # Type Parameters
/// * `Entity` - Type of the returned entity (with the id assigned by the database)
/// * `CreateDTO` - Insert payload, without generated columns
pub trait Create<Entity, CreateDTO> {
    /// # Returns
    /// * `Ok(Entity)` - Created entity with its primary key
    /// * `Err(sqlx::Error)` - Error during insertion
    async fn create(&self, data: &CreateDTO) -> Result<Entity, sqlx::Error>;
}

/// Reads a single entity by primary key
///
/// # Type Parameters
/// * `Entity` - Type of the entity to read
/// * `Id` - Type of the primary key (`i64` for generated keys, `String` for users)
pub trait Read<Entity, Id> {
    /// # Returns
    /// * `Ok(Some(Entity))` - Entity found
    /// * `Ok(None)` - No entity with that id
    /// * `Err(sqlx::Error)` - Error during reading
    async fn read(&self, id: &Id) -> Result<Option<Entity>, sqlx::Error>;
}

/// Reads several entities by primary key in one query
///
/// # Note
/// Entities come back in database order, which may not match the order of `ids`.
/// Missing ids are silently skipped.
pub trait ReadMany<Entity, Id> {
    async fn read_many(&self, ids: &[Id]) -> Result<Vec<Entity>, sqlx::Error>;
}

/// Partially updates an entity
///
/// # Type Parameters
/// * `UpdateDTO` - Only `Some(_)` fields are written
pub trait Update<Entity, UpdateDTO, Id> {
    /// # Returns
    /// * `Ok(Entity)` - Updated entity
    /// * `Err(sqlx::Error::RowNotFound)` - No entity with that id
    async fn update(&self, id: &Id, data: &UpdateDTO) -> Result<Entity, sqlx::Error>;
}

/// Deletes an entity; dependent rows follow the schema's cascade rules
pub trait Delete<Id> {
    async fn delete(&self, id: &Id) -> Result<(), sqlx::Error>;
}
