//! UserRepository - users table

use super::{Create, Read, ReadMany, contains_pattern};
use crate::dtos::CreateUserDTO;
use crate::entities::User;
use chrono::Utc;
use sqlx::{Error, QueryBuilder, Sqlite, SqlitePool};

const USER_COLUMNS: &str = "user_id, name, email, image, email_verified, created_at";

pub struct UserRepository {
    connection_pool: SqlitePool,
}

impl UserRepository {
    pub fn new(connection_pool: SqlitePool) -> UserRepository {
        Self { connection_pool }
    }

    /// Emails are unique; the match ignores ASCII case
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER(?)"
        ))
        .bind(email)
        .fetch_optional(&self.connection_pool)
        .await?;

        Ok(user)
    }

    /// Every user whose email matches, whatever the id (diagnostics)
    pub async fn find_all_by_email(&self, email: &str) -> Result<Vec<User>, Error> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER(?) ORDER BY created_at"
        ))
        .bind(email)
        .fetch_all(&self.connection_pool)
        .await?;

        Ok(users)
    }

    /// Refreshes name and picture from the identity provider
    pub async fn update_profile(
        &self,
        user_id: &str,
        name: Option<&str>,
        image: Option<&str>,
    ) -> Result<User, Error> {
        sqlx::query(
            "UPDATE users SET name = COALESCE(?, name), image = COALESCE(?, image) WHERE user_id = ?",
        )
        .bind(name)
        .bind(image)
        .bind(user_id)
        .execute(&self.connection_pool)
        .await?;

        self.read(&user_id.to_string())
            .await?
            .ok_or(Error::RowNotFound)
    }

    /// Partial, case-insensitive match on name or email
    pub async fn search(&self, pattern: &str) -> Result<Vec<User>, Error> {
        let like = contains_pattern(pattern);
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users
             WHERE LOWER(COALESCE(name, '')) LIKE ? ESCAPE '\\' OR LOWER(email) LIKE ? ESCAPE '\\'
             ORDER BY name LIMIT 10"
        ))
        .bind(&like)
        .bind(&like)
        .fetch_all(&self.connection_pool)
        .await?;

        Ok(users)
    }

    /// Users holding at least one attendance that is not declined
    pub async fn list_with_open_attendances(&self) -> Result<Vec<User>, Error> {
        let users = sqlx::query_as::<_, User>(
            "SELECT DISTINCT u.user_id, u.name, u.email, u.image, u.email_verified, u.created_at
             FROM users u
             JOIN attendances a ON a.user_id = u.user_id
             WHERE a.status IN ('PROPOSED', 'CONFIRMED')
             ORDER BY u.name",
        )
        .fetch_all(&self.connection_pool)
        .await?;

        Ok(users)
    }

    /// Moves a user to a new id, rewriting every reference in one transaction.
    ///
    /// # Returns
    /// * `Err(Error::RowNotFound)` - No user with `old_id`
    pub async fn reassign_id(&self, old_id: &str, new_id: &str) -> Result<User, Error> {
        let mut tx = self.connection_pool.begin().await?;

        let existing = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE user_id = ?"
        ))
        .bind(old_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(Error::RowNotFound)?;

        // The new row takes a placeholder email until the old one is gone
        let placeholder = format!("{}.migrating", existing.email);
        sqlx::query(
            "INSERT INTO users (user_id, name, email, image, email_verified, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(new_id)
        .bind(&existing.name)
        .bind(&placeholder)
        .bind(&existing.image)
        .bind(existing.email_verified)
        .bind(existing.created_at)
        .execute(&mut *tx)
        .await?;

        let rewrites = [
            "UPDATE events SET creator_id = ? WHERE creator_id = ?",
            "UPDATE events SET paid_by_id = ? WHERE paid_by_id = ?",
            "UPDATE attendances SET user_id = ? WHERE user_id = ?",
            "UPDATE attendances SET invited_by_id = ? WHERE invited_by_id = ?",
            "UPDATE attendances SET paid_by_id = ? WHERE paid_by_id = ?",
            "UPDATE bills SET payer_id = ? WHERE payer_id = ?",
            "UPDATE attachments SET uploaded_by_id = ? WHERE uploaded_by_id = ?",
        ];
        for statement in rewrites {
            sqlx::query(statement)
                .bind(new_id)
                .bind(old_id)
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query("DELETE FROM users WHERE user_id = ?")
            .bind(old_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("UPDATE users SET email = ? WHERE user_id = ?")
            .bind(&existing.email)
            .bind(new_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(User {
            user_id: new_id.to_string(),
            ..existing
        })
    }
}

impl Create<User, CreateUserDTO> for UserRepository {
    async fn create(&self, data: &CreateUserDTO) -> Result<User, Error> {
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO users (user_id, name, email, image, email_verified, created_at)
             VALUES (?, ?, ?, ?, NULL, ?)",
        )
        .bind(&data.user_id)
        .bind(&data.name)
        .bind(&data.email)
        .bind(&data.image)
        .bind(now)
        .execute(&self.connection_pool)
        .await?;

        Ok(User {
            user_id: data.user_id.clone(),
            name: data.name.clone(),
            email: data.email.clone(),
            image: data.image.clone(),
            email_verified: None,
            created_at: now,
        })
    }
}

impl Read<User, String> for UserRepository {
    async fn read(&self, id: &String) -> Result<Option<User>, Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE user_id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await?;

        Ok(user)
    }
}

impl ReadMany<User, String> for UserRepository {
    async fn read_many(&self, ids: &[String]) -> Result<Vec<User>, Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {USER_COLUMNS} FROM users WHERE user_id IN ("));
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(id);
        }
        separated.push_unseparated(")");

        let users = builder
            .build_query_as::<User>()
            .fetch_all(&self.connection_pool)
            .await?;

        Ok(users)
    }
}
