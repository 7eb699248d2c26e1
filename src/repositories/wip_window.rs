//! WipWindowRepository - wip_windows table
//!
//! Activating a window deactivates every other one and points the organisation
//! settings at it; the three writes share one transaction.

use super::{Create, Delete, Read};
use crate::dtos::{CreateWipWindowDTO, UpdateWipWindowDTO, WipWindowDTO};
use crate::entities::WipWindow;
use chrono::Utc;
use sqlx::{Error, Sqlite, SqlitePool, Transaction};

const WINDOW_COLUMNS: &str = "wip_window_id, name, start_date, end_date, is_active, created_at";

pub struct WipWindowRepository {
    connection_pool: SqlitePool,
}

/// Makes `window_id` the only active window and the organisation's current one.
async fn activate_exclusively(
    tx: &mut Transaction<'static, Sqlite>,
    window_id: i64,
) -> Result<(), Error> {
    sqlx::query("UPDATE wip_windows SET is_active = FALSE WHERE wip_window_id != ?")
        .bind(window_id)
        .execute(&mut **tx)
        .await?;
    sqlx::query("UPDATE wip_windows SET is_active = TRUE WHERE wip_window_id = ?")
        .bind(window_id)
        .execute(&mut **tx)
        .await?;
    sqlx::query("UPDATE org_settings SET current_wip_window_id = ? WHERE id = 1")
        .bind(window_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

impl WipWindowRepository {
    pub fn new(connection_pool: SqlitePool) -> WipWindowRepository {
        Self { connection_pool }
    }

    /// All windows with event and participant counts, latest start first
    pub async fn list_with_stats(&self) -> Result<Vec<WipWindowDTO>, Error> {
        let windows = sqlx::query_as::<_, WipWindowDTO>(
            "SELECT w.wip_window_id, w.name, w.start_date, w.end_date, w.is_active, w.created_at,
                    (SELECT COUNT(*) FROM events e WHERE e.wip_window_id = w.wip_window_id)
                        AS event_count,
                    (SELECT COUNT(DISTINCT COALESCE(a.user_id, a.email))
                       FROM attendances a
                       JOIN events e ON e.event_id = a.event_id
                      WHERE e.wip_window_id = w.wip_window_id AND a.status = 'CONFIRMED')
                        AS participant_count
             FROM wip_windows w
             ORDER BY w.start_date DESC",
        )
        .fetch_all(&self.connection_pool)
        .await?;

        Ok(windows)
    }

    pub async fn find_active(&self) -> Result<Option<WipWindow>, Error> {
        let window = sqlx::query_as::<_, WipWindow>(&format!(
            "SELECT {WINDOW_COLUMNS} FROM wip_windows WHERE is_active = TRUE LIMIT 1"
        ))
        .fetch_optional(&self.connection_pool)
        .await?;

        Ok(window)
    }

    pub async fn count_events(&self, window_id: i64) -> Result<i64, Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM events WHERE wip_window_id = ?")
                .bind(window_id)
                .fetch_one(&self.connection_pool)
                .await?;

        Ok(count)
    }

    /// Applies a partial update; the caller checks the resulting date range.
    ///
    /// # Returns
    /// * `Err(Error::RowNotFound)` - No window with that id
    pub async fn update(
        &self,
        window_id: i64,
        data: &UpdateWipWindowDTO,
    ) -> Result<WipWindow, Error> {
        let mut tx = self.connection_pool.begin().await?;

        let current = sqlx::query_as::<_, WipWindow>(&format!(
            "SELECT {WINDOW_COLUMNS} FROM wip_windows WHERE wip_window_id = ?"
        ))
        .bind(window_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(Error::RowNotFound)?;

        let updated = WipWindow {
            name: data
                .name
                .as_deref()
                .map(|n| n.trim().to_string())
                .unwrap_or(current.name),
            start_date: data.start_date.unwrap_or(current.start_date),
            end_date: data.end_date.unwrap_or(current.end_date),
            is_active: data.is_active.unwrap_or(current.is_active),
            ..current
        };

        sqlx::query(
            "UPDATE wip_windows SET name = ?, start_date = ?, end_date = ?, is_active = ?
             WHERE wip_window_id = ?",
        )
        .bind(&updated.name)
        .bind(updated.start_date)
        .bind(updated.end_date)
        .bind(updated.is_active)
        .bind(window_id)
        .execute(&mut *tx)
        .await?;

        match data.is_active {
            Some(true) => activate_exclusively(&mut tx, window_id).await?,
            Some(false) => {
                sqlx::query(
                    "UPDATE org_settings SET current_wip_window_id = NULL
                     WHERE id = 1 AND current_wip_window_id = ?",
                )
                .bind(window_id)
                .execute(&mut *tx)
                .await?;
            }
            None => {}
        }

        tx.commit().await?;
        Ok(updated)
    }
}

impl Create<WipWindow, CreateWipWindowDTO> for WipWindowRepository {
    async fn create(&self, data: &CreateWipWindowDTO) -> Result<WipWindow, Error> {
        let now = Utc::now();
        let mut tx = self.connection_pool.begin().await?;

        let result = sqlx::query(
            "INSERT INTO wip_windows (name, start_date, end_date, is_active, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&data.name)
        .bind(data.start_date)
        .bind(data.end_date)
        .bind(data.is_active)
        .bind(now)
        .execute(&mut *tx)
        .await?;
        let new_id = result.last_insert_rowid();

        if data.is_active {
            activate_exclusively(&mut tx, new_id).await?;
        }

        tx.commit().await?;

        Ok(WipWindow {
            wip_window_id: new_id,
            name: data.name.clone(),
            start_date: data.start_date,
            end_date: data.end_date,
            is_active: data.is_active,
            created_at: now,
        })
    }
}

impl Read<WipWindow, i64> for WipWindowRepository {
    async fn read(&self, id: &i64) -> Result<Option<WipWindow>, Error> {
        let window = sqlx::query_as::<_, WipWindow>(&format!(
            "SELECT {WINDOW_COLUMNS} FROM wip_windows WHERE wip_window_id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await?;

        Ok(window)
    }
}

impl Delete<i64> for WipWindowRepository {
    /// Events of the window (and everything below them) cascade
    async fn delete(&self, id: &i64) -> Result<(), Error> {
        sqlx::query("DELETE FROM wip_windows WHERE wip_window_id = ?")
            .bind(id)
            .execute(&self.connection_pool)
            .await?;

        Ok(())
    }
}
