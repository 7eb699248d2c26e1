//! AttendanceRepository - attendances table

use super::{Create, Read, Update};
use crate::dtos::{CreateAttendanceDTO, UpdateAttendanceDTO};
use crate::entities::Attendance;
use chrono::{DateTime, Utc};
use sqlx::{Error, SqliteConnection, SqlitePool};

const ATTENDANCE_COLUMNS: &str = "a.attendance_id, a.event_id, a.user_id, a.email, a.status, \
     a.invited_by_id, a.is_paid, a.paid_by_id, a.created_at";

/// Inserts one attendance on an open connection or transaction.
pub(super) async fn insert_attendance(
    conn: &mut SqliteConnection,
    item: &CreateAttendanceDTO,
    now: DateTime<Utc>,
) -> Result<Attendance, Error> {
    let result = sqlx::query(
        "INSERT INTO attendances (event_id, user_id, email, status, invited_by_id, is_paid, paid_by_id, created_at)
         VALUES (?, ?, ?, ?, ?, FALSE, NULL, ?)",
    )
    .bind(item.event_id)
    .bind(&item.user_id)
    .bind(&item.email)
    .bind(item.status)
    .bind(&item.invited_by_id)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(Attendance {
        attendance_id: result.last_insert_rowid(),
        event_id: item.event_id,
        user_id: item.user_id.clone(),
        email: item.email.clone(),
        status: item.status,
        invited_by_id: item.invited_by_id.clone(),
        is_paid: false,
        paid_by_id: None,
        created_at: now,
    })
}

pub struct AttendanceRepository {
    connection_pool: SqlitePool,
}

impl AttendanceRepository {
    pub fn new(connection_pool: SqlitePool) -> AttendanceRepository {
        Self { connection_pool }
    }

    /// Inserts several attendances in one transaction
    pub async fn create_many(
        &self,
        data: &[CreateAttendanceDTO],
    ) -> Result<Vec<Attendance>, Error> {
        let now = Utc::now();
        let mut tx = self.connection_pool.begin().await?;
        let mut created = Vec::with_capacity(data.len());

        for item in data {
            created.push(insert_attendance(&mut tx, item, now).await?);
        }

        tx.commit().await?;
        Ok(created)
    }

    /// Attendances of an event, registered users by name first, bare emails last
    pub async fn find_by_event(&self, event_id: i64) -> Result<Vec<Attendance>, Error> {
        let attendances = sqlx::query_as::<_, Attendance>(&format!(
            "SELECT {ATTENDANCE_COLUMNS}
             FROM attendances a
             LEFT JOIN users u ON u.user_id = a.user_id
             WHERE a.event_id = ?
             ORDER BY u.user_id IS NULL, u.name, a.email"
        ))
        .bind(event_id)
        .fetch_all(&self.connection_pool)
        .await?;

        Ok(attendances)
    }

    /// Every attendance of a stored user, oldest first
    pub async fn find_by_user(&self, user_id: &str) -> Result<Vec<Attendance>, Error> {
        let attendances = sqlx::query_as::<_, Attendance>(&format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendances a
             WHERE a.user_id = ?
             ORDER BY a.attendance_id"
        ))
        .bind(user_id)
        .fetch_all(&self.connection_pool)
        .await?;

        Ok(attendances)
    }

    /// Attaches every email-only attendance for `email` to the stored user.
    ///
    /// # Returns
    /// Number of attendances linked
    pub async fn link_email_to_user(&self, email: &str, user_id: &str) -> Result<u64, Error> {
        let result = sqlx::query(
            "UPDATE attendances SET user_id = ? WHERE user_id IS NULL AND LOWER(email) = LOWER(?)",
        )
        .bind(user_id)
        .bind(email)
        .execute(&self.connection_pool)
        .await?;

        Ok(result.rows_affected())
    }
}

impl Create<Attendance, CreateAttendanceDTO> for AttendanceRepository {
    async fn create(&self, data: &CreateAttendanceDTO) -> Result<Attendance, Error> {
        let mut created = self.create_many(std::slice::from_ref(data)).await?;
        created.pop().ok_or(Error::RowNotFound)
    }
}

impl Read<Attendance, i64> for AttendanceRepository {
    async fn read(&self, id: &i64) -> Result<Option<Attendance>, Error> {
        let attendance = sqlx::query_as::<_, Attendance>(&format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendances a WHERE a.attendance_id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await?;

        Ok(attendance)
    }
}

impl Update<Attendance, UpdateAttendanceDTO, i64> for AttendanceRepository {
    async fn update(&self, id: &i64, data: &UpdateAttendanceDTO) -> Result<Attendance, Error> {
        let current = self.read(id).await?.ok_or(Error::RowNotFound)?;
        if data.is_empty() {
            return Ok(current);
        }

        let updated = Attendance {
            status: data.status.unwrap_or(current.status),
            is_paid: data.is_paid.unwrap_or(current.is_paid),
            paid_by_id: data.paid_by_id.clone().unwrap_or(current.paid_by_id),
            ..current
        };

        sqlx::query(
            "UPDATE attendances SET status = ?, is_paid = ?, paid_by_id = ? WHERE attendance_id = ?",
        )
        .bind(updated.status)
        .bind(updated.is_paid)
        .bind(&updated.paid_by_id)
        .bind(id)
        .execute(&self.connection_pool)
        .await?;

        Ok(updated)
    }
}
