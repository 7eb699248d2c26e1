//! EventRepository - events table

use super::attendance::insert_attendance;
use super::{Create, Delete, Read, Update, contains_pattern};
use crate::dtos::{CreateAttendanceDTO, CreateEventDTO, EventFilter, InviteeDTO, UpdateEventDTO};
use crate::entities::{Attendance, AttendanceStatus, Event, User};
use chrono::{DateTime, Utc};
use sqlx::{Error, QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

const EVENT_COLUMNS: &str =
    "event_id, wip_window_id, title, date, location, notes, creator_id, paid_by_id, created_at";

pub struct EventRepository {
    connection_pool: SqlitePool,
}

/// Appends a case-insensitive match on title, location or notes.
fn push_text_match(builder: &mut QueryBuilder<'_, Sqlite>, pattern: &str) {
    let like = contains_pattern(pattern);
    builder
        .push(" AND (LOWER(title) LIKE ")
        .push_bind(like.clone())
        .push(" ESCAPE '\\' OR LOWER(COALESCE(location, '')) LIKE ")
        .push_bind(like.clone())
        .push(" ESCAPE '\\' OR LOWER(COALESCE(notes, '')) LIKE ")
        .push_bind(like)
        .push(" ESCAPE '\\')");
}

impl EventRepository {
    pub fn new(connection_pool: SqlitePool) -> EventRepository {
        Self { connection_pool }
    }

    /// Events visible in the list for `user`, most recent date first.
    pub async fn list(
        &self,
        filter: EventFilter,
        user: &User,
        search: Option<&str>,
    ) -> Result<Vec<Event>, Error> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {EVENT_COLUMNS} FROM events WHERE 1 = 1"));

        match filter {
            EventFilter::All => {}
            EventFilter::MyEvents => {
                builder
                    .push(
                        " AND EXISTS (SELECT 1 FROM attendances a
                           WHERE a.event_id = events.event_id
                             AND a.status IN ('PROPOSED', 'CONFIRMED')
                             AND (a.user_id = ",
                    )
                    .push_bind(user.user_id.clone())
                    .push(" OR LOWER(a.email) = LOWER(")
                    .push_bind(user.email.clone())
                    .push(")))");
            }
            EventFilter::Created => {
                builder
                    .push(" AND creator_id = ")
                    .push_bind(user.user_id.clone());
            }
            EventFilter::CurrentWip => {
                builder.push(
                    " AND wip_window_id IN (SELECT wip_window_id FROM wip_windows WHERE is_active = TRUE)",
                );
            }
        }

        if let Some(pattern) = search.map(str::trim).filter(|s| !s.is_empty()) {
            push_text_match(&mut builder, pattern);
        }

        builder.push(" ORDER BY date DESC, event_id DESC");

        let events = builder
            .build_query_as::<Event>()
            .fetch_all(&self.connection_pool)
            .await?;

        Ok(events)
    }

    /// Command-palette lookup: at most 10 matches, newest first
    pub async fn search(&self, pattern: &str) -> Result<Vec<Event>, Error> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {EVENT_COLUMNS} FROM events WHERE 1 = 1"));
        push_text_match(&mut builder, pattern);
        builder.push(" ORDER BY date DESC LIMIT 10");

        let events = builder
            .build_query_as::<Event>()
            .fetch_all(&self.connection_pool)
            .await?;

        Ok(events)
    }

    pub async fn find_by_creators(&self, creator_ids: &[String]) -> Result<Vec<Event>, Error> {
        if creator_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE creator_id IN ("
        ));
        let mut separated = builder.separated(", ");
        for id in creator_ids {
            separated.push_bind(id);
        }
        separated.push_unseparated(") ORDER BY date DESC");

        let events = builder
            .build_query_as::<Event>()
            .fetch_all(&self.connection_pool)
            .await?;

        Ok(events)
    }
}

async fn insert_event(
    conn: &mut SqliteConnection,
    data: &CreateEventDTO,
    now: DateTime<Utc>,
) -> Result<Event, Error> {
    let result = sqlx::query(
        "INSERT INTO events (wip_window_id, title, date, location, notes, creator_id, paid_by_id, created_at)
         VALUES (?, ?, ?, ?, ?, ?, NULL, ?)",
    )
    .bind(data.wip_window_id)
    .bind(&data.title)
    .bind(data.date)
    .bind(&data.location)
    .bind(&data.notes)
    .bind(&data.creator_id)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(Event {
        event_id: result.last_insert_rowid(),
        wip_window_id: data.wip_window_id,
        title: data.title.clone(),
        date: data.date,
        location: data.location.clone(),
        notes: data.notes.clone(),
        creator_id: data.creator_id.clone(),
        paid_by_id: None,
        created_at: now,
    })
}

impl EventRepository {
    /// Inserts an event and its first PROPOSED attendances in one transaction,
    /// invited by the creator. Nothing is stored if any insert fails.
    pub async fn create_with_invites(
        &self,
        data: &CreateEventDTO,
        invitees: &[InviteeDTO],
    ) -> Result<(Event, Vec<Attendance>), Error> {
        let now = Utc::now();
        let mut tx = self.connection_pool.begin().await?;

        let event = insert_event(&mut tx, data, now).await?;
        let mut attendances = Vec::with_capacity(invitees.len());
        for invitee in invitees {
            let item = CreateAttendanceDTO {
                event_id: event.event_id,
                user_id: invitee.user_id.clone(),
                email: invitee.email.clone(),
                status: AttendanceStatus::Proposed,
                invited_by_id: Some(data.creator_id.clone()),
            };
            attendances.push(insert_attendance(&mut tx, &item, now).await?);
        }

        tx.commit().await?;
        Ok((event, attendances))
    }
}

impl Create<Event, CreateEventDTO> for EventRepository {
    async fn create(&self, data: &CreateEventDTO) -> Result<Event, Error> {
        let mut conn = self.connection_pool.acquire().await?;
        insert_event(&mut conn, data, Utc::now()).await
    }
}

impl Read<Event, i64> for EventRepository {
    async fn read(&self, id: &i64) -> Result<Option<Event>, Error> {
        let event = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE event_id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await?;

        Ok(event)
    }
}

impl Update<Event, UpdateEventDTO, i64> for EventRepository {
    async fn update(&self, id: &i64, data: &UpdateEventDTO) -> Result<Event, Error> {
        let current = self.read(id).await?.ok_or(Error::RowNotFound)?;

        let updated = Event {
            title: data
                .title
                .as_deref()
                .map(|t| t.trim().to_string())
                .unwrap_or(current.title),
            date: data.date.unwrap_or(current.date),
            location: data.location.clone().unwrap_or(current.location),
            notes: data.notes.clone().unwrap_or(current.notes),
            paid_by_id: data.paid_by_id.clone().unwrap_or(current.paid_by_id),
            ..current
        };

        sqlx::query(
            "UPDATE events SET title = ?, date = ?, location = ?, notes = ?, paid_by_id = ?
             WHERE event_id = ?",
        )
        .bind(&updated.title)
        .bind(updated.date)
        .bind(&updated.location)
        .bind(&updated.notes)
        .bind(&updated.paid_by_id)
        .bind(id)
        .execute(&self.connection_pool)
        .await?;

        Ok(updated)
    }
}

impl Delete<i64> for EventRepository {
    /// Attendances, bills, items and attachments cascade
    async fn delete(&self, id: &i64) -> Result<(), Error> {
        sqlx::query("DELETE FROM events WHERE event_id = ?")
            .bind(id)
            .execute(&self.connection_pool)
            .await?;

        Ok(())
    }
}
