//! Event entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Event {
    pub event_id: i64,
    pub wip_window_id: i64,
    pub title: String,
    pub date: DateTime<Utc>,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub creator_id: String,
    pub paid_by_id: Option<String>,
    pub created_at: DateTime<Utc>,
}
