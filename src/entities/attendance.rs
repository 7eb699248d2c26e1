//! Attendance entity - invitation and RSVP of one person for one event

use super::enums::AttendanceStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Attendance {
    pub attendance_id: i64,
    pub event_id: i64,
    // None for invitees who have not signed in yet
    pub user_id: Option<String>,
    pub email: String,
    pub status: AttendanceStatus,
    pub invited_by_id: Option<String>,
    pub is_paid: bool,
    pub paid_by_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Attendance {
    /// True when the attendance belongs to the given stored user,
    /// either through the linked id or through the invited email.
    pub fn belongs_to(&self, user_id: &str, email: &str) -> bool {
        self.user_id.as_deref() == Some(user_id) || self.email.eq_ignore_ascii_case(email)
    }

    pub fn is_confirmed(&self) -> bool {
        self.status == AttendanceStatus::Confirmed
    }
}
