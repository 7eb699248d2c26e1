//! Enumerations used by the entities

use serde::{Deserialize, Serialize};

/// RSVP state of an invitation. Any value may follow any other.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum AttendanceStatus {
    Proposed,
    Confirmed,
    Declined,
}
