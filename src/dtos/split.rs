//! Cost sharing DTOs

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug)]
pub struct ShareDTO {
    pub attendance_id: i64,
    pub user_id: Option<String>,
    pub name: Option<String>,
    pub email: String,
    pub share_cents: i64,
    pub share_percent: f64,
    pub is_paid: bool,
    pub paid_by_id: Option<String>,
}

/// Equal split of an event's bills among its confirmed attendees
#[derive(Serialize, Deserialize, Debug)]
pub struct SplitDTO {
    pub event_id: i64,
    pub total_cents: i64,
    pub attendee_count: usize,
    pub per_person_cents: i64,
    pub remainder_cents: i64,
    pub shares: Vec<ShareDTO>,
}
