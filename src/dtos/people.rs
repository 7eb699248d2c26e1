//! People DTOs

use serde::{Deserialize, Serialize};

/// A participant with totals over the events they confirmed
#[derive(Serialize, Deserialize, Debug)]
pub struct PersonDTO {
    pub id: String,
    pub name: Option<String>,
    pub email: String,
    pub image: Option<String>,
    pub event_count: usize,
    /// Sum of the bills this person paid, in cents
    pub total_spent: i64,
    /// Sum of this person's equal-split shares, in cents
    pub total_owed: i64,
}
