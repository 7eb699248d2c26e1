//! Event DTOs

use super::{AttendanceDTO, BillDTO, UserDTO, deserialize_some, validate_not_blank};
use crate::entities::{Event, WipWindow};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidateEmail, ValidationError};

/// Body of `POST /events`
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct CreateEventRequestDTO {
    #[validate(
        length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"),
        custom(function = "validate_not_blank")
    )]
    pub title: String,
    pub date: DateTime<Utc>,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub wip_window_id: i64,
    #[serde(default)]
    #[validate(custom(function = "validate_email_list"))]
    pub attendee_emails: Vec<String>,
}

/// Every entry must be a syntactically valid email address.
#[allow(clippy::ptr_arg)]
pub fn validate_email_list(emails: &Vec<String>) -> Result<(), ValidationError> {
    if emails.iter().all(|email| email.validate_email()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("email");
        err.message = Some("Every attendee must be a valid email address".into());
        Err(err)
    }
}

/// Insert payload for the events table
#[derive(Debug, Clone)]
pub struct CreateEventDTO {
    pub wip_window_id: i64,
    pub title: String,
    pub date: DateTime<Utc>,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub creator_id: String,
}

/// Body of `PATCH /events/{id}`.
/// `location`, `notes` and `paid_by_id` accept an explicit `null` to clear the value.
#[derive(Serialize, Deserialize, Debug, Clone, Default, Validate)]
pub struct UpdateEventDTO {
    #[validate(
        length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"),
        custom(function = "validate_not_blank")
    )]
    pub title: Option<String>,
    pub date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub location: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub notes: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub paid_by_id: Option<Option<String>>,
}

impl UpdateEventDTO {
    /// True when the body touches nothing but `paid_by_id`,
    /// the only field invitees are allowed to change.
    pub fn is_only_paid_by(&self) -> bool {
        self.paid_by_id.is_some()
            && self.title.is_none()
            && self.date.is_none()
            && self.location.is_none()
            && self.notes.is_none()
    }

    pub fn is_empty(&self) -> bool {
        self.paid_by_id.is_none()
            && self.title.is_none()
            && self.date.is_none()
            && self.location.is_none()
            && self.notes.is_none()
    }
}

/// Event with everything the event page shows
#[derive(Serialize, Deserialize, Debug)]
pub struct EventDetailDTO {
    #[serde(flatten)]
    pub event: Event,
    pub creator: Option<UserDTO>,
    pub wip_window: Option<WipWindow>,
    pub paid_by: Option<UserDTO>,
    pub attendances: Vec<AttendanceDTO>,
    pub bills: Vec<BillDTO>,
}

impl EventDetailDTO {
    pub fn confirmed_count(&self) -> usize {
        self.attendances
            .iter()
            .filter(|a| a.attendance.is_confirmed())
            .count()
    }

    pub fn total_amount(&self) -> i64 {
        self.bills.iter().map(|b| b.bill.total_cents).sum()
    }
}

/// List entry of `GET /events`
#[derive(Serialize, Deserialize, Debug)]
pub struct EventSummaryDTO {
    #[serde(flatten)]
    pub detail: EventDetailDTO,
    pub attendee_count: usize,
    pub total_amount: i64,
}

impl From<EventDetailDTO> for EventSummaryDTO {
    fn from(detail: EventDetailDTO) -> Self {
        Self {
            attendee_count: detail.confirmed_count(),
            total_amount: detail.total_amount(),
            detail,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_update_distinguishes_null_from_missing() {
        let dto: UpdateEventDTO = serde_json::from_value(json!({ "paid_by_id": null })).unwrap();
        assert_eq!(dto.paid_by_id, Some(None));
        assert_eq!(dto.location, None);
        assert!(dto.is_only_paid_by());

        let dto: UpdateEventDTO =
            serde_json::from_value(json!({ "paid_by_id": "user-bob", "title": "x" })).unwrap();
        assert!(!dto.is_only_paid_by());
    }

    #[test]
    fn test_attendee_emails_must_be_valid() {
        let body = json!({
            "title": "Dinner",
            "date": "2025-03-10T18:00:00Z",
            "wip_window_id": 1,
            "attendee_emails": ["bob@example.com", "not-an-email"]
        });
        let dto: CreateEventRequestDTO = serde_json::from_value(body).unwrap();
        assert!(dto.validate().is_err());
    }
}
