//! Attendance DTOs

use super::{UserDTO, deserialize_some, event::validate_email_list};
use crate::entities::{Attendance, AttendanceStatus, Event};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Insert payload for the attendances table
#[derive(Debug, Clone)]
pub struct CreateAttendanceDTO {
    pub event_id: i64,
    pub user_id: Option<String>,
    pub email: String,
    pub status: AttendanceStatus,
    pub invited_by_id: Option<String>,
}

/// Someone to invite: a registered user, or an email-only address when `user_id` is `None`
#[derive(Debug, Clone, PartialEq)]
pub struct InviteeDTO {
    pub user_id: Option<String>,
    pub email: String,
}

/// Partial update of an attendance; only `Some(_)` fields are written
#[derive(Debug, Clone, Default)]
pub struct UpdateAttendanceDTO {
    pub status: Option<AttendanceStatus>,
    pub is_paid: Option<bool>,
    pub paid_by_id: Option<Option<String>>,
}

impl UpdateAttendanceDTO {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.is_paid.is_none() && self.paid_by_id.is_none()
    }
}

/// Body of `POST /events/{id}/attendees`
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct AddAttendeesDTO {
    #[validate(
        length(min = 1, message = "At least one attendee email is required"),
        custom(function = "validate_email_list")
    )]
    pub attendee_emails: Vec<String>,
}

/// Body of `PATCH /events/{id}/attendees`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UpdateEventAttendanceDTO {
    pub attendance_id: i64,
    pub status: Option<AttendanceStatus>,
    pub is_paid: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub paid_by_id: Option<Option<String>>,
}

/// Body of `PATCH /attendances/{id}`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RsvpDTO {
    pub status: AttendanceStatus,
}

/// Attendance with the people it references
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AttendanceDTO {
    #[serde(flatten)]
    pub attendance: Attendance,
    pub user: Option<UserDTO>,
    pub invited_by: Option<UserDTO>,
    pub paid_by: Option<UserDTO>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<Event>,
}
