//! DTOs module - Data Transfer Objects
//!
//! Request bodies, query parameters and response shapes. DTOs keep the external
//! (API) representation apart from the entities stored in the database.

pub mod attendance;
pub mod bill;
pub mod event;
pub mod people;
pub mod query;
pub mod search;
pub mod split;
pub mod user;
pub mod wip_window;

pub use attendance::{
    AddAttendeesDTO, AttendanceDTO, CreateAttendanceDTO, InviteeDTO, RsvpDTO,
    UpdateAttendanceDTO, UpdateEventAttendanceDTO,
};
pub use bill::{
    BillDTO, BillFileDTO, BillItemRequestDTO, CreateAttachmentDTO, CreateBillDTO,
    CreateBillItemDTO, CreateBillRequestDTO,
};
pub use event::{CreateEventDTO, CreateEventRequestDTO, EventDetailDTO, EventSummaryDTO, UpdateEventDTO};
pub use people::PersonDTO;
pub use query::{EventFilter, EventsQuery, ForceQuery, SearchQuery};
pub use search::SearchResultDTO;
pub use split::{ShareDTO, SplitDTO};
pub use user::{CreateUserDTO, DebugUserDTO, FixUserDTO, SignInDTO, UserDTO};
pub use wip_window::{CreateWipWindowDTO, SettingsDTO, UpdateWipWindowDTO, WipWindowDTO};

use serde::{Deserialize, Deserializer};
use validator::ValidationError;

/// Rejects values made only of whitespace; the length rules alone accept `"   "`.
#[allow(clippy::ptr_arg)]
pub(crate) fn validate_not_blank(value: &String) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Value cannot be blank".into());
        return Err(err);
    }
    Ok(())
}

/// Distinguishes an explicit `null` from a missing field: used with
/// `#[serde(default, deserialize_with = "deserialize_some")]` on `Option<Option<T>>`.
pub(crate) fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}
