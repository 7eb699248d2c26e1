//! Entities module - Domain entities
//!
//! Every entity maps one table of the database; rows are decoded with `sqlx::FromRow`.

pub mod attachment;
pub mod attendance;
pub mod bill;
pub mod enums;
pub mod event;
pub mod org_setting;
pub mod user;
pub mod wip_window;

// Re-exports
pub use attachment::Attachment;
pub use attendance::Attendance;
pub use bill::{Bill, BillItem};
pub use enums::AttendanceStatus;
pub use event::Event;
pub use org_setting::OrgSetting;
pub use user::User;
pub use wip_window::WipWindow;
