//! Application State
//!
//! Repositories and settings shared by every route and middleware.

use crate::repositories::{
    AttachmentRepository, AttendanceRepository, BillRepository, EventRepository,
    OrgSettingRepository, UserRepository, WipWindowRepository,
};
use sqlx::SqlitePool;

pub struct AppState {
    pub user: UserRepository,

    pub window: WipWindowRepository,

    /// Single-row organisation settings (current WIP window)
    pub settings: OrgSettingRepository,

    pub event: EventRepository,

    pub attendance: AttendanceRepository,

    pub bill: BillRepository,

    pub attachment: AttachmentRepository,

    /// Secret used to sign and verify session tokens
    pub auth_secret: String,

    /// Lowercased email domains allowed to sign in; empty admits everyone
    pub allowed_email_domains: Vec<String>,
}

impl AppState {
    /// Builds the state on top of a shared connection pool.
    pub fn new(pool: SqlitePool, auth_secret: String) -> Self {
        Self {
            user: UserRepository::new(pool.clone()),
            window: WipWindowRepository::new(pool.clone()),
            settings: OrgSettingRepository::new(pool.clone()),
            event: EventRepository::new(pool.clone()),
            attendance: AttendanceRepository::new(pool.clone()),
            bill: BillRepository::new(pool.clone()),
            attachment: AttachmentRepository::new(pool),
            auth_secret,
            allowed_email_domains: Vec::new(),
        }
    }

    pub fn with_allowed_domains(mut self, domains: Vec<String>) -> Self {
        self.allowed_email_domains = domains;
        self
    }
}
