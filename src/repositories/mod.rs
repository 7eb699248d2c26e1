//! Repositories module - one repository per table
//!
//! Queries are built at runtime (`sqlx::query_as::<_, T>` with `#[derive(sqlx::FromRow)]`
//! entities, `QueryBuilder` for dynamic filters and `IN` lists), so the crate builds
//! without a database. Multi-statement writes that must be atomic open a transaction
//! with `pool.begin()` and run every statement on `&mut *tx`.
//!
//! Row-count shapes used throughout:
//!
//! | Rows          | Method                 | Returns                    |
//! |---------------|------------------------|----------------------------|
//! | none          | `.execute(..)`         | `SqliteQueryResult`        |
//! | zero or one   | `.fetch_optional(..)`  | `Option<T>`                |
//! | exactly one   | `.fetch_one(..)`       | `T` (aggregates use this)  |
//! | many          | `.fetch_all(..)`       | `Vec<T>`                   |

pub mod attachment;
pub mod attendance;
pub mod bill;
pub mod event;
pub mod org_setting;
pub mod traits;
pub mod user;
pub mod wip_window;

pub use attachment::AttachmentRepository;
pub use attendance::AttendanceRepository;
pub use bill::BillRepository;
pub use event::EventRepository;
pub use org_setting::OrgSettingRepository;
pub use traits::{Create, Delete, Read, ReadMany, Update};
pub use user::UserRepository;
pub use wip_window::WipWindowRepository;

/// Lowercased `%..%` pattern for `LIKE .. ESCAPE '\'`; `%`, `_` and `\` in the
/// input match literally.
pub(crate) fn contains_pattern(input: &str) -> String {
    let mut pattern = String::with_capacity(input.len() + 2);
    pattern.push('%');
    for c in input.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
