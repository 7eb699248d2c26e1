//! Services module - HTTP handlers
//!
//! One sub-module per resource. Handlers authenticate through the request
//! extensions filled by the authentication middleware, check permissions, validate
//! the body, call the repositories and shape the JSON response.

pub mod attendance;
pub mod auth;
pub mod bill;
pub mod event;
pub mod people;
pub mod search;
pub mod split;
pub mod wip_window;

pub use attendance::{add_attendees, rsvp, update_event_attendance};
pub use auth::{debug_user, fix_user, sign_in};
pub use bill::{create_bill, delete_bill, download_bills};
pub use event::{create_event, delete_event, get_event, list_events, update_event};
pub use people::list_people;
pub use search::search;
pub use split::get_split;
pub use wip_window::{create_window, delete_window, get_settings, list_windows, update_window};

use crate::AppState;
use crate::dtos::UserDTO;
use crate::repositories::ReadMany;
use axum::{extract::State, http::StatusCode, response::IntoResponse};
use std::collections::HashMap;
use std::sync::Arc;

/// Root endpoint - health check
pub async fn root(State(_state): State<Arc<AppState>>) -> impl IntoResponse {
    (StatusCode::OK, "Server is running!")
}

/// Users referenced by a response, fetched in one query
pub(crate) struct UserLookup(HashMap<String, UserDTO>);

impl UserLookup {
    pub(crate) async fn load(state: &AppState, mut ids: Vec<String>) -> Result<Self, sqlx::Error> {
        ids.sort();
        ids.dedup();
        let users = state
            .user
            .read_many(&ids)
            .await?
            .into_iter()
            .map(|u| (u.user_id.clone(), UserDTO::from(u)))
            .collect();
        Ok(Self(users))
    }

    pub(crate) fn get(&self, id: Option<&str>) -> Option<UserDTO> {
        id.and_then(|id| self.0.get(id)).cloned()
    }
}
