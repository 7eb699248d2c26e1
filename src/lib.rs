//! WIP event planner server library - exposes the modules for the binary and the tests

pub mod archive;
pub mod core;
pub mod dtos;
pub mod entities;
pub mod receipt;
pub mod repositories;
pub mod services;
pub mod split;

pub use core::{AppError, AppState, auth, config};
pub use services::root;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::Method,
    middleware,
    routing::{get, patch, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Request bodies carry inline receipts, up to several per bill
pub const MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

/// Builds the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .nest("/auth", configure_auth_routes(state.clone()))
        .merge(configure_window_routes(state.clone()))
        .nest("/events", configure_event_routes(state.clone()))
        .merge(configure_directory_routes(state.clone()))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Sign-in callback and identity reconciliation
fn configure_auth_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use core::authentication_middleware;
    use services::*;

    Router::new()
        .route("/signin", post(sign_in))
        .route("/debug-user", get(debug_user))
        .route("/fix-user", post(fix_user))
        .layer(middleware::from_fn_with_state(
            state,
            authentication_middleware,
        ))
}

/// WIP windows and organisation settings
fn configure_window_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use core::authentication_middleware;
    use services::*;

    Router::new()
        .route("/wip-windows", get(list_windows).post(create_window))
        .route(
            "/wip-windows/{window_id}",
            patch(update_window).delete(delete_window),
        )
        .route("/settings", get(get_settings))
        .layer(middleware::from_fn_with_state(
            state,
            authentication_middleware,
        ))
}

/// Events with their attendees, bills and cost split
fn configure_event_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use core::authentication_middleware;
    use services::*;

    Router::new()
        .route("/", get(list_events).post(create_event))
        .route(
            "/{event_id}",
            get(get_event).patch(update_event).delete(delete_event),
        )
        .route(
            "/{event_id}/attendees",
            post(add_attendees).patch(update_event_attendance),
        )
        .route("/{event_id}/bills", post(create_bill))
        .route(
            "/{event_id}/bills/{bill_id}",
            axum::routing::delete(delete_bill),
        )
        .route("/{event_id}/download-bills", get(download_bills))
        .route("/{event_id}/split", get(get_split))
        .layer(middleware::from_fn_with_state(
            state,
            authentication_middleware,
        ))
}

/// RSVP, people directory and search
fn configure_directory_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use core::authentication_middleware;
    use services::*;

    Router::new()
        .route("/attendances/{attendance_id}", patch(rsvp))
        .route("/people", get(list_people))
        .route("/search", get(search))
        .layer(middleware::from_fn_with_state(
            state,
            authentication_middleware,
        ))
}
