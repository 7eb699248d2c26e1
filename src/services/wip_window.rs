//! WIP window services - windows and organisation settings

use crate::core::{AppError, AppJson, AppState};
use crate::dtos::{
    CreateWipWindowDTO, ForceQuery, SettingsDTO, UpdateWipWindowDTO, wip_window::check_range,
};
use crate::entities::{User, WipWindow};
use crate::repositories::{Create, Delete, Read};
use axum::{
    Extension,
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use validator::{Validate, ValidationErrors};

async fn find_window(state: &AppState, window_id: i64) -> Result<WipWindow, AppError> {
    state.window.read(&window_id).await?.ok_or_else(|| {
        warn!("WIP window {} not found", window_id);
        AppError::not_found("WIP window not found")
    })
}

#[instrument(skip(state))]
pub async fn list_windows(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Listing WIP windows");
    let windows = state.window.list_with_stats().await?;
    info!("Found {} WIP windows", windows.len());
    Ok(Json(json!({ "wip_windows": windows })))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id, name = %body.name))]
pub async fn create_window(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    AppJson(body): AppJson<CreateWipWindowDTO>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Creating WIP window");
    body.validate()?;

    let data = CreateWipWindowDTO {
        name: body.name.trim().to_string(),
        ..body
    };
    let window = state.window.create(&data).await?;

    info!(
        "WIP window {} created (active: {})",
        window.wip_window_id, window.is_active
    );
    Ok((StatusCode::CREATED, Json(window)))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id))]
pub async fn update_window(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(window_id): Path<i64>,
    AppJson(body): AppJson<UpdateWipWindowDTO>,
) -> Result<Json<WipWindow>, AppError> {
    debug!("Updating WIP window {}", window_id);
    // 1. The window must exist
    // 2. The merged date range must stay ordered
    // 3. Write; activation deactivates the others in the same transaction
    body.validate()?;
    let current = find_window(&state, window_id).await?;

    let start = body.start_date.unwrap_or(current.start_date);
    let end = body.end_date.unwrap_or(current.end_date);
    if let Err(err) = check_range(&start, &end) {
        warn!("Rejected reversed range for window {}", window_id);
        let mut errors = ValidationErrors::new();
        errors.add("end_date", err);
        return Err(errors.into());
    }

    let updated = state.window.update(window_id, &body).await?;
    info!("WIP window {} updated", window_id);
    Ok(Json(updated))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id, force = params.force))]
pub async fn delete_window(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(window_id): Path<i64>,
    Query(params): Query<ForceQuery>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Deleting WIP window {}", window_id);
    let window = find_window(&state, window_id).await?;

    let event_count = state.window.count_events(window_id).await?;
    if event_count > 0 && !params.force {
        warn!("WIP window {} still has {} events", window_id, event_count);
        return Err(
            AppError::bad_request("Cannot delete WIP window with existing events")
                .with_details("Delete the events first or retry with force=true")
                .with_context("event_count", event_count)
                .with_context("can_force_delete", true),
        );
    }

    if window.is_active {
        warn!("Refusing to delete active WIP window {}", window_id);
        return Err(AppError::bad_request("Cannot delete the active WIP window")
            .with_details("Activate another window first"));
    }

    state.window.delete(&window_id).await?;
    info!("WIP window {} deleted with {} events", window_id, event_count);
    Ok(Json(json!({ "success": true })))
}

#[instrument(skip(state))]
pub async fn get_settings(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SettingsDTO>, AppError> {
    debug!("Fetching organisation settings");
    let settings = state.settings.get().await?;
    // settings written before any activation point nowhere; fall back to the active window
    let current_wip_window = match settings.current_wip_window_id {
        Some(id) => state.window.read(&id).await?,
        None => state.window.find_active().await?,
    };
    Ok(Json(SettingsDTO {
        settings,
        current_wip_window,
    }))
}
