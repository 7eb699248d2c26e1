//! Auth services - sign-in callback and identity reconciliation
//!
//! The identity provider may hand out a different subject for an email that is
//! already stored. Lookups always go through the email; these endpoints let the
//! client refresh its token and inspect or repair the mismatch.

use crate::core::{AppError, AppState, SessionUser, encode_jwt};
use crate::dtos::{DebugUserDTO, FixUserDTO, SignInDTO, UserDTO};
use crate::entities::User;
use crate::repositories::Read;
use axum::{
    Extension,
    extract::{Json, State},
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

#[instrument(skip(state, session, current_user), fields(user_id = %current_user.user_id, session_id = %session.id))]
pub async fn sign_in(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionUser>,
    Extension(current_user): Extension<User>,
) -> Result<Json<SignInDTO>, AppError> {
    debug!("Sign-in callback");
    // 1. Refresh name and picture from the provider, keeping stored values it lacks
    // 2. Hand over invitations sent to the email before the account existed
    // 3. Issue a token whose subject is the stored id
    let user = state
        .user
        .update_profile(
            &current_user.user_id,
            session.name.as_deref(),
            session.image.as_deref(),
        )
        .await?;

    let linked = state
        .attendance
        .link_email_to_user(&user.email, &user.user_id)
        .await?;
    if linked > 0 {
        info!("Linked {} pending invitations", linked);
    }

    let token = encode_jwt(
        &SessionUser {
            id: user.user_id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            image: user.image.clone(),
        },
        &state.auth_secret,
    )?;

    if session.id != user.user_id {
        info!(
            "Session id {} reconciled to stored id {}",
            session.id, user.user_id
        );
    }

    Ok(Json(SignInDTO {
        user: UserDTO::from(user),
        token,
    }))
}

#[instrument(skip(state, session), fields(session_id = %session.id))]
pub async fn debug_user(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionUser>,
) -> Result<Json<DebugUserDTO>, AppError> {
    debug!("Identity diagnostics");
    let users = state.user.find_all_by_email(&session.email).await?;
    let ids: Vec<String> = users.iter().map(|u| u.user_id.clone()).collect();
    let events = state.event.find_by_creators(&ids).await?;

    Ok(Json(DebugUserDTO {
        session_user: session,
        users_with_same_email: users.into_iter().map(UserDTO::from).collect(),
        events_created_by_those_users: events,
    }))
}

#[instrument(skip(state, session, current_user), fields(user_id = %current_user.user_id, session_id = %session.id))]
pub async fn fix_user(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionUser>,
    Extension(current_user): Extension<User>,
) -> Result<Json<FixUserDTO>, AppError> {
    debug!("Identity repair requested");
    // 1. Nothing to do when the stored id already is the session id
    // 2. The session id must not belong to somebody else
    // 3. Move the stored user and every reference to it onto the session id
    if current_user.user_id == session.id {
        return Ok(Json(FixUserDTO {
            success: true,
            message: "User ID already matches the session".to_string(),
            old_id: current_user.user_id.clone(),
            new_id: session.id,
        }));
    }

    if state.user.read(&session.id).await?.is_some() {
        warn!("Session id {} already belongs to another user", session.id);
        return Err(AppError::conflict("Session id already belongs to another user"));
    }

    let moved = state
        .user
        .reassign_id(&current_user.user_id, &session.id)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => AppError::not_found("User not found"),
            other => AppError::from(other),
        })?;

    info!(
        "User {} moved to session id {}",
        current_user.user_id, moved.user_id
    );
    Ok(Json(FixUserDTO {
        success: true,
        message: "User ID updated to match the session".to_string(),
        old_id: current_user.user_id,
        new_id: moved.user_id,
    }))
}
