//! Attendance services - invitations, RSVP and payment tracking

use super::UserLookup;
use super::event::{attendance_dto, find_event};
use crate::core::{AppError, AppJson, AppState};
use crate::dtos::{
    AddAttendeesDTO, AttendanceDTO, CreateAttendanceDTO, InviteeDTO, RsvpDTO,
    UpdateAttendanceDTO, UpdateEventAttendanceDTO,
};
use crate::entities::{Attendance, AttendanceStatus, User};
use crate::repositories::{Read, Update};
use axum::{
    Extension,
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

/// Resolves the people to invite from `emails`.
///
/// Emails are trimmed, lowercased and de-duplicated. Registered users are linked
/// by id, other addresses stay email-only. People who already hold one of the
/// `existing` attendances are skipped.
pub(crate) async fn resolve_invitees(
    state: &AppState,
    emails: &[String],
    existing: &[Attendance],
) -> Result<Vec<InviteeDTO>, AppError> {
    let mut wanted: Vec<String> = Vec::new();
    for email in emails {
        let email = email.trim().to_lowercase();
        if !email.is_empty() && !wanted.contains(&email) {
            wanted.push(email);
        }
    }

    let mut invitees = Vec::new();
    for email in wanted {
        let user = state.user.find_by_email(&email).await?;
        let already_invited = existing.iter().any(|a| match &user {
            Some(user) => a.belongs_to(&user.user_id, &user.email),
            None => a.email.eq_ignore_ascii_case(&email),
        });
        if already_invited {
            debug!("{} already invited", email);
            continue;
        }

        invitees.push(match user {
            Some(user) => InviteeDTO {
                user_id: Some(user.user_id),
                email: user.email,
            },
            None => InviteeDTO {
                user_id: None,
                email,
            },
        });
    }
    Ok(invitees)
}

/// Invites `emails` to an existing event as PROPOSED attendances.
async fn invite_attendees(
    state: &AppState,
    event_id: i64,
    emails: &[String],
    inviter_id: &str,
) -> Result<Vec<Attendance>, AppError> {
    let existing = state.attendance.find_by_event(event_id).await?;
    let to_create: Vec<CreateAttendanceDTO> = resolve_invitees(state, emails, &existing)
        .await?
        .into_iter()
        .map(|invitee| CreateAttendanceDTO {
            event_id,
            user_id: invitee.user_id,
            email: invitee.email,
            status: AttendanceStatus::Proposed,
            invited_by_id: Some(inviter_id.to_string()),
        })
        .collect();

    if to_create.is_empty() {
        return Ok(Vec::new());
    }
    Ok(state.attendance.create_many(&to_create).await?)
}

async fn attendance_with_users(
    state: &AppState,
    attendance: Attendance,
) -> Result<AttendanceDTO, AppError> {
    let ids = [
        attendance.user_id.clone(),
        attendance.invited_by_id.clone(),
        attendance.paid_by_id.clone(),
    ]
    .into_iter()
    .flatten()
    .collect();
    let users = UserLookup::load(state, ids).await?;
    Ok(attendance_dto(attendance, &users))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id))]
pub async fn add_attendees(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(event_id): Path<i64>,
    AppJson(body): AppJson<AddAttendeesDTO>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Adding attendees to event {}", event_id);
    // 1. The event must exist and the caller must be its creator
    // 2. Validate the email list
    // 3. Invite the addresses not yet invited
    // 4. Return the new attendances with their users
    let event = find_event(&state, event_id).await?;
    if event.creator_id != current_user.user_id {
        warn!("Only the creator can add attendees to event {}", event_id);
        return Err(AppError::forbidden("Only event creator can add attendees"));
    }

    body.validate()?;

    let created =
        invite_attendees(&state, event_id, &body.attendee_emails, &current_user.user_id).await?;

    let ids = created
        .iter()
        .flat_map(|a| [a.user_id.clone(), a.invited_by_id.clone()])
        .flatten()
        .collect();
    let users = UserLookup::load(&state, ids).await?;
    let attendances: Vec<AttendanceDTO> = created
        .into_iter()
        .map(|a| attendance_dto(a, &users))
        .collect();

    info!("Added {} attendees to event {}", attendances.len(), event_id);
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": format!("Added {} new attendees", attendances.len()),
            "attendances": attendances,
        })),
    ))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id, attendance_id = body.attendance_id))]
pub async fn update_event_attendance(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(event_id): Path<i64>,
    AppJson(body): AppJson<UpdateEventAttendanceDTO>,
) -> Result<Json<AttendanceDTO>, AppError> {
    debug!("Updating attendance in event {}", event_id);
    // 1. The event must exist and own the attendance
    // 2. Only the attendee or the event creator may touch it
    // 3. The attendee sets the status, the creator sets the payment
    let event = find_event(&state, event_id).await?;

    let attendance = state
        .attendance
        .read(&body.attendance_id)
        .await?
        .filter(|a| a.event_id == event_id)
        .ok_or_else(|| {
            warn!("Attendance {} not in event {}", body.attendance_id, event_id);
            AppError::not_found("Attendance not found for this event")
        })?;

    let is_owner = attendance.belongs_to(&current_user.user_id, &current_user.email);
    let is_creator = event.creator_id == current_user.user_id;
    if !is_owner && !is_creator {
        warn!("User may not update attendance {}", attendance.attendance_id);
        return Err(AppError::forbidden(
            "You can only update your own attendance",
        ));
    }

    let mut changes = UpdateAttendanceDTO::default();
    if is_owner {
        changes.status = body.status;
    }
    if is_creator {
        match body.is_paid {
            Some(true) => {
                changes.is_paid = Some(true);
                changes.paid_by_id = body.paid_by_id;
            }
            Some(false) => {
                changes.is_paid = Some(false);
                changes.paid_by_id = Some(None);
            }
            None => {}
        }
    }

    let updated = state
        .attendance
        .update(&attendance.attendance_id, &changes)
        .await?;
    info!("Attendance {} updated", updated.attendance_id);
    Ok(Json(attendance_with_users(&state, updated).await?))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id, status = ?body.status))]
pub async fn rsvp(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(attendance_id): Path<i64>,
    AppJson(body): AppJson<RsvpDTO>,
) -> Result<Json<AttendanceDTO>, AppError> {
    debug!("RSVP for attendance {}", attendance_id);
    let attendance = state.attendance.read(&attendance_id).await?.ok_or_else(|| {
        warn!("Attendance {} not found", attendance_id);
        AppError::not_found("Attendance not found")
    })?;

    if !attendance.belongs_to(&current_user.user_id, &current_user.email) {
        warn!("User does not own attendance {}", attendance_id);
        return Err(AppError::forbidden(
            "You can only update your own attendance",
        ));
    }

    let updated = state
        .attendance
        .update(
            &attendance_id,
            &UpdateAttendanceDTO {
                status: Some(body.status),
                ..Default::default()
            },
        )
        .await?;

    let event = state.event.read(&updated.event_id).await?;
    let mut dto = attendance_with_users(&state, updated).await?;
    dto.event = event;

    info!("Attendance {} is now {:?}", attendance_id, body.status);
    Ok(Json(dto))
}
