//! Event services - event CRUD and the event page payload

use super::{UserLookup, attendance::resolve_invitees};
use crate::core::{AppError, AppJson, AppState};
use crate::dtos::{
    AttendanceDTO, BillDTO, CreateEventDTO, CreateEventRequestDTO, EventDetailDTO,
    EventSummaryDTO, EventsQuery, ForceQuery, UpdateEventDTO,
};
use crate::entities::{Attendance, Event, User};
use crate::repositories::{Delete, Read, Update};
use axum::{
    Extension,
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_macros::debug_handler;
use futures_util::future::try_join_all;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

/// Reads an event or fails with 404.
pub(crate) async fn find_event(state: &AppState, event_id: i64) -> Result<Event, AppError> {
    state.event.read(&event_id).await?.ok_or_else(|| {
        warn!("Event {} not found", event_id);
        AppError::not_found("Event not found")
    })
}

/// Attendance with its referenced users resolved
pub(crate) fn attendance_dto(attendance: Attendance, users: &UserLookup) -> AttendanceDTO {
    AttendanceDTO {
        user: users.get(attendance.user_id.as_deref()),
        invited_by: users.get(attendance.invited_by_id.as_deref()),
        paid_by: users.get(attendance.paid_by_id.as_deref()),
        attendance,
        event: None,
    }
}

/// Loads everything the event page shows: creator, window, payer, attendances
/// and bills with their attachments and items.
pub(crate) async fn load_event_detail(
    state: &AppState,
    event: Event,
) -> Result<EventDetailDTO, AppError> {
    let (attendances, bills, wip_window) = futures::try_join!(
        state.attendance.find_by_event(event.event_id),
        state.bill.find_by_event(event.event_id),
        state.window.read(&event.wip_window_id),
    )?;

    let bill_ids: Vec<i64> = bills.iter().map(|b| b.bill_id).collect();
    let (items, attachments) = futures::try_join!(
        state.bill.items_for_bills(&bill_ids),
        state.attachment.find_by_bills(&bill_ids),
    )?;

    let mut user_ids = vec![event.creator_id.clone()];
    user_ids.extend(event.paid_by_id.clone());
    for attendance in &attendances {
        user_ids.extend(attendance.user_id.clone());
        user_ids.extend(attendance.invited_by_id.clone());
        user_ids.extend(attendance.paid_by_id.clone());
    }
    user_ids.extend(bills.iter().map(|b| b.payer_id.clone()));
    let users = UserLookup::load(state, user_ids).await?;

    let mut items_by_bill: HashMap<i64, Vec<_>> = HashMap::new();
    for item in items {
        items_by_bill.entry(item.bill_id).or_default().push(item);
    }
    let mut attachments_by_bill: HashMap<i64, Vec<_>> = HashMap::new();
    for attachment in attachments {
        attachments_by_bill
            .entry(attachment.bill_id)
            .or_default()
            .push(attachment);
    }

    let bills = bills
        .into_iter()
        .map(|bill| BillDTO {
            payer: users.get(Some(bill.payer_id.as_str())),
            attachments: attachments_by_bill.remove(&bill.bill_id).unwrap_or_default(),
            items: items_by_bill.remove(&bill.bill_id).unwrap_or_default(),
            bill,
        })
        .collect();

    Ok(EventDetailDTO {
        creator: users.get(Some(event.creator_id.as_str())),
        paid_by: users.get(event.paid_by_id.as_deref()),
        wip_window,
        attendances: attendances
            .into_iter()
            .map(|a| attendance_dto(a, &users))
            .collect(),
        bills,
        event,
    })
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id))]
pub async fn create_event(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    AppJson(body): AppJson<CreateEventRequestDTO>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Creating event");
    // 1. Validate the body (title length, attendee emails)
    // 2. The target window must exist
    // 3. Resolve the attendee emails, exactly like POST /events/{id}/attendees
    // 4. Insert the event with the caller as creator and its invitations together
    // 5. Return the full event detail
    body.validate()?;

    if state.window.read(&body.wip_window_id).await?.is_none() {
        warn!("WIP window {} not found", body.wip_window_id);
        return Err(AppError::not_found("WIP window not found"));
    }

    let invitees = resolve_invitees(&state, &body.attendee_emails, &[]).await?;
    let (event, invited) = state
        .event
        .create_with_invites(
            &CreateEventDTO {
                wip_window_id: body.wip_window_id,
                title: body.title.trim().to_string(),
                date: body.date,
                location: body.location.filter(|l| !l.trim().is_empty()),
                notes: body.notes.filter(|n| !n.trim().is_empty()),
                creator_id: current_user.user_id.clone(),
            },
            &invitees,
        )
        .await?;
    debug!("Invited {} attendees", invited.len());

    info!("Event {} created", event.event_id);
    let detail = load_event_detail(&state, event).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id, filter = ?params.filter))]
pub async fn list_events(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Query(params): Query<EventsQuery>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Listing events");
    let events = state
        .event
        .list(params.filter, &current_user, params.search.as_deref())
        .await?;

    let summaries: Vec<EventSummaryDTO> = try_join_all(events.into_iter().map(|event| {
        let state = state.clone();
        async move { load_event_detail(&state, event).await }
    }))
    .await?
    .into_iter()
    .map(EventSummaryDTO::from)
    .collect();

    info!("Found {} events", summaries.len());
    Ok(Json(json!({ "events": summaries })))
}

#[instrument(skip(state))]
pub async fn get_event(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<i64>,
) -> Result<Json<EventDetailDTO>, AppError> {
    debug!("Fetching event");
    let event = find_event(&state, event_id).await?;
    Ok(Json(load_event_detail(&state, event).await?))
}

#[debug_handler]
#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id))]
pub async fn update_event(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(event_id): Path<i64>,
    AppJson(body): AppJson<UpdateEventDTO>,
) -> Result<Json<EventDetailDTO>, AppError> {
    debug!("Updating event {}", event_id);
    // 1. The event must exist
    // 2. The creator may edit every field; an invitee may only set who paid
    // 3. Validate the body and the referenced payer
    // 4. Write and return the refreshed detail
    let event = find_event(&state, event_id).await?;

    if event.creator_id != current_user.user_id {
        let is_invitee = state
            .attendance
            .find_by_event(event_id)
            .await?
            .iter()
            .any(|a| a.belongs_to(&current_user.user_id, &current_user.email));

        if !(is_invitee && body.is_only_paid_by()) {
            warn!("User may not edit event {}", event_id);
            return Err(AppError::forbidden(
                "Only the event creator can edit this event",
            ));
        }
    }

    body.validate()?;

    if let Some(Some(payer_id)) = &body.paid_by_id {
        if state.user.read(payer_id).await?.is_none() {
            warn!("Unknown payer {}", payer_id);
            return Err(AppError::bad_request("Unknown paid_by user"));
        }
    }

    let updated = state.event.update(&event_id, &body).await?;
    info!("Event {} updated", event_id);
    Ok(Json(load_event_detail(&state, updated).await?))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id, force = params.force))]
pub async fn delete_event(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(event_id): Path<i64>,
    Query(params): Query<ForceQuery>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Deleting event {}", event_id);
    let event = find_event(&state, event_id).await?;

    if event.creator_id != current_user.user_id {
        warn!("Only the creator can delete event {}", event_id);
        return Err(AppError::forbidden(
            "Only event creator can delete this event",
        ));
    }

    let bill_count = state.bill.count_by_event(event_id).await?;
    if bill_count > 0 && !params.force {
        warn!("Event {} still has {} bills", event_id, bill_count);
        return Err(AppError::bad_request("Cannot delete event with existing bills")
            .with_details("Delete the bills first or retry with force=true")
            .with_context("bill_count", bill_count)
            .with_context("can_force_delete", true));
    }

    state.event.delete(&event_id).await?;
    info!("Event {} deleted", event_id);
    Ok(Json(json!({ "success": true })))
}
