//! Cost sharing service

use super::event::{find_event, load_event_detail};
use crate::core::{AppError, AppState};
use crate::dtos::{ShareDTO, SplitDTO};
use crate::split::equal_split;
use axum::extract::{Json, Path, State};
use std::sync::Arc;
use tracing::{debug, instrument};

#[instrument(skip(state))]
pub async fn get_split(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<i64>,
) -> Result<Json<SplitDTO>, AppError> {
    debug!("Computing cost split");
    let event = find_event(&state, event_id).await?;
    let detail = load_event_detail(&state, event).await?;

    let mut confirmed: Vec<_> = detail
        .attendances
        .iter()
        .filter(|a| a.attendance.is_confirmed())
        .collect();
    confirmed.sort_by_key(|a| a.attendance.attendance_id);

    let ids: Vec<i64> = confirmed.iter().map(|a| a.attendance.attendance_id).collect();
    let split = equal_split(detail.total_amount(), &ids);
    let share_percent = split.share_percent();

    let shares = confirmed
        .into_iter()
        .map(|a| ShareDTO {
            attendance_id: a.attendance.attendance_id,
            user_id: a.attendance.user_id.clone(),
            name: a.user.as_ref().and_then(|u| u.name.clone()),
            email: a.attendance.email.clone(),
            share_cents: split.share_of(a.attendance.attendance_id).unwrap_or_default(),
            share_percent,
            is_paid: a.attendance.is_paid,
            paid_by_id: a.attendance.paid_by_id.clone(),
        })
        .collect();

    Ok(Json(SplitDTO {
        event_id,
        total_cents: split.total_cents,
        attendee_count: split.attendee_count,
        per_person_cents: split.per_person_cents,
        remainder_cents: split.remainder_cents,
        shares,
    }))
}
