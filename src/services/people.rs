//! People service - participants with their spending totals

use crate::core::{AppError, AppState};
use crate::dtos::PersonDTO;
use crate::split::equal_split;
use axum::extract::{Json, State};
use axum::response::IntoResponse;
use futures_util::future::try_join_all;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Equal-split shares of one event, keyed by attendance id
async fn event_shares(state: &AppState, event_id: i64) -> Result<HashMap<i64, i64>, sqlx::Error> {
    let (total, attendances) = futures::try_join!(
        state.bill.total_for_event(event_id),
        state.attendance.find_by_event(event_id),
    )?;
    let confirmed: Vec<i64> = attendances
        .iter()
        .filter(|a| a.is_confirmed())
        .map(|a| a.attendance_id)
        .collect();
    Ok(equal_split(total, &confirmed).as_map())
}

#[instrument(skip(state))]
pub async fn list_people(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    debug!("Listing people");
    // 1. Users with at least one invitation they have not declined
    // 2. Their confirmed attendances, loaded in parallel
    // 3. One equal split per event involved
    // 4. Per person: confirmed events, bills paid, sum of shares
    let users = state.user.list_with_open_attendances().await?;

    let per_user = try_join_all(users.iter().map(|user| {
        let state = state.clone();
        let user_id = user.user_id.clone();
        async move {
            let (attendances, spent) = futures::try_join!(
                state.attendance.find_by_user(&user_id),
                state.bill.total_paid_in_confirmed_events(&user_id),
            )?;
            let confirmed: Vec<_> = attendances.into_iter().filter(|a| a.is_confirmed()).collect();
            Ok::<_, sqlx::Error>((confirmed, spent))
        }
    }))
    .await?;

    let mut event_ids: Vec<i64> = per_user
        .iter()
        .flat_map(|(confirmed, _)| confirmed.iter().map(|a| a.event_id))
        .collect();
    event_ids.sort_unstable();
    event_ids.dedup();

    let splits: HashMap<i64, HashMap<i64, i64>> = try_join_all(event_ids.into_iter().map(|event_id| {
        let state = state.clone();
        async move { Ok::<_, sqlx::Error>((event_id, event_shares(&state, event_id).await?)) }
    }))
    .await?
    .into_iter()
    .collect();

    let people: Vec<PersonDTO> = users
        .into_iter()
        .zip(per_user)
        .map(|(user, (confirmed, total_spent))| {
            let total_owed = confirmed
                .iter()
                .filter_map(|a| splits.get(&a.event_id)?.get(&a.attendance_id))
                .sum();
            PersonDTO {
                id: user.user_id,
                name: user.name,
                email: user.email,
                image: user.image,
                event_count: confirmed.len(),
                total_spent,
                total_owed,
            }
        })
        .collect();

    info!("Found {} people", people.len());
    Ok(Json(json!({ "people": people })))
}
