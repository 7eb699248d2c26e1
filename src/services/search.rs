//! Search service - command palette lookup over events and people

use super::UserLookup;
use crate::core::{AppError, AppState};
use crate::dtos::{SearchQuery, SearchResultDTO};
use axum::extract::{Json, Query, State};
use axum::response::IntoResponse;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Queries shorter than this return nothing
const MIN_QUERY_CHARS: usize = 2;

#[instrument(skip(state), fields(q = ?params.q))]
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchQuery>,
) -> Result<impl IntoResponse, AppError> {
    let query = params.q.as_deref().map(str::trim).unwrap_or_default();
    if query.chars().count() < MIN_QUERY_CHARS {
        debug!("Query too short, returning no results");
        return Ok(Json(json!({ "results": Vec::<SearchResultDTO>::new() })));
    }

    let (events, users) = futures::try_join!(state.event.search(query), state.user.search(query))?;
    let creators =
        UserLookup::load(&state, events.iter().map(|e| e.creator_id.clone()).collect()).await?;

    let mut results: Vec<SearchResultDTO> = events
        .into_iter()
        .map(|event| SearchResultDTO::Event {
            href: format!("/events/{}", event.event_id),
            id: event.event_id,
            subtitle: creators
                .get(Some(event.creator_id.as_str()))
                .and_then(|c| c.name),
            date: event.date.to_rfc3339(),
            location: event.location,
            title: event.title,
        })
        .collect();

    results.extend(users.into_iter().map(|user| SearchResultDTO::Person {
        href: format!("/people/{}", user.user_id),
        title: user.display_name().to_string(),
        subtitle: user.email.clone(),
        id: user.user_id,
    }));

    info!("Search returned {} results", results.len());
    Ok(Json(json!({ "results": results })))
}
