use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::Json;
use serde::Deserialize;
use tracing::{debug, info, instrument};

use super::parse_id;
use crate::auth::{ensure_can_modify, Session};
use crate::discovery::EventFeed;
use crate::models::{Event, EventInput};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{created, success};

pub async fn list_events(State(state): State<AppState>) -> Result<Response, AppError> {
    let events = state.events.list_events().await?;
    debug!(count = events.len(), "Listed events");
    Ok(success(events, "Events retrieved successfully"))
}

pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_id(&id, "Event")?;
    let event = state
        .events
        .find_event(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Event with id '{id}' was not found")))?;
    Ok(success(event, "Event retrieved successfully"))
}

#[derive(Debug, Deserialize)]
pub struct DiscoverQuery {
    #[serde(default)]
    pub q: Option<String>,
}

/// Random carousel sample, optionally narrowed by a search term.
pub async fn discover_events(
    State(state): State<AppState>,
    Query(query): Query<DiscoverQuery>,
) -> Result<Response, AppError> {
    let mut feed = EventFeed::new();
    feed.set_events(state.events.list_events().await?);
    if let Some(term) = query.q {
        feed.set_search_term(term);
    }
    debug!(
        term = feed.search_term(),
        picked = feed.filtered().len(),
        "Built discovery sample"
    );
    Ok(success(feed.into_filtered(), "Events discovered"))
}

#[instrument(name = "events.create", skip_all, fields(organizer_id = %session.user_id))]
pub async fn create_event(
    State(state): State<AppState>,
    session: Session,
    payload: Result<Json<EventInput>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(input) = payload?;
    let draft = input.validate()?;

    // The organizer is always the caller
    let organizer = session.current_user(&state).await?;

    let event = Event::from_draft(draft, organizer.id);
    state.events.insert_event(&event).await?;

    info!(event_id = %event.id, "Created event");
    Ok(created(event, "Event created successfully"))
}

#[instrument(name = "events.update", skip_all, fields(event_id = %id, user_id = %session.user_id))]
pub async fn update_event(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    payload: Result<Json<EventInput>, JsonRejection>,
) -> Result<Response, AppError> {
    let id = parse_id(&id, "Event")?;
    let Json(input) = payload?;
    let draft = input.validate()?;
    let actor = session.current_user(&state).await?;

    let mut event = state
        .events
        .find_event(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Event with id '{id}' was not found")))?
        .event;
    ensure_can_modify(&actor, event.organizer_id, "event")?;

    event.replace_with(draft);
    if !state.events.update_event(&event).await? {
        return Err(AppError::NotFound(format!("Event with id '{id}' was not found")));
    }

    info!("Updated event");
    Ok(success(event, "Event updated successfully"))
}

#[instrument(name = "events.delete", skip_all, fields(event_id = %id, user_id = %session.user_id))]
pub async fn delete_event(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_id(&id, "Event")?;
    let actor = session.current_user(&state).await?;

    let existing = state
        .events
        .find_event(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Event with id '{id}' was not found")))?;
    ensure_can_modify(&actor, existing.event.organizer_id, "event")?;

    let deleted = state
        .events
        .delete_event(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Event with id '{id}' was not found")))?;

    info!("Deleted event");
    Ok(success(deleted, "Event deleted successfully"))
}
