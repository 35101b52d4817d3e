//! Event CRUD handlers.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use commune_auth::CurrentUser;
use commune_core::community::{validate_event, CreateEventRequest, Event, UpdateEventRequest};
use commune_core::storage::EventFilter;

use crate::{
    handlers::{error::not_found, AppError},
    state::AppState,
};

/// List events (GET /events/?unit=&search=&from=&to=), ordered by start time.
pub async fn list_events(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
    Query(filter): Query<EventFilter>,
) -> Result<Json<Vec<Event>>, AppError> {
    let events = state.events.list_events(&filter).await?;
    Ok(Json(events))
}

/// Create an event (POST /events/). The caller becomes the creator.
pub async fn create_event(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    payload: Result<Json<CreateEventRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Event>), AppError> {
    let Json(payload) = payload?;
    let event = payload.into_event(user.id);
    validate_event(&event)?;

    state.events.create_event(&event).await?;

    tracing::info!(event_id = %event.id, title = %event.title, user_id = %user.id, "Created event");

    Ok((StatusCode::CREATED, Json(event)))
}

/// Get an event by ID (GET /events/{id}/).
pub async fn get_event(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Event>, AppError> {
    let event = state
        .events
        .get_event(id)
        .await?
        .ok_or_else(|| not_found("Event", id))?;

    Ok(Json(event))
}

/// Update an event (PUT/PATCH /events/{id}/).
pub async fn update_event(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateEventRequest>, JsonRejection>,
) -> Result<Json<Event>, AppError> {
    let Json(payload) = payload?;

    let mut event = state
        .events
        .get_event(id)
        .await?
        .ok_or_else(|| not_found("Event", id))?;

    payload.apply_to(&mut event);
    validate_event(&event)?;

    state.events.update_event(&event).await?;

    tracing::info!(event_id = %event.id, user_id = %user.id, "Updated event");

    Ok(Json(event))
}

/// Delete an event and its attendance (DELETE /events/{id}/).
pub async fn delete_event(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.events.delete_event(id).await?;

    tracing::info!(event_id = %id, user_id = %user.id, "Deleted event");

    Ok(StatusCode::NO_CONTENT)
}
