//! Event attendance handlers.
//!
//! RSVPs always act on the caller; there is no way to answer for someone else.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use commune_auth::CurrentUser;
use commune_core::community::{EventAttendee, RsvpRequest};
use commune_core::storage::AttendeeFilter;

use crate::{
    handlers::{error::not_found, AppError},
    state::AppState,
};

async fn ensure_event_exists(state: &AppState, event_id: Uuid) -> Result<(), AppError> {
    state
        .events
        .get_event(event_id)
        .await?
        .map(|_| ())
        .ok_or_else(|| not_found("Event", event_id))
}

/// List attendees of an event (GET /events/{id}/attendees/?status=).
pub async fn list_attendees(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    Query(filter): Query<AttendeeFilter>,
) -> Result<Json<Vec<EventAttendee>>, AppError> {
    ensure_event_exists(&state, event_id).await?;

    let attendees = state.attendees.list_attendees(event_id, &filter).await?;
    Ok(Json(attendees))
}

/// Set the caller's RSVP (PUT /events/{id}/rsvp/).
///
/// Answering again replaces the previous status.
pub async fn rsvp(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    payload: Result<Json<RsvpRequest>, JsonRejection>,
) -> Result<Json<EventAttendee>, AppError> {
    let Json(payload) = payload?;
    ensure_event_exists(&state, event_id).await?;

    let attendee = EventAttendee::new(event_id, user.id, payload.status);
    let stored = state.attendees.upsert_attendee(&attendee).await?;

    tracing::info!(
        event_id = %event_id,
        user_id = %user.id,
        status = stored.status.as_str(),
        "Recorded RSVP"
    );

    Ok(Json(stored))
}

/// Withdraw the caller's RSVP (DELETE /events/{id}/rsvp/).
pub async fn withdraw_rsvp(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.attendees.delete_attendee(event_id, user.id).await?;

    tracing::info!(event_id = %event_id, user_id = %user.id, "Withdrew RSVP");

    Ok(StatusCode::NO_CONTENT)
}
