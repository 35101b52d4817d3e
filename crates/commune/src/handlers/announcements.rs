//! Announcement CRUD handlers.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use commune_auth::CurrentUser;
use commune_core::community::{
    validate_announcement, Announcement, CreateAnnouncementRequest, UpdateAnnouncementRequest,
};
use commune_core::storage::AnnouncementFilter;

use crate::{
    handlers::{error::not_found, AppError},
    state::AppState,
};

/// List announcements (GET /announcements/?unit=&pinned=&search=).
///
/// Pinned announcements come first, then newest first.
pub async fn list_announcements(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
    Query(filter): Query<AnnouncementFilter>,
) -> Result<Json<Vec<Announcement>>, AppError> {
    let announcements = state.announcements.list_announcements(&filter).await?;
    Ok(Json(announcements))
}

/// Create an announcement (POST /announcements/). The caller is the author.
pub async fn create_announcement(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    payload: Result<Json<CreateAnnouncementRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Announcement>), AppError> {
    let Json(payload) = payload?;
    let announcement = payload.into_announcement(user.id);
    validate_announcement(&announcement)?;

    state
        .announcements
        .create_announcement(&announcement)
        .await?;

    tracing::info!(
        announcement_id = %announcement.id,
        pinned = announcement.is_pinned,
        user_id = %user.id,
        "Created announcement"
    );

    Ok((StatusCode::CREATED, Json(announcement)))
}

/// Get an announcement by ID (GET /announcements/{id}/).
pub async fn get_announcement(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Announcement>, AppError> {
    let announcement = state
        .announcements
        .get_announcement(id)
        .await?
        .ok_or_else(|| not_found("Announcement", id))?;

    Ok(Json(announcement))
}

/// Update an announcement (PUT/PATCH /announcements/{id}/).
pub async fn update_announcement(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateAnnouncementRequest>, JsonRejection>,
) -> Result<Json<Announcement>, AppError> {
    let Json(payload) = payload?;

    let mut announcement = state
        .announcements
        .get_announcement(id)
        .await?
        .ok_or_else(|| not_found("Announcement", id))?;

    payload.apply_to(&mut announcement);
    validate_announcement(&announcement)?;

    state
        .announcements
        .update_announcement(&announcement)
        .await?;

    tracing::info!(announcement_id = %id, user_id = %user.id, "Updated announcement");

    Ok(Json(announcement))
}

/// Delete an announcement (DELETE /announcements/{id}/).
pub async fn delete_announcement(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.announcements.delete_announcement(id).await?;

    tracing::info!(announcement_id = %id, user_id = %user.id, "Deleted announcement");

    Ok(StatusCode::NO_CONTENT)
}
