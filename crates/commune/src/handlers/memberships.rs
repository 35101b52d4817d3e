//! Unit membership handlers, nested under `/units/{id}/members/`.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use commune_auth::CurrentUser;
use commune_core::community::{AddMemberRequest, Membership, UpdateMemberRequest};

use crate::{
    handlers::{error::not_found, AppError},
    state::AppState,
};

async fn ensure_unit_exists(state: &AppState, unit_id: Uuid) -> Result<(), AppError> {
    state
        .units
        .get_unit(unit_id)
        .await?
        .map(|_| ())
        .ok_or_else(|| not_found("Unit", unit_id))
}

/// List the members of a unit (GET /units/{id}/members/).
pub async fn list_members(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
    Path(unit_id): Path<Uuid>,
) -> Result<Json<Vec<Membership>>, AppError> {
    ensure_unit_exists(&state, unit_id).await?;

    let members = state.memberships.list_members(unit_id).await?;
    Ok(Json(members))
}

/// Add a member to a unit (POST /units/{id}/members/).
///
/// A second membership for the same user and unit is a conflict.
pub async fn add_member(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(unit_id): Path<Uuid>,
    payload: Result<Json<AddMemberRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Membership>), AppError> {
    let Json(payload) = payload?;
    ensure_unit_exists(&state, unit_id).await?;

    let membership = payload.into_membership(unit_id);
    state.memberships.create_membership(&membership).await?;

    tracing::info!(
        unit_id = %unit_id,
        member_id = %membership.user_id,
        role = membership.role.as_str(),
        user_id = %user.id,
        "Added unit member"
    );

    Ok((StatusCode::CREATED, Json(membership)))
}

/// Change a member's role (PUT/PATCH /units/{id}/members/{user_id}/).
pub async fn update_member(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path((unit_id, member_id)): Path<(Uuid, Uuid)>,
    payload: Result<Json<UpdateMemberRequest>, JsonRejection>,
) -> Result<Json<Membership>, AppError> {
    let Json(payload) = payload?;

    let mut membership = state
        .memberships
        .get_membership(unit_id, member_id)
        .await?
        .ok_or_else(|| not_found("Membership", format!("unit={unit_id} user={member_id}")))?;

    membership.role = payload.role;
    state.memberships.update_membership(&membership).await?;

    tracing::info!(
        unit_id = %unit_id,
        member_id = %member_id,
        role = membership.role.as_str(),
        user_id = %user.id,
        "Updated unit member"
    );

    Ok(Json(membership))
}

/// Remove a member from a unit (DELETE /units/{id}/members/{user_id}/).
pub async fn remove_member(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path((unit_id, member_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    state
        .memberships
        .delete_membership(unit_id, member_id)
        .await?;

    tracing::info!(unit_id = %unit_id, member_id = %member_id, user_id = %user.id, "Removed unit member");

    Ok(StatusCode::NO_CONTENT)
}
