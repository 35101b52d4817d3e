//! Unit CRUD handlers.

use std::collections::HashMap;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use commune_auth::CurrentUser;
use commune_core::community::{
    validate_unit, would_create_cycle, CreateUnitRequest, Unit, UnitError, UpdateUnitRequest,
};
use commune_core::storage::UnitFilter;

use crate::{
    handlers::{error::not_found, AppError},
    state::AppState,
};

/// List units (GET /units/?search=&parent=).
pub async fn list_units(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
    Query(filter): Query<UnitFilter>,
) -> Result<Json<Vec<Unit>>, AppError> {
    let units = state.units.list_units(&filter).await?;
    Ok(Json(units))
}

/// Create a unit (POST /units/).
pub async fn create_unit(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    payload: Result<Json<CreateUnitRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Unit>), AppError> {
    let Json(payload) = payload?;
    let unit = payload.into_unit();
    validate_unit(&unit)?;

    state.units.create_unit(&unit).await?;

    tracing::info!(unit_id = %unit.id, name = %unit.name, user_id = %user.id, "Created unit");

    Ok((StatusCode::CREATED, Json(unit)))
}

/// Get a unit by ID (GET /units/{id}/).
pub async fn get_unit(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Unit>, AppError> {
    let unit = state
        .units
        .get_unit(id)
        .await?
        .ok_or_else(|| not_found("Unit", id))?;

    Ok(Json(unit))
}

/// Update a unit (PUT/PATCH /units/{id}/).
///
/// Re-parenting is refused when the new parent is the unit itself or one of
/// its descendants.
pub async fn update_unit(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateUnitRequest>, JsonRejection>,
) -> Result<Json<Unit>, AppError> {
    let Json(payload) = payload?;

    let mut unit = state
        .units
        .get_unit(id)
        .await?
        .ok_or_else(|| not_found("Unit", id))?;

    let previous_parent = unit.parent_unit_id;
    payload.apply_to(&mut unit);
    validate_unit(&unit)?;

    if unit.parent_unit_id.is_some() && unit.parent_unit_id != previous_parent {
        let parents: HashMap<Uuid, Option<Uuid>> = state
            .units
            .list_units(&UnitFilter::default())
            .await?
            .into_iter()
            .map(|u| (u.id, u.parent_unit_id))
            .collect();

        if would_create_cycle(unit.id, unit.parent_unit_id, &parents) {
            return Err(UnitError::CyclicParent.into());
        }
    }

    state.units.update_unit(&unit).await?;

    tracing::info!(unit_id = %unit.id, user_id = %user.id, "Updated unit");

    Ok(Json(unit))
}

/// Delete a unit (DELETE /units/{id}/).
pub async fn delete_unit(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.units.delete_unit(id).await?;

    tracing::info!(unit_id = %id, user_id = %user.id, "Deleted unit");

    Ok(StatusCode::NO_CONTENT)
}
