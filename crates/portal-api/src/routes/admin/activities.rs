//! Activity management routes

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use tracing::info;

use crate::error::ApiError;
use crate::extract::{RequireAdmin, ValidJson};
use crate::state::AppState;

use crate::routes::types::{ActivityRequest, ActivityResponse};
use crate::routes::validation::validate_activity;

/// GET /api/admin/activities
async fn list_activities(
    _admin: RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<ActivityResponse>>, ApiError> {
    let activities = state.db.list_activities().await?;
    Ok(Json(activities.into_iter().map(ActivityResponse::from).collect()))
}

/// POST /api/admin/activities
async fn create_activity(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    ValidJson(request): ValidJson<ActivityRequest>,
) -> Result<(StatusCode, Json<ActivityResponse>), ApiError> {
    let activity = state.db.insert_activity(validate_activity(request)?).await?;

    info!("Created activity {} ({})", activity.id, activity.name);

    Ok((StatusCode::CREATED, Json(activity.into())))
}

/// GET /api/admin/activities/{id}
async fn get_activity(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ActivityResponse>, ApiError> {
    let activity = state
        .db
        .get_activity(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Activity: {}", id)))?;

    Ok(Json(activity.into()))
}

/// PUT /api/admin/activities/{id}
async fn update_activity(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ValidJson(request): ValidJson<ActivityRequest>,
) -> Result<Json<ActivityResponse>, ApiError> {
    let activity = state
        .db
        .update_activity(id, validate_activity(request)?)
        .await?;

    info!("Updated activity {} ({})", activity.id, activity.name);

    Ok(Json(activity.into()))
}

/// DELETE /api/admin/activities/{id}
async fn delete_activity(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if state.db.delete_activity(id).await? {
        info!("Deleted activity {}", id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Activity: {}", id)))
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/admin/activities",
            get(list_activities).post(create_activity),
        )
        .route(
            "/api/admin/activities/{id}",
            get(get_activity).put(update_activity).delete(delete_activity),
        )
}
