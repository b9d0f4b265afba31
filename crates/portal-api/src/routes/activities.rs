//! Activity listing for signed-in users

use axum::{Json, Router, extract::State, routing::get};

use crate::error::ApiError;
use crate::extract::RequireRole;
use crate::state::AppState;

use super::types::ActivityResponse;

/// GET /api/activities
async fn list_activities(
    _role: RequireRole,
    State(state): State<AppState>,
) -> Result<Json<Vec<ActivityResponse>>, ApiError> {
    let activities = state.db.list_activities().await?;
    Ok(Json(activities.into_iter().map(ActivityResponse::from).collect()))
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/activities", get(list_activities))
}
