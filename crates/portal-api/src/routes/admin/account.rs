//! Admin credential management

use axum::{Json, Router, extract::State, routing::post};
use portal_auth::AuthError;
use tracing::debug;

use crate::error::ApiError;
use crate::extract::{RequireAdmin, ValidJson};
use crate::state::AppState;

use crate::routes::types::{ChangeSecretRequest, MessageResponse};
use crate::routes::validation::{validate_identifier, validate_new_password, validate_password};

/// POST /api/admin/update
async fn update_admin_secret(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    ValidJson(request): ValidJson<ChangeSecretRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    validate_password(&request.old_secret)?;
    validate_new_password(&request.new_secret)?;

    let identifier = match request.identifier {
        Some(identifier) => {
            validate_identifier(&identifier)?;
            identifier
        }
        None => {
            state
                .db
                .first_admin()
                .await?
                .ok_or(AuthError::NotFound)?
                .username
        }
    };

    debug!("Changing password for admin: {}", identifier);

    state
        .auth
        .change_secret(&identifier, &request.old_secret, &request.new_secret)
        .await?;

    Ok(Json(MessageResponse::new("Admin password updated")))
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/admin/update", post(update_admin_secret))
}
