//! Login and logout routes

use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header::SET_COOKIE},
    response::IntoResponse,
    routing::post,
};
use portal_auth::marker::{clear_role_cookie, role_cookie};
use tracing::debug;

use crate::error::ApiError;
use crate::extract::{ClientKey, ValidJson};
use crate::state::AppState;

use super::types::{LoginRequest, LoginResponse, MessageResponse};
use super::validation::{validate_identifier, validate_password};

/// POST /api/login
async fn login(
    State(state): State<AppState>,
    ClientKey(client_key): ClientKey,
    ValidJson(request): ValidJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // Malformed input is rejected before the lockout or the store are consulted
    validate_identifier(&request.identifier)?;
    validate_password(&request.secret)?;

    let authenticated = state
        .auth
        .authenticate(&request.identifier, &request.secret, client_key.as_deref())
        .await?;

    let marker = state
        .marker
        .encode(&authenticated.username, authenticated.role)?;
    let cookie = role_cookie(&marker, state.cookie_secure)?;

    debug!("Issued role marker for {}", authenticated.username);

    Ok((
        [(SET_COOKIE, cookie)],
        Json(LoginResponse {
            message: "Login successful".to_string(),
            role: authenticated.role,
            redirect: authenticated.role.home_path().to_string(),
        }),
    ))
}

/// POST /api/logout
///
/// Always clears the marker, whether or not one was presented.
async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(SET_COOKIE, clear_role_cookie(state.cookie_secure))],
        Json(MessageResponse::new("Logout successful")),
    )
}

/// Create auth routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/login", post(login))
        .route("/api/logout", post(logout))
}
