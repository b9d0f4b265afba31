//! Request extractors

use axum::{
    Json,
    extract::{ConnectInfo, FromRef, FromRequest, FromRequestParts, Request, rejection::JsonRejection},
    http::request::Parts,
};
use portal_auth::client_key_from_headers;
use portal_db::UserRole;
use std::convert::Infallible;
use std::net::SocketAddr;
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;

/// JSON body whose rejections become `400` with a JSON message
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ValidJson(value)),
            Err(rejection) => Err(ApiError::BadRequest(rejection.body_text())),
        }
    }
}

/// Extractor for any authenticated role (required)
pub struct RequireRole(pub UserRole);

impl<S> FromRequestParts<S> for RequireRole
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        let role = app_state
            .marker
            .resolve(&parts.headers)
            .ok_or(ApiError::Unauthorized)?;

        debug!("Request authorized for role: {}", role);
        Ok(RequireRole(role))
    }
}

/// Extractor for the admin role (required)
pub struct RequireAdmin;

impl<S> FromRequestParts<S> for RequireAdmin
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let RequireRole(role) = RequireRole::from_request_parts(parts, state).await?;

        if !role.is_admin() {
            return Err(ApiError::Forbidden);
        }

        Ok(RequireAdmin)
    }
}

/// Key used to throttle logins from one client; `None` disables throttling
pub struct ClientKey(pub Option<String>);

impl<S> FromRequestParts<S> for ClientKey
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(key) = client_key_from_headers(&parts.headers) {
            return Ok(ClientKey(Some(key)));
        }

        let app_state = AppState::from_ref(state);
        if !app_state.trust_peer_address {
            return Ok(ClientKey(None));
        }

        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string());
        Ok(ClientKey(peer))
    }
}
