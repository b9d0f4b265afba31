//! Authentication error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use portal_db::DbError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum AuthError {
    /// Unknown identifier or wrong secret; callers cannot tell which
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Too many failed login attempts")]
    RateLimited,

    #[error("Missing or invalid role marker")]
    Unauthorized,

    #[error("Insufficient permissions")]
    Forbidden,

    #[error("User not found")]
    NotFound,

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("Role marker cannot be sent as a cookie: {0}")]
    InvalidMarker(String),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Credential store error: {0}")]
    Store(#[from] DbError),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::InvalidCredentials | AuthError::Unauthorized => StatusCode::UNAUTHORIZED,
            AuthError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AuthError::Forbidden => StatusCode::FORBIDDEN,
            AuthError::NotFound => StatusCode::NOT_FOUND,
            AuthError::PasswordHash(_)
            | AuthError::InvalidMarker(_)
            | AuthError::Jwt(_)
            | AuthError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to the client
    pub fn public_message(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "Invalid credentials",
            AuthError::RateLimited => "Too many login attempts, please try again later",
            AuthError::Unauthorized => "Unauthorized",
            AuthError::Forbidden => "Forbidden",
            AuthError::NotFound => "Admin user not found",
            AuthError::PasswordHash(_)
            | AuthError::InvalidMarker(_)
            | AuthError::Jwt(_)
            | AuthError::Store(_) => "Internal server error",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Authentication failure: {}", self);
        }

        let body = axum::Json(json!({
            "message": self.public_message()
        }));

        (status, body).into_response()
    }
}
