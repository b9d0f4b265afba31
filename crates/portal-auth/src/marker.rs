//! Role marker carried in the `role` cookie

use axum::http::header::COOKIE;
use axum::http::{HeaderMap, HeaderValue};
use portal_db::UserRole;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

use crate::error::AuthError;
use crate::jwt::JwtManager;

/// Name of the cookie holding the role marker
pub const ROLE_COOKIE: &str = "role";

/// Encoding of the role marker
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MarkerMode {
    /// Cookie value is the bare role name
    #[default]
    Plain,
    /// Cookie value is an HS256 token carrying the role
    Signed,
}

/// Encodes roles into cookie values and resolves them back
#[derive(Clone)]
pub enum RoleMarker {
    Plain,
    Signed(Arc<JwtManager>),
}

impl RoleMarker {
    pub fn new(mode: MarkerMode, secret: &str) -> Self {
        match mode {
            MarkerMode::Plain => RoleMarker::Plain,
            MarkerMode::Signed => RoleMarker::Signed(Arc::new(JwtManager::new(secret))),
        }
    }

    pub fn encode(&self, username: &str, role: UserRole) -> Result<String, AuthError> {
        match self {
            RoleMarker::Plain => Ok(role.as_str().to_string()),
            RoleMarker::Signed(jwt) => jwt.generate_token(username, role),
        }
    }

    /// Role for a cookie value. Anything unrecognised is no role.
    pub fn decode(&self, value: &str) -> Option<UserRole> {
        match self {
            RoleMarker::Plain => UserRole::from_str(value).ok(),
            RoleMarker::Signed(jwt) => match jwt.validate_token(value) {
                Ok(claims) => Some(claims.role),
                Err(e) => {
                    debug!("Discarding role marker: {}", e);
                    None
                }
            },
        }
    }

    /// Role carried by the request's `role` cookie, if any
    pub fn resolve(&self, headers: &HeaderMap) -> Option<UserRole> {
        read_cookie(headers, ROLE_COOKIE).and_then(|value| self.decode(value))
    }
}

/// `Set-Cookie` value installing a role marker for the whole site
pub fn role_cookie(marker: &str, secure: bool) -> Result<HeaderValue, AuthError> {
    let mut cookie = format!("{ROLE_COOKIE}={marker}; Path=/; HttpOnly; SameSite=Lax");
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie).map_err(|e| AuthError::InvalidMarker(e.to_string()))
}

/// `Set-Cookie` value expiring the role marker
pub fn clear_role_cookie(secure: bool) -> HeaderValue {
    if secure {
        HeaderValue::from_static("role=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0; Secure")
    } else {
        HeaderValue::from_static("role=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
    }
}

/// First value of cookie `name` across all `Cookie` headers
pub fn read_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}
