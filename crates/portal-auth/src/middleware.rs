//! Access gate middleware for Axum

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::debug;

use crate::gate::{GateDecision, gate};
use crate::marker::RoleMarker;

/// Access gate middleware
///
/// Resolves the role marker and applies [`gate`] before any handler runs.
/// Denied requests are redirected with `303 See Other`.
pub async fn access_gate(
    State(marker): State<RoleMarker>,
    request: Request,
    next: Next,
) -> Response {
    let role = marker.resolve(request.headers());

    match gate(request.uri().path(), role) {
        GateDecision::Continue => next.run(request).await,
        GateDecision::RedirectTo(location) => {
            debug!(
                "Gate redirect {} -> {} (role: {:?})",
                request.uri().path(),
                location,
                role
            );
            Redirect::to(location).into_response()
        }
    }
}

/// Client key for login throttling, from the forwarding headers.
///
/// Uses the first hop of `X-Forwarded-For`, then `X-Real-IP`. Both are
/// client-controlled unless a trusted proxy overwrites them.
pub fn client_key_from_headers(headers: &HeaderMap) -> Option<String> {
    first_hop(headers, "x-forwarded-for")
        .or_else(|| first_hop(headers, "x-real-ip"))
        .map(str::to_string)
}

fn first_hop<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|h| h.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}
