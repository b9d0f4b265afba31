//! API routes

mod activities;
mod admin;
mod auth;
mod health;
pub mod types;
mod validation;


use axum::{
    Router,
    http::{StatusCode, Uri, header},
    middleware,
    response::{Html, IntoResponse, Response},
};
use portal_auth::access_gate;
use portal_auth::gate::{ADMIN_PATH, LOGIN_PATH, USERS_PATH};
use rust_embed::Embed;

use crate::state::AppState;

/// Embedded pages and assets
#[derive(Embed)]
#[folder = "$CARGO_MANIFEST_DIR/../../static"]
struct Assets;

/// Page served for a guarded path, if any
fn page_for(path: &str) -> Option<&'static str> {
    if path == LOGIN_PATH {
        Some("login.html")
    } else if path.starts_with(ADMIN_PATH) {
        Some("admin.html")
    } else if path.starts_with(USERS_PATH) {
        Some("users.html")
    } else {
        None
    }
}

/// Handler for serving embedded pages and assets
async fn serve_embedded_file(uri: Uri) -> Response {
    if let Some(page) = page_for(uri.path()) {
        return match <Assets as Embed>::get(page) {
            Some(content) => Html(content.data.into_owned()).into_response(),
            None => StatusCode::NOT_FOUND.into_response(),
        };
    }

    let path = uri.path().trim_start_matches('/');
    match <Assets as Embed>::get(path) {
        Some(content) => {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            (
                [(header::CONTENT_TYPE, mime.as_ref())],
                content.data.into_owned(),
            )
                .into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Create the main router
///
/// The access gate wraps every route, the page fallback included.
pub fn create_router(state: AppState) -> Router {
    let marker = state.marker.clone();

    Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .merge(activities::routes())
        .merge(admin::routes())
        .fallback(serve_embedded_file)
        .with_state(state)
        .layer(middleware::from_fn_with_state(marker, access_gate))
}
