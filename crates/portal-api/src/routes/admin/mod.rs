//! Admin console API
//!
//! Every handler here requires the admin role marker.

mod account;
mod activities;

use axum::Router;

use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(account::routes())
        .merge(activities::routes())
}
