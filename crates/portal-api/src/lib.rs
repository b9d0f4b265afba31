//! Activity Portal HTTP API
//!
//! This crate provides the Axum router for Activity Portal: the login and
//! logout endpoints, the admin console API, the activity listing, and the
//! embedded pages, all behind the access gate.

pub mod error;
pub mod extract;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
