//! Activity Portal Database Layer
//!
//! This crate provides the persistence collaborator for Activity Portal:
//! credential records and activities, stored in SQLite via sqlx.

pub mod error;
pub mod models;
pub mod repository;
pub mod utils;

pub use error::DbError;
pub use models::*;
pub use repository::Database;
