//! Application state

use portal_auth::{Authenticator, RoleMarker};
use portal_db::Database;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub auth: Arc<Authenticator>,
    pub marker: RoleMarker,
    /// Add `Secure` to the role cookie
    pub cookie_secure: bool,
    /// Use the socket peer address as client key when no forwarding header is present
    pub trust_peer_address: bool,
}

impl AppState {
    pub fn new(
        db: Database,
        auth: Arc<Authenticator>,
        marker: RoleMarker,
        cookie_secure: bool,
        trust_peer_address: bool,
    ) -> Self {
        Self {
            db,
            auth,
            marker,
            cookie_secure,
            trust_peer_address,
        }
    }
}
