//! Activity Portal Authentication and Authorization
//!
//! This crate provides credential verification with per-client login
//! throttling, the role marker carried in the `role` cookie, and the
//! route access gate applied to every request.

pub mod authenticator;
pub mod error;
pub mod gate;
pub mod jwt;
pub mod lockout;
pub mod marker;
pub mod middleware;
pub mod password;

pub use authenticator::{Authenticated, Authenticator, CredentialStore};
pub use error::AuthError;
pub use gate::{GateDecision, gate};
pub use jwt::{JwtManager, RoleClaims};
pub use lockout::{
    Clock, LockoutEntry, LockoutPolicy, LockoutStore, ManualClock, MemoryLockoutStore, SystemClock,
};
pub use marker::{MarkerMode, ROLE_COOKIE, RoleMarker};
pub use middleware::{access_gate, client_key_from_headers};
pub use password::{Argon2Hasher, SecretHasher, hash_password, verify_password};
