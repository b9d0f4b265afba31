//! Route access policy

use portal_db::UserRole;

pub const LOGIN_PATH: &str = "/login";
pub const ADMIN_PATH: &str = "/admin";
pub const USERS_PATH: &str = "/users";

/// Outcome of the access gate for one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Continue,
    RedirectTo(&'static str),
}

/// Decide whether a request for `path` by a client holding `role` may
/// proceed.
///
/// Rules, first match wins:
/// 1. `/login` is always reachable.
/// 2. `/admin…` requires the admin role.
/// 3. `/users…` requires any role.
/// 4. `/` never continues; it redirects to the role's landing page, or to
///    the login page without one.
/// 5. Everything else is unguarded.
///
/// Prefixes match textually, so `/administrator` is guarded like `/admin`.
pub fn gate(path: &str, role: Option<UserRole>) -> GateDecision {
    if path == LOGIN_PATH {
        return GateDecision::Continue;
    }

    if path.starts_with(ADMIN_PATH) {
        return match role {
            Some(UserRole::Admin) => GateDecision::Continue,
            _ => GateDecision::RedirectTo(LOGIN_PATH),
        };
    }

    if path.starts_with(USERS_PATH) {
        return match role {
            Some(_) => GateDecision::Continue,
            None => GateDecision::RedirectTo(LOGIN_PATH),
        };
    }

    if path == "/" {
        return GateDecision::RedirectTo(match role {
            Some(role) => role.home_path(),
            None => LOGIN_PATH,
        });
    }

    GateDecision::Continue
}
