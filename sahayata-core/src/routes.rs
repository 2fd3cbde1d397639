//! Route surface and the access each route requires
//!
//! The same table drives the server's edge gatekeeper and the targets the
//! render-time guard redirects to.

use percent_encoding::percent_decode_str;

use crate::forms::FormKind;
use crate::identity::Role;

pub const HOME_ROUTE: &str = "/";
pub const LOGIN_ROUTE: &str = "/auth/login";
pub const REGISTER_ROUTE: &str = "/auth/register";
/// Default landing route for signed-in users
pub const LANDING_ROUTE: &str = "/dashboard";
pub const PROFILE_ROUTE: &str = "/dashboard/profile";
pub const FORMS_ROUTE: &str = "/forms";
pub const IMPACT_ROUTE: &str = "/impact";
pub const CONTACT_ROUTE: &str = "/contact";
pub const ADMIN_ROUTE: &str = "/admin/dashboard";

/// Access level a path requires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Authenticated,
    Admin,
}

/// Outcome of checking a request against the route table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Redirect(&'static str),
}

/// `path` is `prefix` itself or lies below it
fn under(path: &str, prefix: &str) -> bool {
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Canonical form of a raw request path, as the file server will see it
///
/// Each segment is percent-decoded; empty and `.` segments are dropped.
/// Returns `None` for paths that cannot be compared against the route
/// table: undecodable bytes, `..` segments, or separators hidden inside an
/// encoded segment.
pub fn normalize_path(raw: &str) -> Option<String> {
    let mut segments = Vec::new();
    for segment in raw.split('/') {
        let decoded = percent_decode_str(segment).decode_utf8().ok()?;
        match &*decoded {
            "" | "." => {}
            ".." => return None,
            s if s.contains('/') || s.contains('\\') || s.contains('\0') => return None,
            s => segments.push(s.to_string()),
        }
    }
    Some(format!("/{}", segments.join("/")))
}

/// Access required by a request path
///
/// The six data-collection forms are public so anyone can submit; the rest
/// of `/forms` (response lists, builder, per-form detail) is admin-only.
pub fn required_access(path: &str) -> Access {
    let path = match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    };

    if under(path, "/admin") || under(path, IMPACT_ROUTE) {
        return Access::Admin;
    }
    if let Some(rest) = path.strip_prefix("/forms/") {
        if FormKind::from_slug(rest).is_some() {
            return Access::Public;
        }
    }
    if under(path, FORMS_ROUTE) {
        return Access::Admin;
    }
    if under(path, LANDING_ROUTE) {
        return Access::Authenticated;
    }
    Access::Public
}

/// Decide a request given the caller's role (`None` when signed out)
pub fn decide(path: &str, role: Option<Role>) -> Decision {
    match (required_access(path), role) {
        (Access::Public, _) => Decision::Allow,
        (_, None) => Decision::Redirect(LOGIN_ROUTE),
        (Access::Authenticated, Some(_)) => Decision::Allow,
        (Access::Admin, Some(Role::Admin)) => Decision::Allow,
        (Access::Admin, Some(Role::User)) => Decision::Redirect(LANDING_ROUTE),
    }
}
