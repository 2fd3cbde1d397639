//! Header navigation that depends on the cached role

use serde::Serialize;

use crate::identity::CachedIdentity;
use crate::routes::{
    ADMIN_ROUTE, CONTACT_ROUTE, FORMS_ROUTE, HOME_ROUTE, IMPACT_ROUTE, LANDING_ROUTE,
    LOGIN_ROUTE, PROFILE_ROUTE, REGISTER_ROUTE,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NavLink {
    pub label: &'static str,
    pub href: &'static str,
}

const fn link(label: &'static str, href: &'static str) -> NavLink {
    NavLink { label, href }
}

/// Links rendered in the shared header
///
/// The cached identity is only a display hint; the routes it exposes are
/// still checked by the edge gatekeeper and the guard.
pub fn navigation(identity: Option<&CachedIdentity>) -> Vec<NavLink> {
    let mut links = vec![
        link("Home", HOME_ROUTE),
        link("Forms", FORMS_ROUTE),
        link("Impact", IMPACT_ROUTE),
        link("Contact", CONTACT_ROUTE),
    ];

    match identity {
        Some(identity) => {
            if identity.role.is_admin() {
                links.push(link("Admin", ADMIN_ROUTE));
            }
            links.push(link("Dashboard", LANDING_ROUTE));
            links.push(link("Profile", PROFILE_ROUTE));
            links.push(link("Log out", HOME_ROUTE));
        }
        None => {
            links.push(link("Log in", LOGIN_ROUTE));
            links.push(link("Register", REGISTER_ROUTE));
        }
    }
    links
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Role;

    fn cached(role: Role) -> CachedIdentity {
        CachedIdentity {
            id: uuid::Uuid::new_v4(),
            name: "Asha".into(),
            email: "asha@example.org".into(),
            role,
        }
    }

    fn hrefs(links: &[NavLink]) -> Vec<&'static str> {
        links.iter().map(|l| l.href).collect()
    }

    #[test]
    fn test_anonymous_links() {
        let links = navigation(None);
        assert!(hrefs(&links).contains(&LOGIN_ROUTE));
        assert!(!hrefs(&links).contains(&ADMIN_ROUTE));
    }

    #[test]
    fn test_admin_link_only_for_admins() {
        assert!(!hrefs(&navigation(Some(&cached(Role::User)))).contains(&ADMIN_ROUTE));
        assert!(hrefs(&navigation(Some(&cached(Role::Admin)))).contains(&ADMIN_ROUTE));
    }
}
