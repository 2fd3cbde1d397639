//! Session cookie and caller resolution

use sahayata_core::Role;
use serde_json::Value;
use tower_cookies::{Cookie, Cookies};

use crate::email::Mailer;
use crate::error::ServerError;
use crate::state::AppState;
use crate::store::{Collection, RowStore, Session, SessionId, SessionStore, UserStore};

pub const SESSION_COOKIE: &str = "sahayata_session";

/// The signed-in user behind a request
#[derive(Debug, Clone)]
pub struct Caller {
    pub session: Session,
    /// Role from the caller's profile; `user` when there is no profile
    pub role: Role,
}

impl Caller {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Whether `id` is the caller's own user id
    pub fn owns(&self, id: &str) -> bool {
        self.session.user_id.to_string() == id
    }
}

/// Helper to get current session from cookies
pub fn get_session_from_cookies<S: SessionStore + ?Sized>(
    cookies: &Cookies,
    session_store: &S,
) -> Result<Option<Session>, ServerError> {
    match cookies.get(SESSION_COOKIE) {
        Some(c) => session_store.get(&SessionId(c.value().to_string())),
        None => Ok(None),
    }
}

/// Resolve the caller and their role from the server-side session
pub fn current_caller<U, S, R, M>(
    state: &AppState<U, S, R, M>,
    cookies: &Cookies,
) -> Result<Option<Caller>, ServerError>
where
    U: UserStore,
    S: SessionStore,
    R: RowStore,
    M: Mailer,
{
    let Some(session) = get_session_from_cookies(cookies, state.session_store.as_ref())? else {
        return Ok(None);
    };

    let role = state
        .row_store
        .get(Collection::Profiles, &session.user_id.to_string())?
        .and_then(|profile| {
            profile
                .get("role")
                .and_then(Value::as_str)
                .and_then(Role::from_str)
        })
        .unwrap_or_default();

    Ok(Some(Caller { session, role }))
}

/// Helper to set session cookie
pub fn set_session_cookie(cookies: &Cookies, session_id: &str) {
    let cookie = Cookie::build((SESSION_COOKIE, session_id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(tower_cookies::cookie::SameSite::Lax)
        .build();
    cookies.add(cookie);
}

/// Helper to clear session cookie
pub fn clear_session_cookie(cookies: &Cookies) {
    let cookie = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .max_age(tower_cookies::cookie::time::Duration::ZERO)
        .build();
    cookies.add(cookie);
}
