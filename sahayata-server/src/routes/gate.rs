//! Edge gatekeeper for protected page routes
//!
//! Runs before every request. Paths the route policy marks as public pass
//! straight through; for the rest the role comes from the server-side
//! session and profile, never from a client-supplied cookie value.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use sahayata_core::routes::{decide, normalize_path, required_access, Access, Decision};
use tower_cookies::Cookies;

use super::session::current_caller;
use crate::email::Mailer;
use crate::state::AppState;
use crate::store::{RowStore, SessionStore, UserStore};

pub async fn gatekeeper<U, S, R, M>(
    State(state): State<Arc<AppState<U, S, R, M>>>,
    cookies: Cookies,
    request: Request,
    next: Next,
) -> Response
where
    U: UserStore + 'static,
    S: SessionStore + 'static,
    R: RowStore + 'static,
    M: Mailer + 'static,
{
    // Decide on the path the file server will resolve, not the raw one
    let Some(path) = normalize_path(request.uri().path()) else {
        tracing::debug!(raw = %request.uri().path(), "Rejecting unroutable path");
        return (StatusCode::BAD_REQUEST, "Invalid path").into_response();
    };
    if required_access(&path) == Access::Public {
        return next.run(request).await;
    }

    let role = match current_caller(state.as_ref(), &cookies) {
        Ok(caller) => caller.map(|c| c.role),
        Err(e) => {
            tracing::error!(path = %path, error = %e, "Caller lookup failed, treating as signed out");
            None
        }
    };

    match decide(&path, role) {
        Decision::Allow => next.run(request).await,
        Decision::Redirect(target) => {
            tracing::debug!(path = %path, target, "Redirecting protected route");
            Redirect::to(target).into_response()
        }
    }
}
