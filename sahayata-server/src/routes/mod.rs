//! HTTP routes for the form service

mod auth;
mod forms;
mod gate;
mod rest;
pub mod session;
mod storage;

use std::path::Path;
use std::sync::Arc;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_cookies::CookieManagerLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub use session::SESSION_COOKIE;
pub use storage::{decode_base64_payload, DOCUMENT_TYPES};

use crate::email::Mailer;
use crate::objects::PUBLIC_PREFIX;
use crate::state::AppState;
use crate::store::{RowStore, SessionStore, UserStore};

/// Create the router with all routes
pub fn create_router<U, S, R, M>(state: Arc<AppState<U, S, R, M>>) -> Router
where
    U: UserStore + 'static,
    S: SessionStore + 'static,
    R: RowStore + 'static,
    M: Mailer + 'static,
{
    create_router_with_static_path(state, "static")
}

/// Create the router with a custom static page directory
pub fn create_router_with_static_path<U, S, R, M>(
    state: Arc<AppState<U, S, R, M>>,
    static_path: impl AsRef<Path>,
) -> Router
where
    U: UserStore + 'static,
    S: SessionStore + 'static,
    R: RowStore + 'static,
    M: Mailer + 'static,
{
    let objects_root = state.objects.root().to_path_buf();

    Router::new()
        .route("/auth/v1/signup", post(auth::signup))
        .route("/auth/v1/token", post(auth::token))
        .route("/auth/v1/logout", post(auth::logout))
        .route("/auth/v1/session", get(auth::get_session))
        .route("/rest/v1/:collection", post(rest::insert).get(rest::select))
        .route("/rest/v1/:collection/count", get(rest::count))
        .route(
            "/rest/v1/:collection/:id",
            get(rest::get_by_id).patch(rest::update),
        )
        .route("/api/forms/:kind", post(forms::submit))
        .route("/storage/v1/documents", post(storage::upload_document))
        .nest_service(PUBLIC_PREFIX, ServeDir::new(objects_root))
        // Pages; protected prefixes are filtered by the gatekeeper below
        .fallback_service(ServeDir::new(static_path.as_ref()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CookieManagerLayer::new())
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    gate::gatekeeper::<U, S, R, M>,
                )),
        )
        .with_state(state)
}
