//! Collection-addressed row endpoints

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use sahayata_core::Row;
use serde::Serialize;
use tower_cookies::Cookies;

use super::session::current_caller;
use crate::email::Mailer;
use crate::error::ServerError;
use crate::policy;
use crate::state::AppState;
use crate::store::{Collection, RowStore, SessionStore, UserStore};

#[derive(Serialize)]
pub struct CountResponse {
    pub count: u64,
}

fn collection(name: &str) -> Result<Collection, ServerError> {
    Collection::from_str(name).ok_or_else(|| ServerError::UnknownCollection(name.to_string()))
}

/// POST /rest/v1/{collection}
pub async fn insert<U, S, R, M>(
    State(state): State<Arc<AppState<U, S, R, M>>>,
    cookies: Cookies,
    Path(name): Path<String>,
    Json(row): Json<Row>,
) -> Result<(StatusCode, Json<Row>), ServerError>
where
    U: UserStore,
    S: SessionStore,
    R: RowStore,
    M: Mailer,
{
    let collection = collection(&name)?;
    let caller = current_caller(state.as_ref(), &cookies)?;
    policy::can_insert(collection, caller.as_ref(), &row)?;

    let stored = state.row_store.insert(collection, row)?;
    tracing::info!(%collection, id = ?stored.get("id"), "Row inserted");
    Ok((StatusCode::CREATED, Json(stored)))
}

/// GET /rest/v1/{collection}?column=value
pub async fn select<U, S, R, M>(
    State(state): State<Arc<AppState<U, S, R, M>>>,
    cookies: Cookies,
    Path(name): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<Row>>, ServerError>
where
    U: UserStore,
    S: SessionStore,
    R: RowStore,
    M: Mailer,
{
    let collection = collection(&name)?;
    if params.len() > 1 {
        return Err(ServerError::BadRequest(
            "Only one filter column is supported".to_string(),
        ));
    }
    let filter = params.iter().next().map(|(c, v)| (c.as_str(), v.as_str()));

    let caller = current_caller(state.as_ref(), &cookies)?;
    let rows = state.row_store.select(collection, filter)?;
    Ok(Json(policy::visible_rows(collection, caller.as_ref(), rows)?))
}

/// GET /rest/v1/{collection}/{id}
pub async fn get_by_id<U, S, R, M>(
    State(state): State<Arc<AppState<U, S, R, M>>>,
    cookies: Cookies,
    Path((name, id)): Path<(String, String)>,
) -> Result<Json<Row>, ServerError>
where
    U: UserStore,
    S: SessionStore,
    R: RowStore,
    M: Mailer,
{
    let collection = collection(&name)?;
    let caller = current_caller(state.as_ref(), &cookies)?;
    policy::can_read(collection, caller.as_ref(), &id)?;

    state
        .row_store
        .get(collection, &id)?
        .map(Json)
        .ok_or(ServerError::RowNotFound)
}

/// PATCH /rest/v1/{collection}/{id}
pub async fn update<U, S, R, M>(
    State(state): State<Arc<AppState<U, S, R, M>>>,
    cookies: Cookies,
    Path((name, id)): Path<(String, String)>,
    Json(patch): Json<Row>,
) -> Result<Json<Row>, ServerError>
where
    U: UserStore,
    S: SessionStore,
    R: RowStore,
    M: Mailer,
{
    let collection = collection(&name)?;
    let caller = current_caller(state.as_ref(), &cookies)?;
    policy::can_update(collection, caller.as_ref(), &id, &patch)?;

    let updated = state
        .row_store
        .update(collection, &id, patch)?
        .ok_or(ServerError::RowNotFound)?;
    tracing::info!(%collection, id = %id, "Row updated");
    Ok(Json(updated))
}

/// GET /rest/v1/{collection}/count
pub async fn count<U, S, R, M>(
    State(state): State<Arc<AppState<U, S, R, M>>>,
    cookies: Cookies,
    Path(name): Path<String>,
) -> Result<Json<CountResponse>, ServerError>
where
    U: UserStore,
    S: SessionStore,
    R: RowStore,
    M: Mailer,
{
    let collection = collection(&name)?;
    let caller = current_caller(state.as_ref(), &cookies)?;
    policy::can_count(caller.as_ref())?;

    Ok(Json(CountResponse {
        count: state.row_store.count(collection)?,
    }))
}
