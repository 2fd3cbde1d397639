//! Validated domain-form submission

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use sahayata_core::{FormKind, FormValues, Row};
use serde::Serialize;

use crate::email::Mailer;
use crate::error::ServerError;
use crate::state::AppState;
use crate::store::{Collection, RowStore, SessionStore, UserStore};

#[derive(Serialize)]
pub struct SubmitResponse {
    pub success: bool,
    pub message: &'static str,
    pub row: Row,
}

/// POST /api/forms/{kind}
///
/// Runs the same field validation as the client before inserting, so a
/// submission that skips the form still gets per-field errors.
pub async fn submit<U, S, R, M>(
    State(state): State<Arc<AppState<U, S, R, M>>>,
    Path(slug): Path<String>,
    Json(values): Json<FormValues>,
) -> Result<(StatusCode, Json<SubmitResponse>), ServerError>
where
    U: UserStore,
    S: SessionStore,
    R: RowStore,
    M: Mailer,
{
    let kind = FormKind::from_slug(&slug)
        .ok_or_else(|| ServerError::UnknownCollection(slug.clone()))?;
    let spec = kind.spec();
    spec.validate(&values)?;

    let row = spec.to_row(&values, Utc::now());
    let stored = state.row_store.insert(Collection::Form(kind), row)?;

    tracing::info!(form = %kind, id = ?stored.get("id"), "Form submitted");
    Ok((
        StatusCode::CREATED,
        Json(SubmitResponse {
            success: true,
            message: spec.success_message,
            row: stored,
        }),
    ))
}
