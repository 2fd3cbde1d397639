//! Beneficiary document upload

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sahayata_core::{FormKind, Row};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::email::Mailer;
use crate::error::ServerError;
use crate::objects::DOCUMENTS_BUCKET;
use crate::state::AppState;
use crate::store::{Collection, RowStore, SessionStore, UserStore};

/// Document kinds a beneficiary can attach
pub const DOCUMENT_TYPES: &[&str] = &["aadhar", "income"];

#[derive(Debug, Deserialize)]
pub struct UploadRequest {
    /// Base64 content, optionally as a `data:` URL
    pub file_base64: String,
    pub file_name: String,
    #[serde(default)]
    pub content_type: Option<String>,
    pub beneficiary_id: String,
    pub document_type: String,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
}

/// Strip a `data:<mime>;base64,` prefix and decode
pub fn decode_base64_payload(payload: &str) -> Result<Vec<u8>, ServerError> {
    let data = match payload.split_once("base64,") {
        Some((_, data)) => data,
        None => payload,
    };
    STANDARD
        .decode(data.trim())
        .map_err(|e| ServerError::BadRequest(format!("Invalid base64 content: {}", e)))
}

/// POST /storage/v1/documents
///
/// Stores the blob under the beneficiary's folder (replacing an earlier
/// upload with the same name), then records its public URL in
/// `<document_type>_document_url` on the beneficiary row.
pub async fn upload_document<U, S, R, M>(
    State(state): State<Arc<AppState<U, S, R, M>>>,
    Json(req): Json<UploadRequest>,
) -> Result<Json<UploadResponse>, ServerError>
where
    U: UserStore,
    S: SessionStore,
    R: RowStore,
    M: Mailer,
{
    if !DOCUMENT_TYPES.contains(&req.document_type.as_str()) {
        return Err(ServerError::BadRequest(format!(
            "Unknown document type: {}",
            req.document_type
        )));
    }

    let beneficiaries = Collection::Form(FormKind::Beneficiary);
    if state.row_store.get(beneficiaries, &req.beneficiary_id)?.is_none() {
        return Err(ServerError::RowNotFound);
    }

    let bytes = decode_base64_payload(&req.file_base64)?;
    let path = format!("{}/{}", req.beneficiary_id, req.file_name);
    state.objects.put(DOCUMENTS_BUCKET, &path, &bytes).await?;
    let url = state.objects.public_url(DOCUMENTS_BUCKET, &path);

    let mut patch = Row::new();
    patch.insert(
        format!("{}_document_url", req.document_type),
        Value::String(url.clone()),
    );
    state
        .row_store
        .update(beneficiaries, &req.beneficiary_id, patch)?
        .ok_or(ServerError::RowNotFound)?;

    tracing::info!(
        beneficiary_id = %req.beneficiary_id,
        document_type = %req.document_type,
        content_type = req.content_type.as_deref().unwrap_or("unknown"),
        size = bytes.len(),
        "Document uploaded"
    );
    Ok(Json(UploadResponse { url }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_plain_and_data_url() {
        assert_eq!(decode_base64_payload("aGVsbG8=").unwrap(), b"hello");
        assert_eq!(
            decode_base64_payload("data:application/pdf;base64,aGVsbG8=").unwrap(),
            b"hello"
        );
        assert!(decode_base64_payload("not base64!").is_err());
    }
}
