//! Object storage for uploaded documents
//!
//! Blobs live on disk under `<root>/<bucket>/<path>` and are served
//! read-only at `/storage/v1/object/public/<bucket>/<path>`.

use std::path::{Component, Path, PathBuf};

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::error::ServerError;

/// Bucket holding beneficiary documents
pub const DOCUMENTS_BUCKET: &str = "beneficiary-documents";

/// Route prefix the object root is served under
pub const PUBLIC_PREFIX: &str = "/storage/v1/object/public";

/// Everything but RFC 3986 unreserved characters is escaped in a segment
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

pub struct ObjectStore {
    root: PathBuf,
    base_url: String,
}

impl ObjectStore {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Store a blob, replacing any existing object at the same path
    pub async fn put(&self, bucket: &str, path: &str, bytes: &[u8]) -> Result<(), ServerError> {
        let target = self.root.join(checked_relative(bucket)?).join(checked_relative(path)?);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ServerError::Internal(format!("Upload failed: {}", e)))?;
        }
        tokio::fs::write(&target, bytes)
            .await
            .map_err(|e| ServerError::Internal(format!("Upload failed: {}", e)))?;

        tracing::info!(bucket, path, size = bytes.len(), "Stored object");
        Ok(())
    }

    /// Public URL of an object; each path segment is percent-encoded
    pub fn public_url(&self, bucket: &str, path: &str) -> String {
        let mut url = format!("{}{}", self.base_url, PUBLIC_PREFIX);
        for segment in std::iter::once(bucket).chain(path.split('/')) {
            url.push('/');
            url.extend(utf8_percent_encode(segment, SEGMENT));
        }
        url
    }
}

/// Only plain relative paths may address objects
fn checked_relative(path: &str) -> Result<&Path, ServerError> {
    let candidate = Path::new(path);
    let plain = !path.is_empty()
        && candidate
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
    if plain {
        Ok(candidate)
    } else {
        Err(ServerError::BadRequest(format!("Invalid object path: {}", path)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_and_public_url() {
        let dir = tempfile::tempdir().unwrap();
        let store = ObjectStore::new(dir.path(), "http://localhost:3000/");

        store
            .put(DOCUMENTS_BUCKET, "b1/aadhar.pdf", b"%PDF-1.4")
            .await
            .unwrap();

        let stored = std::fs::read(dir.path().join(DOCUMENTS_BUCKET).join("b1/aadhar.pdf")).unwrap();
        assert_eq!(stored, b"%PDF-1.4");
        assert_eq!(
            store.public_url(DOCUMENTS_BUCKET, "b1/aadhar.pdf"),
            "http://localhost:3000/storage/v1/object/public/beneficiary-documents/b1/aadhar.pdf"
        );
    }

    #[test]
    fn test_public_url_encodes_segments() {
        let store = ObjectStore::new("unused", "http://localhost:3000");
        assert_eq!(
            store.public_url(DOCUMENTS_BUCKET, "b1/scan #1 (final).pdf"),
            "http://localhost:3000/storage/v1/object/public/beneficiary-documents/b1/scan%20%231%20%28final%29.pdf"
        );
        assert_eq!(
            store.public_url(DOCUMENTS_BUCKET, "b1/आधार.pdf"),
            "http://localhost:3000/storage/v1/object/public/beneficiary-documents/b1/%E0%A4%86%E0%A4%A7%E0%A4%BE%E0%A4%B0.pdf"
        );
    }

    #[tokio::test]
    async fn test_rejects_escaping_paths() {
        let dir = tempfile::tempdir().unwrap();
        let store = ObjectStore::new(dir.path(), "http://localhost:3000");

        for path in ["../secret", "/etc/passwd", "", "a/../../b"] {
            assert!(
                store.put(DOCUMENTS_BUCKET, path, b"x").await.is_err(),
                "accepted {path:?}"
            );
        }
    }
}
