//! Error types for the e-Sahayata client logic

use thiserror::Error;

use crate::upload::UploadError;
use crate::validate::ValidationErrors;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// A remote call failed; the message is shown to the user as-is
    #[error("{0}")]
    Remote(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Local storage error: {0}")]
    Storage(String),

    #[error("Wizard needs at least one step")]
    EmptyWizard,

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("Unknown form: {0}")]
    UnknownForm(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<ValidationErrors> for Error {
    fn from(errors: ValidationErrors) -> Self {
        Error::Validation(errors)
    }
}

impl Error {
    /// Message suitable for a page-level error banner
    pub fn banner(&self) -> String {
        match self {
            Error::Remote(msg) => msg.clone(),
            Error::Validation(_) => "Please correct the highlighted fields.".to_string(),
            other => other.to_string(),
        }
    }
}
