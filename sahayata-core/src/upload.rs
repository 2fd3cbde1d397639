//! File picker with local validation and simulated upload progress
//!
//! The widget only tracks state. Sending bytes anywhere is a separate,
//! explicit server action; completing an "upload" here just hands the
//! accepted file to the completion callback.

use std::time::Duration;

use thiserror::Error;

/// Interval between simulated progress ticks
pub const DEFAULT_TICK: Duration = Duration::from_millis(300);

const PROGRESS_STEP: u8 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    #[error("File size exceeds {max_mb}MB limit")]
    TooLarge { max_mb: u64 },

    #[error("File type not supported. Please upload {accept} files")]
    UnsupportedType { accept: String },
}

/// A picked or dropped file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMeta {
    pub name: String,
    /// Size in bytes
    pub size: u64,
    pub mime: String,
}

impl FileMeta {
    pub fn new(name: impl Into<String>, size: u64, mime: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size,
            mime: mime.into(),
        }
    }

    /// Lowercased extension including the dot, if the name has one
    fn extension(&self) -> Option<String> {
        self.name
            .rsplit_once('.')
            .map(|(_, ext)| format!(".{}", ext.to_lowercase()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadConfig {
    accept: String,
    accepted: Vec<String>,
    max_size_mb: u64,
}

impl UploadConfig {
    /// `accept` is a comma list of `.ext` suffixes and MIME prefixes
    /// (`image/*` matches any `image/` type)
    pub fn new(accept: &str, max_size_mb: u64) -> Self {
        Self {
            accept: accept.to_string(),
            accepted: accept
                .split(',')
                .map(|t| t.trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
            max_size_mb,
        }
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_size_mb * 1024 * 1024
    }

    /// Size is checked before type
    pub fn check(&self, file: &FileMeta) -> Result<(), UploadError> {
        if file.size > self.max_bytes() {
            return Err(UploadError::TooLarge {
                max_mb: self.max_size_mb,
            });
        }

        let extension = file.extension();
        let mime = file.mime.to_lowercase();
        let accepted = self.accepted.iter().any(|t| {
            if t.starts_with('.') {
                extension.as_deref() == Some(t.as_str())
            } else {
                !mime.is_empty() && mime.contains(&t.replace('*', ""))
            }
        });
        if !accepted {
            return Err(UploadError::UnsupportedType {
                accept: self.accept.clone(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadPhase {
    Empty,
    Selected,
    Uploading(u8),
    Uploaded,
}

type Completion = Box<dyn FnMut(&FileMeta) + Send>;

pub struct UploadWidget {
    config: UploadConfig,
    file: Option<FileMeta>,
    error: Option<String>,
    phase: UploadPhase,
    on_complete: Completion,
}

impl UploadWidget {
    pub fn new(config: UploadConfig, on_complete: impl FnMut(&FileMeta) + Send + 'static) -> Self {
        Self {
            config,
            file: None,
            error: None,
            phase: UploadPhase::Empty,
            on_complete: Box::new(on_complete),
        }
    }

    pub fn phase(&self) -> UploadPhase {
        self.phase
    }

    pub fn file(&self) -> Option<&FileMeta> {
        self.file.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn progress(&self) -> u8 {
        match self.phase {
            UploadPhase::Uploading(p) => p,
            UploadPhase::Uploaded => 100,
            _ => 0,
        }
    }

    /// Validate a picked or dropped file; a rejected file leaves the
    /// current selection untouched
    pub fn select(&mut self, file: FileMeta) -> Result<(), UploadError> {
        self.error = None;
        if let Err(e) = self.config.check(&file) {
            tracing::debug!(file = %file.name, error = %e, "Rejected file");
            self.error = Some(e.to_string());
            return Err(e);
        }
        self.file = Some(file);
        self.phase = UploadPhase::Selected;
        Ok(())
    }

    /// Begin the upload; only a selected, not yet uploaded file can start
    pub fn start_upload(&mut self) -> bool {
        if self.phase != UploadPhase::Selected || self.file.is_none() {
            return false;
        }
        self.phase = UploadPhase::Uploading(0);
        true
    }

    /// Advance the simulated progress by one step
    ///
    /// The tick after progress reaches 100 completes the upload and fires
    /// the completion callback.
    pub fn tick(&mut self) -> UploadPhase {
        if let UploadPhase::Uploading(progress) = self.phase {
            if progress >= 100 {
                self.phase = UploadPhase::Uploaded;
                if let Some(file) = &self.file {
                    tracing::info!(file = %file.name, size = file.size, "File uploaded");
                    (self.on_complete)(file);
                }
            } else {
                self.phase = UploadPhase::Uploading((progress + PROGRESS_STEP).min(100));
            }
        }
        self.phase
    }

    /// Start the upload and drive it to completion on a timer
    ///
    /// Dropping the returned future stops the timer; the widget keeps the
    /// progress reached so far.
    pub async fn run(&mut self, tick: Duration) -> bool {
        if !self.start_upload() {
            return false;
        }
        let mut interval = tokio::time::interval(tick);
        interval.tick().await;
        loop {
            interval.tick().await;
            if self.tick() == UploadPhase::Uploaded {
                return true;
            }
        }
    }

    /// Clear the selection and every piece of transient state
    pub fn remove(&mut self) {
        self.file = None;
        self.error = None;
        self.phase = UploadPhase::Empty;
    }
}
