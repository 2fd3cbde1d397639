//! One in-progress domain form: values, draft handling and submission

use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::Utc;

use crate::client::RowClient;
use crate::draft::{AutoSave, SharedValues};
use crate::error::Error;
use crate::forms::{FieldValue, FormKind, FormSpec, FormValues, Row};
use crate::local::LocalState;

/// Successful submission
#[derive(Debug, Clone)]
pub struct Submitted {
    pub message: &'static str,
    /// Row as returned by the row store
    pub row: Row,
}

pub struct FormSession {
    spec: &'static FormSpec,
    local: LocalState,
    values: SharedValues,
}

impl FormSession {
    pub fn new(kind: FormKind, local: LocalState) -> Self {
        Self {
            spec: kind.spec(),
            local,
            values: Arc::new(RwLock::new(FormValues::new())),
        }
    }

    /// Open a form the way a page mount does: prefill from the cached
    /// identity, then let any stored draft take precedence
    pub fn open(kind: FormKind, local: LocalState) -> Self {
        let session = Self::new(kind, local);
        session.prefill_from_identity();
        if let Err(e) = session.restore_draft() {
            tracing::warn!(form = %kind, error = %e, "Could not load draft");
        }
        session
    }

    pub fn spec(&self) -> &'static FormSpec {
        self.spec
    }

    pub fn kind(&self) -> FormKind {
        self.spec.kind
    }

    pub fn values(&self) -> FormValues {
        match self.values.read() {
            Ok(values) => values.clone(),
            Err(poisoned) => {
                tracing::error!(form = %self.kind(), "Form values lock poisoned, reading last state");
                poisoned.into_inner().clone()
            }
        }
    }

    pub fn set(&self, field: &str, value: impl Into<FieldValue>) {
        match self.values.write() {
            Ok(mut values) => values.set(field, value),
            Err(poisoned) => {
                tracing::error!(form = %self.kind(), field, "Form values lock poisoned, writing anyway");
                poisoned.into_inner().set(field, value);
            }
        }
    }

    /// Fill name and e-mail from the cached identity when present
    ///
    /// Returns whether anything was filled. A missing or unreadable cache
    /// is not an error.
    pub fn prefill_from_identity(&self) -> bool {
        let identity = match self.local.identity() {
            Ok(Some(identity)) => identity,
            Ok(None) => return false,
            Err(e) => {
                tracing::debug!(error = %e, "Identity cache unavailable for prefill");
                return false;
            }
        };

        if let Some(name_field) = self.spec.name_field {
            self.set(name_field, identity.name.as_str());
        }
        if self.spec.field("email").is_some() {
            self.set("email", identity.email.as_str());
        }
        true
    }

    /// Replace the current values with the stored draft, if one exists
    pub fn restore_draft(&self) -> Result<bool, Error> {
        let Some(draft) = self.local.draft(self.kind())? else {
            return Ok(false);
        };
        let restored = self.spec.decode_draft(&draft);
        let mut values = self
            .values
            .write()
            .map_err(|e| Error::Storage(e.to_string()))?;
        for (field, value) in restored.iter() {
            values.set(field, value.clone());
        }
        Ok(true)
    }

    /// Explicit "save draft" action
    pub fn save_draft(&self) -> Result<(), Error> {
        self.local.save_draft(self.kind(), &self.values())
    }

    pub fn auto_save(&self, period: Duration) -> AutoSave {
        AutoSave::spawn(self.local.clone(), self.kind(), self.values.clone(), period)
    }

    /// Clear the values for another submission
    pub fn reset(&self) {
        let mut values = self.values.write().unwrap_or_else(|poisoned| {
            tracing::error!(form = %self.kind(), "Form values lock poisoned, resetting anyway");
            poisoned.into_inner()
        });
        *values = FormValues::new();
    }

    /// Validate and insert the form as one row
    ///
    /// Validation failures are returned per field and nothing is sent. A
    /// failed insert keeps the draft and is returned as-is; there is no
    /// retry. The draft is removed only after the insert succeeds.
    pub async fn submit<R: RowClient + ?Sized>(&self, rows: &R) -> Result<Submitted, Error> {
        let values = self.values();
        self.spec.validate(&values)?;

        let row = self.spec.to_row(&values, Utc::now());
        let stored = match rows.insert(self.spec.collection, row).await {
            Ok(stored) => stored,
            Err(e) => {
                tracing::error!(form = %self.kind(), error = %e, "Form submission failed");
                return Err(e);
            }
        };

        if let Err(e) = self.local.clear_draft(self.kind()) {
            tracing::warn!(form = %self.kind(), error = %e, "Could not remove draft after submission");
        }
        tracing::info!(form = %self.kind(), collection = self.spec.collection, "Form submitted");

        Ok(Submitted {
            message: self.spec.success_message,
            row: stored,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poison(session: &FormSession) {
        let values = session.values.clone();
        let result = std::thread::spawn(move || {
            let _guard = values.write().unwrap();
            panic!("panic while editing");
        })
        .join();
        assert!(result.is_err());
        assert!(session.values.is_poisoned());
    }

    #[test]
    fn test_values_survive_a_poisoned_lock() {
        let session = FormSession::new(FormKind::Feedback, LocalState::in_memory());
        session.set("message", "Before the panic");
        poison(&session);

        assert_eq!(session.values().text("message"), "Before the panic");

        session.set("feedbackType", "general");
        assert_eq!(session.values().text("feedbackType"), "general");

        session.reset();
        assert!(!session.values().is_dirty());
    }
}
