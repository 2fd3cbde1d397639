//! Data models for server storage

use std::fmt;

use chrono::{DateTime, Utc};
use sahayata_core::client::PROFILES;
use sahayata_core::FormKind;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A sign-in account
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    /// Lowercased e-mail address
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Opaque session token carried in the session cookie
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

/// A signed-in session
#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    pub user_id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Public part of the session as seen by clients
    pub fn to_client(&self) -> sahayata_core::Session {
        sahayata_core::Session {
            user_id: self.user_id,
            email: self.email.clone(),
        }
    }
}

/// Named collection in the row store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Form(FormKind),
    Profiles,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Form(kind) => kind.spec().collection,
            Collection::Profiles => PROFILES,
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        if s == PROFILES {
            return Some(Collection::Profiles);
        }
        FormKind::ALL
            .into_iter()
            .find(|kind| kind.spec().collection == s)
            .map(Collection::Form)
    }

    /// Whether rows are submissions of one of the domain forms
    pub fn is_form(&self) -> bool {
        matches!(self, Collection::Form(_))
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
