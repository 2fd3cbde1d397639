//! Session, profile and cached identity records

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role claim carried by a profile
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Role::User),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authenticated identity issued by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: Uuid,
    pub email: String,
}

/// Per-user record holding role and display attributes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Profile {
    /// Profile created lazily for a user that has none yet
    pub fn for_session(session: &Session) -> Self {
        Self {
            id: session.user_id,
            full_name: display_name_from_email(&session.email),
            email: session.email.clone(),
            phone: None,
            role: Role::User,
            created_at: Utc::now(),
        }
    }
}

/// Local part of an e-mail address, used when no name is known
pub fn display_name_from_email(email: &str) -> String {
    match email.split('@').next() {
        Some(local) if !local.is_empty() => local.to_string(),
        _ => "User".to_string(),
    }
}

/// Denormalized copy of the signed-in user kept in local state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedIdentity {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl CachedIdentity {
    pub fn from_profile(profile: &Profile) -> Self {
        Self {
            id: profile.id,
            name: profile.full_name.clone(),
            email: profile.email.clone(),
            role: profile.role,
        }
    }
}
