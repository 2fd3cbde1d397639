//! Seams to the hosted backend
//!
//! The application never talks to storage directly. Authentication goes
//! through a [`SessionClient`] and every data read or write through a
//! [`RowClient`]; both are single request/response calls with no retry.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::error::Error;
use crate::forms::Row;
use crate::identity::{Profile, Session};

/// Collection holding one profile per user id
pub const PROFILES: &str = "profiles";

/// Session change notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn(Session),
    SignedOut,
}

impl AuthEvent {
    pub fn session(&self) -> Option<&Session> {
        match self {
            AuthEvent::SignedIn(session) => Some(session),
            AuthEvent::SignedOut => None,
        }
    }
}

/// Extra attributes sent with a sign-up request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

#[async_trait]
pub trait SessionClient: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, Error>;

    async fn sign_up(&self, request: &SignUpRequest) -> Result<Session, Error>;

    async fn sign_out(&self) -> Result<(), Error>;

    /// Current session, `None` when signed out
    async fn get_session(&self) -> Result<Option<Session>, Error>;

    /// Receive session changes until the receiver is dropped
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}

#[async_trait]
pub trait RowClient: Send + Sync {
    /// Insert one row and return it as stored
    async fn insert(&self, collection: &str, row: Row) -> Result<Row, Error>;

    async fn select_by_id(&self, collection: &str, id: &str) -> Result<Option<Row>, Error>;

    /// Rows whose `column` equals `value`; no filter when `column` is `None`
    async fn select(
        &self,
        collection: &str,
        filter: Option<(&str, &str)>,
    ) -> Result<Vec<Row>, Error>;

    async fn update(&self, collection: &str, id: &str, patch: Row) -> Result<Row, Error>;

    /// Exact row count
    async fn count(&self, collection: &str) -> Result<u64, Error>;
}

/// Fetch and decode the profile for a user id
pub async fn fetch_profile<R: RowClient + ?Sized>(
    rows: &R,
    user_id: &uuid::Uuid,
) -> Result<Option<Profile>, Error> {
    match rows.select_by_id(PROFILES, &user_id.to_string()).await? {
        Some(row) => Ok(Some(serde_json::from_value(serde_json::Value::Object(row))?)),
        None => Ok(None),
    }
}

/// Row count with a fallback to counting selected rows when the exact
/// count is unavailable
pub async fn count_rows<R: RowClient + ?Sized>(rows: &R, collection: &str) -> Result<u64, Error> {
    match rows.count(collection).await {
        Ok(count) => Ok(count),
        Err(e) => {
            tracing::warn!(collection, error = %e, "Exact count unavailable, counting rows");
            let selected = rows.select(collection, None).await?;
            Ok(selected.len() as u64)
        }
    }
}
