//! Storage abstractions for the server

pub mod memory;
pub mod models;
pub mod sqlite;

use std::sync::Arc;

pub use memory::{InMemoryRowStore, InMemorySessionStore, InMemoryUserStore};
pub use models::*;
pub use sqlite::SqliteStore;

use chrono::Utc;
use sahayata_core::Row;
use serde_json::Value;
use uuid::Uuid;

use crate::error::ServerError;

/// Result type for store operations
pub type StoreResult<T> = Result<T, ServerError>;

/// Trait for account storage
pub trait UserStore: Send + Sync {
    /// Create an account; fails if the e-mail is taken
    fn create_user(&self, email: &str, password_hash: &str) -> StoreResult<User>;

    /// Get an account by ID
    fn get_user(&self, user_id: Uuid) -> StoreResult<Option<User>>;

    /// Get an account by e-mail address (case-insensitive)
    fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
}

/// Trait for session storage
pub trait SessionStore: Send + Sync {
    /// Create a new session for a user
    fn create(&self, user: &User) -> StoreResult<Session>;

    /// Get a session by ID
    fn get(&self, session_id: &SessionId) -> StoreResult<Option<Session>>;

    /// Delete a session
    fn delete(&self, session_id: &SessionId) -> StoreResult<()>;
}

/// Trait for collection-addressed JSON rows
///
/// Every row has a string `id`. Access control is applied by the routes,
/// not by the store.
pub trait RowStore: Send + Sync {
    /// Insert a row and return it as stored
    fn insert(&self, collection: Collection, row: Row) -> StoreResult<Row>;

    fn get(&self, collection: Collection, id: &str) -> StoreResult<Option<Row>>;

    /// Rows in insertion order, optionally filtered on one column
    fn select(&self, collection: Collection, filter: Option<(&str, &str)>) -> StoreResult<Vec<Row>>;

    /// Merge `patch` into the row; `None` when no such row exists
    fn update(&self, collection: Collection, id: &str, patch: Row) -> StoreResult<Option<Row>>;

    fn count(&self, collection: Collection) -> StoreResult<u64>;
}

impl<T: UserStore + ?Sized> UserStore for Arc<T> {
    fn create_user(&self, email: &str, password_hash: &str) -> StoreResult<User> {
        (**self).create_user(email, password_hash)
    }

    fn get_user(&self, user_id: Uuid) -> StoreResult<Option<User>> {
        (**self).get_user(user_id)
    }

    fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        (**self).get_user_by_email(email)
    }
}

impl<T: SessionStore + ?Sized> SessionStore for Arc<T> {
    fn create(&self, user: &User) -> StoreResult<Session> {
        (**self).create(user)
    }

    fn get(&self, session_id: &SessionId) -> StoreResult<Option<Session>> {
        (**self).get(session_id)
    }

    fn delete(&self, session_id: &SessionId) -> StoreResult<()> {
        (**self).delete(session_id)
    }
}

impl<T: RowStore + ?Sized> RowStore for Arc<T> {
    fn insert(&self, collection: Collection, row: Row) -> StoreResult<Row> {
        (**self).insert(collection, row)
    }

    fn get(&self, collection: Collection, id: &str) -> StoreResult<Option<Row>> {
        (**self).get(collection, id)
    }

    fn select(&self, collection: Collection, filter: Option<(&str, &str)>) -> StoreResult<Vec<Row>> {
        (**self).select(collection, filter)
    }

    fn update(&self, collection: Collection, id: &str, patch: Row) -> StoreResult<Option<Row>> {
        (**self).update(collection, id, patch)
    }

    fn count(&self, collection: Collection) -> StoreResult<u64> {
        (**self).count(collection)
    }
}

/// Fill in `id` and `created_at` when the caller did not supply them and
/// return the row id
pub(crate) fn prepare_insert(row: &mut Row) -> StoreResult<String> {
    let id = match row.get("id") {
        None | Some(Value::Null) => Uuid::new_v4().to_string(),
        Some(Value::String(id)) if !id.is_empty() => id.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(_) => return Err(ServerError::BadRequest("Invalid row id".to_string())),
    };
    row.insert("id".to_string(), Value::String(id.clone()));
    row.entry("created_at".to_string())
        .or_insert_with(|| Value::String(Utc::now().to_rfc3339()));
    Ok(id)
}

/// Apply a patch; the row id never changes
pub(crate) fn apply_patch(row: &mut Row, patch: Row) {
    for (column, value) in patch {
        if column != "id" {
            row.insert(column, value);
        }
    }
}

/// Equality filter comparing the column's text form with `value`
pub(crate) fn matches_filter(row: &Row, filter: Option<(&str, &str)>) -> bool {
    let Some((column, value)) = filter else {
        return true;
    };
    match row.get(column) {
        Some(Value::String(s)) => s == value,
        Some(Value::Null) | None => value == "null",
        Some(other) => other.to_string() == value,
    }
}
