//! In-memory storage implementations

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use chrono::Utc;
use sahayata_core::Row;
use uuid::Uuid;

use super::{
    apply_patch, matches_filter, prepare_insert, Collection, RowStore, Session, SessionId,
    SessionStore, StoreResult, User, UserStore,
};
use crate::crypto::generate_session_token;
use crate::error::ServerError;

fn poisoned<T>(e: PoisonError<T>) -> ServerError {
    ServerError::Internal(format!("Lock poisoned: {}", e))
}

/// In-memory account store
#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
    /// Lowercased e-mail to user id
    emails: RwLock<HashMap<String, Uuid>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserStore for InMemoryUserStore {
    fn create_user(&self, email: &str, password_hash: &str) -> StoreResult<User> {
        let normalized = email.trim().to_lowercase();
        let mut emails = self.emails.write().map_err(poisoned)?;
        if emails.contains_key(&normalized) {
            return Err(ServerError::EmailAlreadyExists);
        }

        let user = User {
            id: Uuid::new_v4(),
            email: normalized.clone(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };
        emails.insert(normalized, user.id);
        self.users
            .write()
            .map_err(poisoned)?
            .insert(user.id, user.clone());
        Ok(user)
    }

    fn get_user(&self, user_id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.users.read().map_err(poisoned)?.get(&user_id).cloned())
    }

    fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let normalized = email.trim().to_lowercase();
        let user_id = self.emails.read().map_err(poisoned)?.get(&normalized).copied();
        match user_id {
            Some(id) => self.get_user(id),
            None => Ok(None),
        }
    }
}

/// In-memory session store
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<SessionId, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for InMemorySessionStore {
    fn create(&self, user: &User) -> StoreResult<Session> {
        let session = Session {
            id: SessionId(generate_session_token()),
            user_id: user.id,
            email: user.email.clone(),
            created_at: Utc::now(),
        };
        self.sessions
            .write()
            .map_err(poisoned)?
            .insert(session.id.clone(), session.clone());
        Ok(session)
    }

    fn get(&self, session_id: &SessionId) -> StoreResult<Option<Session>> {
        Ok(self.sessions.read().map_err(poisoned)?.get(session_id).cloned())
    }

    fn delete(&self, session_id: &SessionId) -> StoreResult<()> {
        self.sessions.write().map_err(poisoned)?.remove(session_id);
        Ok(())
    }
}

/// In-memory row store; rows keep insertion order per collection
#[derive(Default)]
pub struct InMemoryRowStore {
    collections: RwLock<HashMap<Collection, Vec<Row>>>,
}

impl InMemoryRowStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn row_id(row: &Row) -> Option<&str> {
    row.get("id").and_then(|v| v.as_str())
}

impl RowStore for InMemoryRowStore {
    fn insert(&self, collection: Collection, mut row: Row) -> StoreResult<Row> {
        let id = prepare_insert(&mut row)?;
        let mut collections = self.collections.write().map_err(poisoned)?;
        let rows = collections.entry(collection).or_default();
        if rows.iter().any(|r| row_id(r) == Some(id.as_str())) {
            return Err(ServerError::DuplicateRow(id));
        }
        rows.push(row.clone());
        Ok(row)
    }

    fn get(&self, collection: Collection, id: &str) -> StoreResult<Option<Row>> {
        let collections = self.collections.read().map_err(poisoned)?;
        Ok(collections
            .get(&collection)
            .and_then(|rows| rows.iter().find(|r| row_id(r) == Some(id)))
            .cloned())
    }

    fn select(&self, collection: Collection, filter: Option<(&str, &str)>) -> StoreResult<Vec<Row>> {
        let collections = self.collections.read().map_err(poisoned)?;
        Ok(collections
            .get(&collection)
            .map(|rows| {
                rows.iter()
                    .filter(|r| matches_filter(r, filter))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn update(&self, collection: Collection, id: &str, patch: Row) -> StoreResult<Option<Row>> {
        let mut collections = self.collections.write().map_err(poisoned)?;
        let Some(row) = collections
            .get_mut(&collection)
            .and_then(|rows| rows.iter_mut().find(|r| row_id(r) == Some(id)))
        else {
            return Ok(None);
        };
        apply_patch(row, patch);
        Ok(Some(row.clone()))
    }

    fn count(&self, collection: Collection) -> StoreResult<u64> {
        let collections = self.collections.read().map_err(poisoned)?;
        Ok(collections.get(&collection).map_or(0, |rows| rows.len() as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sahayata_core::FormKind;
    use serde_json::{json, Value};

    fn row(value: Value) -> Row {
        match value {
            Value::Object(row) => row,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_user_email_is_case_insensitive() {
        let store = InMemoryUserStore::new();
        let user = store.create_user("Asha@Example.org", "hash").unwrap();
        assert_eq!(user.email, "asha@example.org");

        let found = store.get_user_by_email("ASHA@example.org").unwrap().unwrap();
        assert_eq!(found.id, user.id);

        assert!(matches!(
            store.create_user("asha@example.org", "other"),
            Err(ServerError::EmailAlreadyExists)
        ));
    }

    #[test]
    fn test_session_lifecycle() {
        let users = InMemoryUserStore::new();
        let sessions = InMemorySessionStore::new();
        let user = users.create_user("asha@example.org", "hash").unwrap();

        let session = sessions.create(&user).unwrap();
        assert_eq!(sessions.get(&session.id).unwrap().unwrap().user_id, user.id);

        sessions.delete(&session.id).unwrap();
        assert!(sessions.get(&session.id).unwrap().is_none());
    }

    #[test]
    fn test_rows_by_collection() {
        let store = InMemoryRowStore::new();
        let donations = Collection::Form(FormKind::Donation);

        let first = store
            .insert(donations, row(json!({"donor_name": "Meera", "payment_method": "upi"})))
            .unwrap();
        store
            .insert(donations, row(json!({"donor_name": "Ravi", "payment_method": "card"})))
            .unwrap();

        assert_eq!(store.count(donations).unwrap(), 2);
        assert_eq!(store.count(Collection::Profiles).unwrap(), 0);

        let upi = store.select(donations, Some(("payment_method", "upi"))).unwrap();
        assert_eq!(upi.len(), 1);
        assert_eq!(upi[0]["donor_name"], json!("Meera"));

        let id = first["id"].as_str().unwrap();
        let updated = store
            .update(donations, id, row(json!({"status": "refunded"})))
            .unwrap()
            .unwrap();
        assert_eq!(updated["status"], json!("refunded"));
        assert_eq!(store.get(donations, id).unwrap().unwrap()["status"], json!("refunded"));

        assert!(store.update(donations, "missing", Row::new()).unwrap().is_none());
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let store = InMemoryRowStore::new();
        store.insert(Collection::Profiles, row(json!({"id": "u1"}))).unwrap();
        assert!(matches!(
            store.insert(Collection::Profiles, row(json!({"id": "u1"}))),
            Err(ServerError::DuplicateRow(_))
        ));
    }
}
