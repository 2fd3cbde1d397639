//! Shared fixtures for sahayata-core integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sahayata_core::client::PROFILES;
use sahayata_core::{
    AuthEvent, Error, Role, Row, RowClient, Session, SessionClient, SignUpRequest,
};
use serde_json::{json, Value};
use tokio::sync::{broadcast, Notify};
use uuid::Uuid;

/// In-process stand-in for the hosted backend
pub struct MockBackend {
    accounts: Mutex<HashMap<String, (String, Session)>>,
    current: Mutex<Option<Session>>,
    rows: Mutex<HashMap<String, Vec<Row>>>,
    events: broadcast::Sender<AuthEvent>,
    /// When set, `get_session` waits for a permit before answering
    session_gate: Mutex<Option<Arc<Notify>>>,
    pub fail_session: AtomicBool,
    pub fail_profile: AtomicBool,
    pub fail_count: AtomicBool,
    pub insert_error: Mutex<Option<String>>,
    pub session_calls: AtomicUsize,
    pub insert_calls: AtomicUsize,
}

impl MockBackend {
    pub fn new() -> Arc<Self> {
        let (events, _) = broadcast::channel(16);
        Arc::new(Self {
            accounts: Mutex::new(HashMap::new()),
            current: Mutex::new(None),
            rows: Mutex::new(HashMap::new()),
            events,
            session_gate: Mutex::new(None),
            fail_session: AtomicBool::new(false),
            fail_profile: AtomicBool::new(false),
            fail_count: AtomicBool::new(false),
            insert_error: Mutex::new(None),
            session_calls: AtomicUsize::new(0),
            insert_calls: AtomicUsize::new(0),
        })
    }

    /// Register an account, optionally with a profile row
    pub fn add_user(&self, email: &str, password: &str, role: Option<Role>) -> Session {
        let session = Session {
            user_id: Uuid::new_v4(),
            email: email.to_string(),
        };
        self.accounts
            .lock()
            .unwrap()
            .insert(email.to_string(), (password.to_string(), session.clone()));
        if let Some(role) = role {
            self.put_row(
                PROFILES,
                json!({
                    "id": session.user_id.to_string(),
                    "full_name": "Test User",
                    "email": email,
                    "role": role.as_str(),
                }),
            );
        }
        session
    }

    /// Sign a user in without going through `sign_in`
    pub fn set_current(&self, session: Option<Session>) {
        *self.current.lock().unwrap() = session;
    }

    /// Session ended on the server side
    pub fn expire_session(&self) {
        *self.current.lock().unwrap() = None;
        let _ = self.events.send(AuthEvent::SignedOut);
    }

    pub fn emit(&self, event: AuthEvent) {
        let _ = self.events.send(event);
    }

    pub fn gate_sessions(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.session_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn put_row(&self, collection: &str, row: Value) {
        let Value::Object(row) = row else {
            panic!("row must be an object");
        };
        self.rows
            .lock()
            .unwrap()
            .entry(collection.to_string())
            .or_default()
            .push(row);
    }

    pub fn rows(&self, collection: &str) -> Vec<Row> {
        self.rows
            .lock()
            .unwrap()
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl SessionClient for MockBackend {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, Error> {
        let accounts = self.accounts.lock().unwrap().clone();
        match accounts.get(email) {
            Some((expected, session)) if expected == password => {
                self.set_current(Some(session.clone()));
                self.emit(AuthEvent::SignedIn(session.clone()));
                Ok(session.clone())
            }
            _ => Err(Error::Remote("Invalid login credentials".to_string())),
        }
    }

    async fn sign_up(&self, request: &SignUpRequest) -> Result<Session, Error> {
        if self.accounts.lock().unwrap().contains_key(&request.email) {
            return Err(Error::Remote("User already registered".to_string()));
        }
        let session = self.add_user(&request.email, &request.password, Some(Role::User));
        self.set_current(Some(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), Error> {
        self.expire_session();
        Ok(())
    }

    async fn get_session(&self) -> Result<Option<Session>, Error> {
        self.session_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.session_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.fail_session.load(Ordering::SeqCst) {
            return Err(Error::Transport("connection refused".to_string()));
        }
        Ok(self.current.lock().unwrap().clone())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}

#[async_trait]
impl RowClient for MockBackend {
    async fn insert(&self, collection: &str, mut row: Row) -> Result<Row, Error> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.insert_error.lock().unwrap().clone() {
            return Err(Error::Remote(message));
        }
        row.entry("id".to_string())
            .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
        self.put_row(collection, Value::Object(row.clone()));
        Ok(row)
    }

    async fn select_by_id(&self, collection: &str, id: &str) -> Result<Option<Row>, Error> {
        if collection == PROFILES && self.fail_profile.load(Ordering::SeqCst) {
            return Err(Error::Remote("permission denied for table profiles".to_string()));
        }
        Ok(self
            .rows(collection)
            .into_iter()
            .find(|row| row.get("id").and_then(Value::as_str) == Some(id)))
    }

    async fn select(
        &self,
        collection: &str,
        filter: Option<(&str, &str)>,
    ) -> Result<Vec<Row>, Error> {
        Ok(self
            .rows(collection)
            .into_iter()
            .filter(|row| match filter {
                Some((column, value)) => row.get(column).and_then(Value::as_str) == Some(value),
                None => true,
            })
            .collect())
    }

    async fn update(&self, collection: &str, id: &str, patch: Row) -> Result<Row, Error> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .get_mut(collection)
            .and_then(|rows| {
                rows.iter_mut()
                    .find(|row| row.get("id").and_then(Value::as_str) == Some(id))
            })
            .ok_or_else(|| Error::Remote("Row not found".to_string()))?;
        for (column, value) in patch {
            row.insert(column, value);
        }
        Ok(row.clone())
    }

    async fn count(&self, collection: &str) -> Result<u64, Error> {
        if self.fail_count.load(Ordering::SeqCst) {
            return Err(Error::Remote("count not available".to_string()));
        }
        Ok(self.rows(collection).len() as u64)
    }
}
