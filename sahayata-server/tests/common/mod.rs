//! Common test utilities for server integration tests

#![allow(dead_code)]

use std::sync::{Arc, RwLock};

use axum_test::TestServer;
use sahayata_server::{
    routes, AppState, InMemoryRowStore, InMemorySessionStore, InMemoryUserStore, Mailer,
    ObjectStore,
};
use serde_json::json;
use tempfile::TempDir;

pub const ADMIN_EMAIL: &str = "admin@example.org";
pub const PASSWORD: &str = "Secret123";

/// Mock mailer that captures welcome mail
#[derive(Default, Clone)]
pub struct MockMailer {
    /// Captured (email, name) pairs
    pub sent: Arc<RwLock<Vec<(String, String)>>>,
}

impl MockMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recipients(&self) -> Vec<String> {
        self.sent
            .read()
            .unwrap()
            .iter()
            .map(|(email, _)| email.clone())
            .collect()
    }

    pub fn name_for(&self, email: &str) -> Option<String> {
        self.sent
            .read()
            .unwrap()
            .iter()
            .rev()
            .find(|(e, _)| e == email)
            .map(|(_, name)| name.clone())
    }
}

impl Mailer for MockMailer {
    fn send_welcome(&self, email: &str, name: &str) -> Result<(), String> {
        self.sent
            .write()
            .unwrap()
            .push((email.to_string(), name.to_string()));
        Ok(())
    }
}

/// A test server over in-memory stores; the temp dir holds stored documents
/// and must outlive the server
pub struct TestApp {
    pub server: TestServer,
    pub mailer: MockMailer,
    pub storage: TempDir,
    pub pages: TempDir,
}

/// Create a test server with a mock mailer and [`ADMIN_EMAIL`] as admin
pub fn create_test_server() -> TestApp {
    let storage = TempDir::new().unwrap();
    let pages = TempDir::new().unwrap();
    std::fs::write(pages.path().join("index.html"), "<h1>e-Sahayata</h1>").unwrap();
    std::fs::create_dir_all(pages.path().join("admin")).unwrap();
    std::fs::write(pages.path().join("admin/dashboard"), "admin").unwrap();

    let mailer = MockMailer::new();
    let objects = ObjectStore::new(storage.path(), "http://localhost:3000");
    let state = Arc::new(
        AppState::new(
            InMemoryUserStore::new(),
            InMemorySessionStore::new(),
            InMemoryRowStore::new(),
            mailer.clone(),
            objects,
        )
        .with_admin_emails(vec![ADMIN_EMAIL.to_string()]),
    );

    let app = routes::create_router_with_static_path(state, pages.path());
    let server = TestServer::new(app).expect("Failed to create test server");

    TestApp {
        server,
        mailer,
        storage,
        pages,
    }
}

/// Sign up a user and return (session cookie value, user id)
pub async fn sign_up(server: &TestServer, email: &str) -> (String, String) {
    let response = server
        .post("/auth/v1/signup")
        .json(&json!({
            "email": email,
            "password": PASSWORD,
            "full_name": "Test User",
        }))
        .await;
    assert_eq!(response.status_code(), 201);

    let body: serde_json::Value = response.json();
    let user_id = body["user_id"].as_str().expect("No user id").to_string();
    let cookie = response
        .maybe_cookie(routes::SESSION_COOKIE)
        .expect("No session cookie")
        .value()
        .to_string();
    (cookie, user_id)
}

pub fn session_cookie(value: &str) -> cookie::Cookie<'static> {
    cookie::Cookie::new(routes::SESSION_COOKIE, value.to_string())
}

/// A donation that passes validation, as submitted by the form
pub fn valid_donation() -> serde_json::Value {
    json!({
        "donorName": "Ravi Kumar",
        "email": "ravi@example.org",
        "donationAmount": "500",
        "paymentMethod": "upi",
        "message": "",
    })
}
