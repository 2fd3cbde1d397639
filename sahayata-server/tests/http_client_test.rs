//! End-to-end tests of the core client flows against a live server

mod common;

use std::sync::Arc;

use common::{MockMailer, ADMIN_EMAIL, PASSWORD};
use sahayata_core::account::{login, logout, register, response_counts, update_profile};
use sahayata_core::routes::{LANDING_ROUTE, LOGIN_ROUTE};
use sahayata_core::{
    Credentials, Error, FormKind, FormSession, Guard, GuardState, LocalState, Registration,
    Role, RowClient, SessionClient,
};
use sahayata_server::{
    routes, AppState, HttpClient, InMemoryRowStore, InMemorySessionStore, InMemoryUserStore,
    ObjectStore,
};
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Serve the app on an ephemeral port; returns the base URL
async fn spawn_server(storage: &TempDir) -> String {
    let state = Arc::new(
        AppState::new(
            InMemoryUserStore::new(),
            InMemorySessionStore::new(),
            InMemoryRowStore::new(),
            MockMailer::new(),
            ObjectStore::new(storage.path(), "http://localhost"),
        )
        .with_admin_emails(vec![ADMIN_EMAIL.to_string()]),
    );
    let app = routes::create_router_with_static_path(state, storage.path());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn registration(email: &str) -> Registration {
    Registration {
        full_name: "Asha Devi".to_string(),
        email: email.to_string(),
        phone: "9876543210".to_string(),
        password: PASSWORD.to_string(),
        confirm_password: PASSWORD.to_string(),
    }
}

#[tokio::test]
async fn test_register_login_and_logout() {
    let storage = TempDir::new().unwrap();
    let base_url = spawn_server(&storage).await;
    let client = HttpClient::new(&base_url).unwrap();
    let local = LocalState::in_memory();

    let session = register(&client, &registration("asha@example.org")).await.unwrap();
    assert_eq!(session.email, "asha@example.org");

    let identity = login(
        &client,
        &client,
        &local,
        &Credentials::new("asha@example.org", PASSWORD),
    )
    .await
    .unwrap();
    assert_eq!(identity.name, "Asha Devi");
    assert_eq!(identity.role, Role::User);
    assert_eq!(client.get_session().await.unwrap(), Some(session));

    let mut events = client.subscribe();
    logout(&client, &local).await.unwrap();
    assert!(local.identity().unwrap().is_none());
    assert!(client.get_session().await.unwrap().is_none());
    assert!(matches!(events.recv().await, Ok(sahayata_core::AuthEvent::SignedOut)));
}

#[tokio::test]
async fn test_remote_errors_carry_server_reason() {
    let storage = TempDir::new().unwrap();
    let base_url = spawn_server(&storage).await;
    let client = HttpClient::new(&base_url).unwrap();

    register(&client, &registration("asha@example.org")).await.unwrap();
    let err = register(&client, &registration("asha@example.org")).await.unwrap_err();
    assert_eq!(err.banner(), "User already registered");

    let err = client.sign_in("asha@example.org", "Wrong1234").await.unwrap_err();
    assert!(matches!(err, Error::Remote(ref reason) if reason == "Invalid login credentials"));
}

#[tokio::test]
async fn test_transport_error_when_server_unreachable() {
    // Bind then drop to get a port nothing listens on
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = HttpClient::new(format!("http://{}", addr)).unwrap();
    let err = client.get_session().await.unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
}

#[tokio::test]
async fn test_guards_follow_server_roles() {
    let storage = TempDir::new().unwrap();
    let base_url = spawn_server(&storage).await;

    let user = HttpClient::new(&base_url).unwrap();
    assert_eq!(
        Guard::authenticated().check(&user, &user).await,
        GuardState::Redirecting(LOGIN_ROUTE)
    );

    register(&user, &registration("asha@example.org")).await.unwrap();
    assert_eq!(
        Guard::authenticated().check(&user, &user).await,
        GuardState::Authorized
    );
    assert_eq!(
        Guard::admin().check(&user, &user).await,
        GuardState::Redirecting(LANDING_ROUTE)
    );

    let admin = HttpClient::new(&base_url).unwrap();
    register(&admin, &registration(ADMIN_EMAIL)).await.unwrap();
    assert_eq!(Guard::admin().check(&admin, &admin).await, GuardState::Authorized);
}

#[tokio::test]
async fn test_mounted_guard_redirects_on_sign_out() {
    let storage = TempDir::new().unwrap();
    let base_url = spawn_server(&storage).await;
    let client = Arc::new(HttpClient::new(&base_url).unwrap());
    register(client.as_ref(), &registration("asha@example.org")).await.unwrap();

    let mut mounted = Guard::authenticated().mount(client.clone(), client.clone());
    assert_eq!(mounted.settled().await, GuardState::Authorized);

    client.sign_out().await.unwrap();
    assert_eq!(mounted.changed().await, GuardState::Redirecting(LOGIN_ROUTE));
}

#[tokio::test]
async fn test_form_submission_and_admin_counts() {
    let storage = TempDir::new().unwrap();
    let base_url = spawn_server(&storage).await;

    // Anonymous visitor submits a donation
    let visitor = HttpClient::new(&base_url).unwrap();
    let local = LocalState::in_memory();
    let form = FormSession::new(FormKind::Donation, local.clone());
    form.set("donorName", "Ravi Kumar");
    form.set("email", "ravi@example.org");
    form.set("donationAmount", "500");
    form.set("paymentMethod", "card");
    form.save_draft().unwrap();

    let submitted = form.submit(&visitor).await.unwrap();
    assert_eq!(submitted.row["donation_amount"], 500);
    assert!(local.draft(FormKind::Donation).unwrap().is_none());

    // Counts are admin-only; a visitor sees zero for every form
    let counts = response_counts(&visitor).await;
    assert!(counts.iter().all(|(_, n)| *n == 0));

    let admin = HttpClient::new(&base_url).unwrap();
    register(&admin, &registration(ADMIN_EMAIL)).await.unwrap();
    let counts = response_counts(&admin).await;
    assert!(counts.contains(&(FormKind::Donation, 1)));
    assert!(counts.contains(&(FormKind::Feedback, 0)));

    let rows = admin
        .select("donations", Some(("payment_method", "card")))
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    let id = rows[0]["id"].as_str().unwrap();
    assert!(admin.select_by_id("donations", id).await.unwrap().is_some());
    assert!(admin.select_by_id("donations", "missing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_update_profile_round_trip() {
    let storage = TempDir::new().unwrap();
    let base_url = spawn_server(&storage).await;
    let client = HttpClient::new(&base_url).unwrap();
    let local = LocalState::in_memory();

    register(&client, &registration("asha@example.org")).await.unwrap();
    let identity = login(&client, &client, &local, &Credentials::new("asha@example.org", PASSWORD))
        .await
        .unwrap();

    let profile = update_profile(&client, &local, identity.id, "Asha D", Some("9123456780"))
        .await
        .unwrap();
    assert_eq!(profile.full_name, "Asha D");
    assert_eq!(profile.phone.as_deref(), Some("9123456780"));
    assert_eq!(profile.role, Role::User);
    assert_eq!(local.identity().unwrap().unwrap().name, "Asha D");
}
