//! e-Sahayata backend
//!
//! Serves the auth, row and document API together with the static pages.

use std::sync::Arc;

use anyhow::Result;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sahayata_server::{
    routes, AppState, Config, ConsoleMailer, InMemoryRowStore, InMemorySessionStore,
    InMemoryUserStore, Mailer, ObjectStore, RowStore, SessionStore, SmtpMailer, SqliteStore,
    UserStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sahayata_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env();
    tracing::info!(port = config.port, domain = %config.domain, "Loaded configuration");

    let mailer: Box<dyn Mailer> = match config.smtp.clone() {
        Some(smtp) => match SmtpMailer::new(smtp) {
            Ok(mailer) => Box::new(mailer),
            Err(e) => {
                tracing::warn!(error = %e, "SMTP unavailable, writing mail to console");
                Box::new(ConsoleMailer::new())
            }
        },
        None => Box::new(ConsoleMailer::new()),
    };

    match config.database_path.as_deref() {
        Some(path) => {
            let store = Arc::new(SqliteStore::open(path)?);
            tracing::info!(path, "Using SQLite store");
            serve(&config, store.clone(), store.clone(), store, mailer).await
        }
        None => {
            tracing::warn!("DATABASE_PATH not set, data will not survive a restart");
            serve(
                &config,
                InMemoryUserStore::new(),
                InMemorySessionStore::new(),
                InMemoryRowStore::new(),
                mailer,
            )
            .await
        }
    }
}

async fn serve<U, S, R, M>(
    config: &Config,
    user_store: U,
    session_store: S,
    row_store: R,
    mailer: M,
) -> Result<()>
where
    U: UserStore + 'static,
    S: SessionStore + 'static,
    R: RowStore + 'static,
    M: Mailer + 'static,
{
    let objects = ObjectStore::new(config.storage_dir.clone(), config.public_url());
    let state = Arc::new(
        AppState::new(user_store, session_store, row_store, mailer, objects)
            .with_admin_emails(config.admin_emails.clone()),
    );

    let app = routes::create_router_with_static_path(state, &config.static_dir);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);
    tracing::info!("Public URL {}", config.public_url());

    axum::serve(listener, app).await?;

    Ok(())
}
