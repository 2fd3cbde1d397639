//! e-Sahayata backend
//!
//! Row store, session auth and document storage for the NGO form service,
//! plus an HTTP client that speaks the same API from the core library's
//! point of view.

pub mod client;
pub mod config;
pub mod crypto;
pub mod email;
pub mod error;
pub mod objects;
pub mod policy;
pub mod routes;
pub mod state;
pub mod store;

pub use client::HttpClient;
pub use config::Config;
pub use email::{ConsoleMailer, Mailer, SmtpConfig, SmtpMailer};
pub use error::ServerError;
pub use objects::ObjectStore;
pub use state::AppState;
pub use store::{
    Collection, InMemoryRowStore, InMemorySessionStore, InMemoryUserStore, RowStore,
    SessionStore, SqliteStore, UserStore,
};
