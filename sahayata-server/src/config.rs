//! Server configuration

use std::path::PathBuf;

use crate::email::SmtpConfig;

#[derive(Debug, Clone)]
pub struct Config {
    /// Port to listen on
    pub port: u16,

    /// Public host the service is reached at
    pub domain: String,

    /// SQLite database file; in-memory stores when unset
    pub database_path: Option<String>,

    /// Root directory for stored documents
    pub storage_dir: PathBuf,

    /// Directory of static pages
    pub static_dir: PathBuf,

    /// Accounts registered with one of these addresses get the admin role
    pub admin_emails: Vec<String>,

    /// SMTP configuration for welcome mail; console output when unset
    pub smtp: Option<SmtpConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            domain: "localhost:3000".to_string(),
            database_path: None,
            storage_dir: PathBuf::from("storage"),
            static_dir: PathBuf::from("static"),
            admin_emails: Vec::new(),
            smtp: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// - PORT (default: 3000)
    /// - DOMAIN (default: localhost:<port>)
    /// - DATABASE_PATH
    /// - STORAGE_DIR (default: storage)
    /// - STATIC_DIR (default: static)
    /// - SAHAYATA_ADMIN_EMAILS (comma separated)
    /// - SMTP_* (see [`SmtpConfig::from_env`])
    pub fn from_env() -> Self {
        fn get_env(key: &str) -> Option<String> {
            std::env::var(key).ok().filter(|s| !s.is_empty())
        }

        let defaults = Self::default();
        let port = get_env("PORT")
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.port);

        Self {
            port,
            domain: get_env("DOMAIN").unwrap_or_else(|| format!("localhost:{}", port)),
            database_path: get_env("DATABASE_PATH"),
            storage_dir: get_env("STORAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.storage_dir),
            static_dir: get_env("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.static_dir),
            admin_emails: get_env("SAHAYATA_ADMIN_EMAILS")
                .map(|s| parse_email_list(&s))
                .unwrap_or_default(),
            smtp: SmtpConfig::from_env(),
        }
    }

    /// Base URL used for public object links
    pub fn public_url(&self) -> String {
        if self.domain.starts_with("http://") || self.domain.starts_with("https://") {
            self.domain.trim_end_matches('/').to_string()
        } else {
            format!("http://{}", self.domain)
        }
    }
}

/// Split a comma list of addresses, normalized to lowercase
pub fn parse_email_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}
