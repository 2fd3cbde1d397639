//! SMTP mailer for production

use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

use super::{welcome_body, Mailer, WELCOME_SUBJECT};

/// Port that expects STARTTLS instead of implicit TLS
const SUBMISSION_PORT: u16 = 587;

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    /// 465 for implicit TLS, 587 for STARTTLS
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from_email: String,
    pub from_name: Option<String>,
}

impl SmtpConfig {
    /// Read SMTP_HOST and SMTP_FROM_EMAIL (required), SMTP_PORT (465),
    /// SMTP_USERNAME, SMTP_PASSWORD and SMTP_FROM_NAME
    pub fn from_env() -> Option<Self> {
        fn get_env(key: &str) -> Option<String> {
            std::env::var(key).ok().filter(|s| !s.is_empty())
        }

        Some(Self {
            host: get_env("SMTP_HOST")?,
            port: get_env("SMTP_PORT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(465),
            username: get_env("SMTP_USERNAME"),
            password: get_env("SMTP_PASSWORD"),
            from_email: get_env("SMTP_FROM_EMAIL")?,
            from_name: get_env("SMTP_FROM_NAME"),
        })
    }

    fn sender(&self) -> Result<Mailbox, String> {
        let address = self
            .from_email
            .parse()
            .map_err(|e| format!("Invalid from address: {}", e))?;
        Ok(Mailbox::new(self.from_name.clone(), address))
    }
}

/// Mailer delivering through an SMTP relay
pub struct SmtpMailer {
    transport: SmtpTransport,
    sender: Mailbox,
}

impl SmtpMailer {
    /// Build the transport; no connection is made until the first send
    pub fn new(config: SmtpConfig) -> Result<Self, String> {
        let builder = if config.port == SUBMISSION_PORT {
            SmtpTransport::starttls_relay(&config.host)
        } else {
            SmtpTransport::relay(&config.host)
        }
        .map_err(|e| format!("Failed to create SMTP transport: {}", e))?
        .port(config.port);

        let builder = match (&config.username, &config.password) {
            (Some(username), Some(password)) => {
                builder.credentials(Credentials::new(username.clone(), password.clone()))
            }
            _ => builder,
        };

        tracing::info!(host = %config.host, port = config.port, "SMTP mailer configured");

        Ok(Self {
            transport: builder.build(),
            sender: config.sender()?,
        })
    }

    fn message(&self, to: &str, subject: &str, body: String) -> Result<Message, String> {
        let recipient: Mailbox = to
            .parse()
            .map_err(|e| format!("Invalid to address: {}", e))?;

        Message::builder()
            .from(self.sender.clone())
            .to(recipient)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| format!("Failed to build email: {}", e))
    }
}

impl Mailer for SmtpMailer {
    fn send_welcome(&self, email: &str, name: &str) -> Result<(), String> {
        let message = self.message(email, WELCOME_SUBJECT, welcome_body(name))?;
        self.transport
            .send(&message)
            .map_err(|e| format!("Failed to send email: {}", e))?;

        tracing::info!(email = %email, "Welcome email sent");
        Ok(())
    }
}
