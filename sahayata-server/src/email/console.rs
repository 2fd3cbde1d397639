//! Console mailer for development

use super::{welcome_body, Mailer, WELCOME_SUBJECT};

/// Mailer that prints messages to the console
#[derive(Default)]
pub struct ConsoleMailer;

impl ConsoleMailer {
    pub fn new() -> Self {
        Self
    }
}

impl Mailer for ConsoleMailer {
    fn send_welcome(&self, email: &str, name: &str) -> Result<(), String> {
        println!();
        println!("========================================");
        println!("  TO: {}", email);
        println!("  SUBJECT: {}", WELCOME_SUBJECT);
        println!("========================================");
        println!("{}", welcome_body(name));
        println!();

        tracing::info!(email = %email, "Welcome mail written to console");

        Ok(())
    }
}
