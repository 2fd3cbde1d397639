//! Outgoing notification mail

pub mod console;
pub mod smtp;

pub use console::ConsoleMailer;
pub use smtp::{SmtpConfig, SmtpMailer};

/// Trait for sending account notifications
pub trait Mailer: Send + Sync {
    /// Greet a newly registered user
    fn send_welcome(&self, email: &str, name: &str) -> Result<(), String>;
}

/// Allow using Box<dyn Mailer> as a Mailer
impl Mailer for Box<dyn Mailer> {
    fn send_welcome(&self, email: &str, name: &str) -> Result<(), String> {
        (**self).send_welcome(email, name)
    }
}

/// Plain-text body of the welcome mail
pub fn welcome_body(name: &str) -> String {
    format!(
        "Hello {},\n\n\
         Welcome to e-Sahayata. Your account is ready and you can now sign in\n\
         to register as a beneficiary, volunteer, donate or send feedback.\n\n\
         If you didn't create this account, you can safely ignore this email.",
        name
    )
}

/// Subject line of the welcome mail
pub const WELCOME_SUBJECT: &str = "Welcome to e-Sahayata";
