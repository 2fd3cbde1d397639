//! Field-level validators shared by every form
//!
//! Each validator returns `Err(message)` with the exact message shown next
//! to the field. Forms compose these through [`crate::forms::FieldKind`].

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Number of digits in a contact or phone number
pub const PHONE_DIGITS: usize = 10;

/// Minimum password length for new accounts
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// A validation failure attached to one field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// All field failures for one submission attempt
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Record the result of a validator under `field`
    pub fn check(&mut self, field: &str, result: Result<(), String>) {
        if let Err(message) = result {
            self.push(field, message);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First message recorded for a field
    pub fn for_field(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// At least `min` characters, surrounding whitespace included
pub fn min_length(value: &str, min: usize, message: &str) -> Result<(), String> {
    if value.chars().count() >= min {
        Ok(())
    } else {
        Err(message.to_string())
    }
}

pub fn required(value: &str, message: &str) -> Result<(), String> {
    min_length(value, 1, message)
}

/// Loose address check: one `@`, a local part, and a dotted domain
pub fn email(value: &str) -> Result<(), String> {
    const MESSAGE: &str = "Please enter a valid email address.";

    let value = value.trim();
    let Some((local, domain)) = value.split_once('@') else {
        return Err(MESSAGE.to_string());
    };
    let domain_ok = !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains("..");
    if local.is_empty() || !domain_ok || value.chars().any(char::is_whitespace) {
        return Err(MESSAGE.to_string());
    }
    Ok(())
}

/// Exactly `count` ASCII digits and nothing else
pub fn digits(value: &str, count: usize, message: &str) -> Result<(), String> {
    if value.len() == count && value.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(message.to_string())
    }
}

/// Parse the leading integer of a string, ignoring leading whitespace and
/// any trailing non-digit text (`"25 years"` → 25)
pub fn parse_leading_int(value: &str) -> Option<i64> {
    let trimmed = value.trim_start();
    let (sign, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (-1, &trimmed[1..]),
        Some(b'+') => (1, &trimmed[1..]),
        _ => (1, trimmed),
    };
    let end = rest
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(rest.len());
    if end == 0 {
        return None;
    }
    rest[..end].parse::<i64>().ok().map(|n| sign * n)
}

pub fn bounded_int(
    value: &str,
    min: i64,
    max: Option<i64>,
    message: &str,
) -> Result<i64, String> {
    match parse_leading_int(value) {
        Some(n) if n >= min && max.map_or(true, |max| n <= max) => Ok(n),
        _ => Err(message.to_string()),
    }
}

pub fn one_of(value: &str, options: &[&str], message: &str) -> Result<(), String> {
    if options.contains(&value) {
        Ok(())
    } else {
        Err(message.to_string())
    }
}

pub fn date(value: &str, message: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| message.to_string())
}

/// Account password rules: length, upper, lower and a digit
pub fn password(value: &str) -> Result<(), String> {
    if value.chars().count() < MIN_PASSWORD_LENGTH {
        return Err("Password must be at least 8 characters.".to_string());
    }
    if !value.chars().any(|c| c.is_ascii_uppercase()) {
        return Err("Password must contain at least one uppercase letter.".to_string());
    }
    if !value.chars().any(|c| c.is_ascii_lowercase()) {
        return Err("Password must contain at least one lowercase letter.".to_string());
    }
    if !value.chars().any(|c| c.is_ascii_digit()) {
        return Err("Password must contain at least one number.".to_string());
    }
    Ok(())
}
