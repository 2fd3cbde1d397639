//! The six data-collection forms, described as data
//!
//! A form is a [`FormSpec`]: its target collection, the draft key it saves
//! under, and a list of typed fields. Validation, draft decoding and row
//! construction are driven entirely by the field list.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::validate::{self, ValidationErrors, PHONE_DIGITS};

/// A single column value to insert into the row store
pub type Row = Map<String, Value>;

/// Which of the six data-collection forms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormKind {
    Beneficiary,
    Volunteer,
    Donation,
    Event,
    Service,
    Feedback,
}

impl FormKind {
    pub const ALL: [FormKind; 6] = [
        FormKind::Beneficiary,
        FormKind::Volunteer,
        FormKind::Donation,
        FormKind::Event,
        FormKind::Service,
        FormKind::Feedback,
    ];

    /// URL segment under `/forms/`
    pub fn slug(&self) -> &'static str {
        match self {
            FormKind::Beneficiary => "beneficiary",
            FormKind::Volunteer => "volunteer",
            FormKind::Donation => "donation",
            FormKind::Event => "event",
            FormKind::Service => "service",
            FormKind::Feedback => "feedback",
        }
    }

    pub fn from_slug(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.slug() == s)
    }

    pub fn spec(&self) -> &'static FormSpec {
        match self {
            FormKind::Beneficiary => &BENEFICIARY,
            FormKind::Volunteer => &VOLUNTEER,
            FormKind::Donation => &DONATION,
            FormKind::Event => &EVENT,
            FormKind::Service => &SERVICE,
            FormKind::Feedback => &FEEDBACK,
        }
    }

    /// Fixed local-storage key for this form's draft
    pub fn draft_key(&self) -> String {
        format!("{}-form-draft", self.slug())
    }
}

impl fmt::Display for FormKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// Type and constraint of a single field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text { min_len: usize },
    Email,
    Phone,
    Integer { min: i64, max: Option<i64> },
    Date,
    Choice(&'static [&'static str]),
    MultiChoice { min_items: usize },
}

/// One field of a form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Field name as used by the UI (camelCase)
    pub name: &'static str,
    /// Storage column (snake_case)
    pub column: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    /// Message shown when the field fails validation
    pub message: &'static str,
    /// Stored instead of an empty optional value
    pub default: Option<&'static str>,
}

impl FieldSpec {
    const fn new(
        name: &'static str,
        column: &'static str,
        kind: FieldKind,
        message: &'static str,
    ) -> Self {
        Self {
            name,
            column,
            kind,
            required: true,
            message,
            default: None,
        }
    }

    const fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    const fn or_default(mut self, default: &'static str) -> Self {
        self.default = Some(default);
        self
    }

    fn validate(&self, value: Option<&FieldValue>, errors: &mut ValidationErrors) {
        let text = value.and_then(FieldValue::as_text).unwrap_or("");
        let is_empty = value.map_or(true, FieldValue::is_empty);

        if is_empty && !self.required {
            return;
        }

        let result = match self.kind {
            FieldKind::Text { min_len } => validate::min_length(text, min_len.max(1), self.message),
            FieldKind::Email => validate::email(text).map_err(|_| self.message.to_string()),
            FieldKind::Phone => validate::digits(text, PHONE_DIGITS, self.message),
            FieldKind::Integer { min, max } => {
                validate::bounded_int(text, min, max, self.message).map(|_| ())
            }
            FieldKind::Date => match value {
                Some(FieldValue::Date(_)) => Ok(()),
                _ => validate::date(text, self.message).map(|_| ()),
            },
            FieldKind::Choice(options) => validate::one_of(text, options, self.message),
            FieldKind::MultiChoice { min_items } => match value {
                Some(FieldValue::List(items)) if items.len() >= min_items.max(1) => Ok(()),
                _ => Err(self.message.to_string()),
            },
        };
        errors.check(self.name, result);
    }

    fn to_column(&self, value: Option<&FieldValue>) -> Value {
        let is_empty = value.map_or(true, FieldValue::is_empty);
        if is_empty {
            return match self.default {
                Some(default) => Value::String(default.to_string()),
                None => Value::Null,
            };
        }

        match (self.kind, value) {
            (FieldKind::Integer { .. }, Some(v)) => v
                .as_text()
                .and_then(validate::parse_leading_int)
                .map(Value::from)
                .unwrap_or(Value::Null),
            (FieldKind::Date, Some(FieldValue::Date(d))) => Value::String(d.to_string()),
            (_, Some(FieldValue::List(items))) => {
                Value::Array(items.iter().cloned().map(Value::String).collect())
            }
            (_, Some(v)) => Value::String(v.as_text().unwrap_or("").trim().to_string()),
            (_, None) => Value::Null,
        }
    }

    /// Decode a stored draft value according to this field's type
    fn decode(&self, raw: &Value) -> Option<FieldValue> {
        match (self.kind, raw) {
            (FieldKind::Date, Value::String(s)) => parse_stored_date(s).map(FieldValue::Date),
            (FieldKind::MultiChoice { .. }, Value::Array(items)) => Some(FieldValue::List(
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect(),
            )),
            (_, Value::String(s)) => Some(FieldValue::Text(s.clone())),
            (_, Value::Number(n)) => Some(FieldValue::Text(n.to_string())),
            _ => None,
        }
    }
}

/// Stored dates may be plain (`1990-05-17`) or full timestamps
fn parse_stored_date(s: &str) -> Option<NaiveDate> {
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc).date_naive())
        .ok()
}

/// In-memory value of a field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
    Date(NaiveDate),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.is_empty(),
            FieldValue::List(items) => items.is_empty(),
            FieldValue::Date(_) => false,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(d: NaiveDate) -> Self {
        FieldValue::Date(d)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(items: Vec<String>) -> Self {
        FieldValue::List(items)
    }
}

/// Current values of a form, keyed by UI field name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormValues(BTreeMap<String, FieldValue>);

impl FormValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, field: &str, value: impl Into<FieldValue>) {
        self.0.insert(field.to_string(), value.into());
    }

    pub fn with(mut self, field: &str, value: impl Into<FieldValue>) -> Self {
        self.set(field, value);
        self
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.0.get(field)
    }

    /// Text value of a field, empty when unset
    pub fn text(&self, field: &str) -> &str {
        self.get(field).and_then(FieldValue::as_text).unwrap_or("")
    }

    /// True when any field differs from its empty default
    pub fn is_dirty(&self) -> bool {
        self.0.values().any(|v| !v.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.0.iter()
    }
}

/// Declarative description of a data-collection form
#[derive(Debug)]
pub struct FormSpec {
    pub kind: FormKind,
    /// Row-store collection the submission is inserted into
    pub collection: &'static str,
    pub title: &'static str,
    pub success_message: &'static str,
    pub fields: &'static [FieldSpec],
    /// Field prefilled with the cached display name
    pub name_field: Option<&'static str>,
    /// Column stamped with the submission time
    pub timestamp_column: Option<&'static str>,
    /// Initial `status` column value
    pub status: Option<&'static str>,
}

impl FormSpec {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Run every field validator; all failures are reported at once
    pub fn validate(&self, values: &FormValues) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        for field in self.fields {
            field.validate(values.get(field.name), &mut errors);
        }
        errors.into_result()
    }

    /// Build the storage row, translating UI names to column names
    pub fn to_row(&self, values: &FormValues, now: DateTime<Utc>) -> Row {
        let mut row = Row::new();
        for field in self.fields {
            row.insert(field.column.to_string(), field.to_column(values.get(field.name)));
        }
        if let Some(column) = self.timestamp_column {
            row.insert(column.to_string(), Value::String(now.to_rfc3339()));
        }
        if let Some(status) = self.status {
            row.insert("status".to_string(), Value::String(status.to_string()));
        }
        row
    }

    /// Rebuild form values from a stored draft, decoding typed fields
    pub fn decode_draft(&self, draft: &Value) -> FormValues {
        let mut values = FormValues::new();
        let Some(object) = draft.as_object() else {
            return values;
        };
        for field in self.fields {
            if let Some(value) = object.get(field.name).and_then(|raw| field.decode(raw)) {
                if !value.is_empty() {
                    values.set(field.name, value);
                }
            }
        }
        values
    }
}

const GENDERS: &[&str] = &["male", "female", "other"];
const PAYMENT_METHODS: &[&str] = &["upi", "netbanking", "card"];

const EMAIL_MESSAGE: &str = "Please enter a valid email address.";
const CONTACT_MESSAGE: &str = "Contact number must be 10 digits.";

pub static BENEFICIARY: FormSpec = FormSpec {
    kind: FormKind::Beneficiary,
    collection: "beneficiaries",
    title: "Beneficiary Registration",
    success_message: "Thank you for registering as a beneficiary. Your information has been submitted successfully.",
    fields: &[
        FieldSpec::new("fullName", "full_name", FieldKind::Text { min_len: 2 }, "Full name must be at least 2 characters."),
        FieldSpec::new("gender", "gender", FieldKind::Choice(GENDERS), "Please select a gender."),
        FieldSpec::new("dateOfBirth", "date_of_birth", FieldKind::Date, "Date of birth is required."),
        FieldSpec::new("address", "address", FieldKind::Text { min_len: 5 }, "Address must be at least 5 characters."),
        FieldSpec::new("contactNumber", "contact_number", FieldKind::Phone, CONTACT_MESSAGE),
        FieldSpec::new("email", "email", FieldKind::Email, EMAIL_MESSAGE),
        FieldSpec::new("ngoName", "ngo_name", FieldKind::Text { min_len: 1 }, "Please select an NGO."),
        FieldSpec::new("category", "category", FieldKind::Text { min_len: 1 }, "Please select a category."),
        FieldSpec::new("incomeRange", "income_range", FieldKind::Text { min_len: 1 }, "Please select your income range."),
    ],
    name_field: Some("fullName"),
    timestamp_column: None,
    status: None,
};

pub static VOLUNTEER: FormSpec = FormSpec {
    kind: FormKind::Volunteer,
    collection: "volunteers",
    title: "Volunteer Registration",
    success_message: "Thank you for volunteering! We will contact you soon with more details.",
    fields: &[
        FieldSpec::new("fullName", "full_name", FieldKind::Text { min_len: 2 }, "Full name must be at least 2 characters."),
        FieldSpec::new("age", "age", FieldKind::Integer { min: 18, max: Some(80) }, "Age must be between 18 and 80."),
        FieldSpec::new("gender", "gender", FieldKind::Text { min_len: 1 }, "Please select a gender."),
        FieldSpec::new("skills", "skills", FieldKind::Text { min_len: 5 }, "Please describe your skills in at least 5 characters."),
        FieldSpec::new("availability", "availability", FieldKind::MultiChoice { min_items: 1 }, "Please select at least one availability option."),
        FieldSpec::new("preferredNgo", "preferred_ngo", FieldKind::Text { min_len: 1 }, "Please select an NGO."),
        FieldSpec::new("contactNumber", "contact_number", FieldKind::Phone, CONTACT_MESSAGE),
        FieldSpec::new("email", "email", FieldKind::Email, EMAIL_MESSAGE),
    ],
    name_field: Some("fullName"),
    timestamp_column: Some("registration_date"),
    status: Some("pending"),
};

pub static DONATION: FormSpec = FormSpec {
    kind: FormKind::Donation,
    collection: "donations",
    title: "Make a Donation",
    success_message: "Thank You for Your Donation! Your generosity helps us make a difference.",
    fields: &[
        FieldSpec::new("donorName", "donor_name", FieldKind::Text { min_len: 2 }, "Donor name must be at least 2 characters."),
        FieldSpec::new("email", "email", FieldKind::Email, EMAIL_MESSAGE),
        FieldSpec::new("donationAmount", "donation_amount", FieldKind::Integer { min: 100, max: None }, "Donation amount must be at least ₹100."),
        FieldSpec::new("paymentMethod", "payment_method", FieldKind::Choice(PAYMENT_METHODS), "Please select a payment method."),
        FieldSpec::new("message", "message", FieldKind::Text { min_len: 0 }, "").optional(),
    ],
    name_field: Some("donorName"),
    timestamp_column: Some("donation_date"),
    status: Some("completed"),
};

pub static EVENT: FormSpec = FormSpec {
    kind: FormKind::Event,
    collection: "event_participants",
    title: "Event Registration",
    success_message: "You have successfully registered for the event. We look forward to your participation!",
    fields: &[
        FieldSpec::new("participantName", "participant_name", FieldKind::Text { min_len: 2 }, "Name must be at least 2 characters."),
        FieldSpec::new("age", "age", FieldKind::Integer { min: 5, max: Some(100) }, "Age must be between 5 and 100."),
        FieldSpec::new("gender", "gender", FieldKind::Text { min_len: 1 }, "Please select a gender."),
        FieldSpec::new("eventName", "event_name", FieldKind::Text { min_len: 1 }, "Please select an event."),
        FieldSpec::new("email", "email", FieldKind::Email, EMAIL_MESSAGE),
        FieldSpec::new("contactNumber", "contact_number", FieldKind::Phone, CONTACT_MESSAGE),
    ],
    name_field: Some("participantName"),
    timestamp_column: Some("registration_date"),
    status: Some("registered"),
};

pub static SERVICE: FormSpec = FormSpec {
    kind: FormKind::Service,
    collection: "service_requests",
    title: "Service Request",
    success_message: "Your service request has been submitted. Our team will get back to you shortly.",
    fields: &[
        FieldSpec::new("ngoName", "ngo_name", FieldKind::Text { min_len: 2 }, "NGO name must be at least 2 characters."),
        FieldSpec::new("serviceType", "service_type", FieldKind::Text { min_len: 1 }, "Please select a service type."),
        FieldSpec::new("issueDescription", "issue_description", FieldKind::Text { min_len: 10 }, "Description must be at least 10 characters."),
        FieldSpec::new("contactPersonName", "contact_person_name", FieldKind::Text { min_len: 2 }, "Contact person name must be at least 2 characters."),
        FieldSpec::new("email", "email", FieldKind::Email, EMAIL_MESSAGE),
        FieldSpec::new("phoneNumber", "phone_number", FieldKind::Phone, "Phone number must be 10 digits."),
    ],
    name_field: Some("contactPersonName"),
    timestamp_column: Some("request_date"),
    status: Some("pending"),
};

pub static FEEDBACK: FormSpec = FormSpec {
    kind: FormKind::Feedback,
    collection: "feedback",
    title: "Feedback",
    success_message: "Thank you for sharing your feedback. Your input helps us improve our services.",
    fields: &[
        FieldSpec::new("name", "name", FieldKind::Text { min_len: 0 }, "").optional().or_default("Anonymous"),
        FieldSpec::new("email", "email", FieldKind::Email, EMAIL_MESSAGE).optional(),
        FieldSpec::new("feedbackType", "feedback_type", FieldKind::Text { min_len: 1 }, "Please select a feedback type."),
        FieldSpec::new("message", "message", FieldKind::Text { min_len: 5 }, "Message must be at least 5 characters."),
    ],
    name_field: Some("name"),
    timestamp_column: Some("submission_date"),
    status: Some("new"),
};

/// Account registration schema
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub confirm_password: String,
}

impl Registration {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check(
            "fullName",
            validate::min_length(&self.full_name, 2, "Full name must be at least 2 characters."),
        );
        errors.check("email", validate::email(&self.email));
        errors.check(
            "phone",
            validate::digits(&self.phone, PHONE_DIGITS, "Phone number must be 10 digits."),
        );
        errors.check("password", validate::password(&self.password));
        if self.password != self.confirm_password {
            errors.push("confirmPassword", "Passwords do not match");
        }
        errors.into_result()
    }
}

/// Sign-in schema
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check("email", validate::email(&self.email));
        if self.password.is_empty() {
            errors.push("password", "Password is required.");
        }
        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn beneficiary() -> FormValues {
        FormValues::new()
            .with("fullName", "Asha Devi")
            .with("gender", "female")
            .with("dateOfBirth", NaiveDate::from_ymd_opt(1990, 5, 17).unwrap())
            .with("address", "12 Lake Road, Pune")
            .with("contactNumber", "9876543210")
            .with("email", "asha@example.org")
            .with("ngoName", "Seva Trust")
            .with("category", "education")
            .with("incomeRange", "below-1-lakh")
    }

    #[test]
    fn test_slug_round_trip_and_keys() {
        for kind in FormKind::ALL {
            assert_eq!(FormKind::from_slug(kind.slug()), Some(kind));
            assert_eq!(kind.spec().kind, kind);
        }
        assert_eq!(FormKind::Beneficiary.draft_key(), "beneficiary-form-draft");
        assert_eq!(FormKind::from_slug("unknown"), None);
    }

    #[test]
    fn test_row_uses_storage_columns() {
        let now = Utc::now();
        let row = BENEFICIARY.to_row(&beneficiary(), now);

        assert_eq!(row["full_name"], "Asha Devi");
        assert_eq!(row["date_of_birth"], "1990-05-17");
        assert_eq!(row["contact_number"], "9876543210");
        assert!(!row.contains_key("fullName"));
        assert!(!row.contains_key("status"));
    }

    #[test]
    fn test_row_extras_and_numbers() {
        let values = FormValues::new()
            .with("donorName", "Ravi")
            .with("email", "ravi@example.org")
            .with("donationAmount", "500")
            .with("paymentMethod", "upi");
        let row = DONATION.to_row(&values, Utc::now());

        assert_eq!(row["donation_amount"], 500);
        assert_eq!(row["status"], "completed");
        assert!(row["donation_date"].is_string());
        assert_eq!(row["message"], Value::Null);
    }

    #[test]
    fn test_feedback_defaults_to_anonymous() {
        let values = FormValues::new()
            .with("feedbackType", "suggestion")
            .with("message", "More evening events please");
        assert!(FEEDBACK.validate(&values).is_ok());

        let row = FEEDBACK.to_row(&values, Utc::now());
        assert_eq!(row["name"], "Anonymous");
        assert_eq!(row["email"], Value::Null);
    }

    #[test]
    fn test_optional_email_still_checked_when_present() {
        let values = FormValues::new()
            .with("email", "not-an-email")
            .with("feedbackType", "complaint")
            .with("message", "The form was slow");
        let errors = FEEDBACK.validate(&values).unwrap_err();
        assert_eq!(errors.for_field("email"), Some(EMAIL_MESSAGE));
    }

    #[test]
    fn test_decode_draft_restores_dates() {
        let draft = serde_json::to_value(beneficiary()).unwrap();
        assert_eq!(draft["dateOfBirth"], "1990-05-17");

        let restored = BENEFICIARY.decode_draft(&draft);
        assert_eq!(restored, beneficiary());
    }

    #[test]
    fn test_decode_draft_accepts_timestamps() {
        let draft = serde_json::json!({ "dateOfBirth": "1990-05-17T00:00:00.000Z", "bogus": "x" });
        let restored = BENEFICIARY.decode_draft(&draft);
        assert_eq!(
            restored.get("dateOfBirth"),
            Some(&FieldValue::Date(NaiveDate::from_ymd_opt(1990, 5, 17).unwrap()))
        );
        assert!(restored.get("bogus").is_none());
    }

    #[test]
    fn test_registration_mismatch() {
        let reg = Registration {
            full_name: "Meera".into(),
            email: "meera@example.org".into(),
            phone: "9876543210".into(),
            password: "Abcdef12".into(),
            confirm_password: "Abcdef13".into(),
        };
        let errors = reg.validate().unwrap_err();
        assert_eq!(errors.for_field("confirmPassword"), Some("Passwords do not match"));
        assert!(errors.for_field("password").is_none());
    }
}
