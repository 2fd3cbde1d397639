//! Sign-in, registration, sign-out and profile flows

use serde_json::Value;
use uuid::Uuid;

use crate::client::{count_rows, fetch_profile, RowClient, SessionClient, SignUpRequest, PROFILES};
use crate::error::Error;
use crate::forms::{Credentials, FormKind, Registration, Row};
use crate::identity::{display_name_from_email, CachedIdentity, Profile, Role, Session};
use crate::local::LocalState;
use crate::validate::{self, ValidationErrors, PHONE_DIGITS};

fn profile_from_row(row: Row) -> Result<Profile, Error> {
    Ok(serde_json::from_value(Value::Object(row))?)
}

fn profile_to_row(profile: &Profile) -> Result<Row, Error> {
    match serde_json::to_value(profile)? {
        Value::Object(row) => Ok(row),
        _ => Err(Error::Storage("profile did not serialize to an object".to_string())),
    }
}

/// Sign in, make sure a profile exists, and cache the identity locally
///
/// A missing profile is created with the `user` role. If the profile can
/// neither be read nor created the user is still signed in and cached as
/// an ordinary user.
pub async fn login<S, R>(
    sessions: &S,
    rows: &R,
    local: &LocalState,
    credentials: &Credentials,
) -> Result<CachedIdentity, Error>
where
    S: SessionClient + ?Sized,
    R: RowClient + ?Sized,
{
    credentials.validate()?;
    let session = sessions
        .sign_in(&credentials.email, &credentials.password)
        .await?;

    let profile = match fetch_profile(rows, &session.user_id).await {
        Ok(Some(profile)) => Some(profile),
        Ok(None) => create_profile(rows, &session).await,
        Err(e) => {
            tracing::warn!(user_id = %session.user_id, error = %e, "Could not fetch profile");
            None
        }
    };

    let identity = match &profile {
        Some(profile) => CachedIdentity::from_profile(profile),
        None => CachedIdentity {
            id: session.user_id,
            name: display_name_from_email(&session.email),
            email: session.email.clone(),
            role: Role::User,
        },
    };
    local.set_identity(&identity)?;

    tracing::info!(user_id = %identity.id, role = %identity.role, "Signed in");
    Ok(identity)
}

async fn create_profile<R: RowClient + ?Sized>(rows: &R, session: &Session) -> Option<Profile> {
    let profile = Profile::for_session(session);
    let row = match profile_to_row(&profile) {
        Ok(row) => row,
        Err(e) => {
            tracing::error!(error = %e, "Could not encode profile");
            return None;
        }
    };
    match rows.insert(PROFILES, row).await.and_then(profile_from_row) {
        Ok(created) => {
            tracing::info!(user_id = %created.id, "Created missing profile");
            Some(created)
        }
        Err(e) => {
            tracing::error!(user_id = %session.user_id, error = %e, "Error creating profile");
            None
        }
    }
}

/// Validate the registration form and create the account
pub async fn register<S: SessionClient + ?Sized>(
    sessions: &S,
    registration: &Registration,
) -> Result<Session, Error> {
    registration.validate()?;
    let request = SignUpRequest {
        email: registration.email.trim().to_string(),
        password: registration.password.clone(),
        full_name: Some(registration.full_name.trim().to_string()),
        phone: Some(registration.phone.clone()),
    };
    let session = sessions.sign_up(&request).await?;
    tracing::info!(user_id = %session.user_id, "Registered");
    Ok(session)
}

/// Clear the cached identity, then end the remote session
pub async fn logout<S: SessionClient + ?Sized>(sessions: &S, local: &LocalState) -> Result<(), Error> {
    local.clear_identity()?;
    sessions.sign_out().await
}

/// Update the signed-in user's display name and phone, mirroring the change
/// into the cached identity
pub async fn update_profile<R: RowClient + ?Sized>(
    rows: &R,
    local: &LocalState,
    user_id: Uuid,
    full_name: &str,
    phone: Option<&str>,
) -> Result<Profile, Error> {
    let mut errors = ValidationErrors::new();
    errors.check(
        "fullName",
        validate::min_length(full_name, 2, "Full name must be at least 2 characters."),
    );
    if let Some(phone) = phone {
        errors.check(
            "phone",
            validate::digits(phone, PHONE_DIGITS, "Phone number must be 10 digits."),
        );
    }
    errors.into_result()?;

    let mut patch = Row::new();
    patch.insert("full_name".to_string(), Value::String(full_name.trim().to_string()));
    if let Some(phone) = phone {
        patch.insert("phone".to_string(), Value::String(phone.to_string()));
    }

    let updated = profile_from_row(rows.update(PROFILES, &user_id.to_string(), patch).await?)?;

    match local.identity() {
        Ok(Some(cached)) if cached.id == updated.id => {
            local.set_identity(&CachedIdentity::from_profile(&updated))?;
        }
        Ok(_) => {}
        Err(e) => tracing::debug!(error = %e, "Identity cache not refreshed"),
    }
    Ok(updated)
}

/// Submission count per form, 0 where the count cannot be determined
pub async fn response_counts<R: RowClient + ?Sized>(rows: &R) -> Vec<(FormKind, u64)> {
    let mut counts = Vec::with_capacity(FormKind::ALL.len());
    for kind in FormKind::ALL {
        let count = match count_rows(rows, kind.spec().collection).await {
            Ok(count) => count,
            Err(e) => {
                tracing::error!(form = %kind, error = %e, "Error fetching response count");
                0
            }
        };
        counts.push((kind, count));
    }
    counts
}
