//! Authentication endpoints

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use sahayata_core::identity::display_name_from_email;
use sahayata_core::validate::{self, ValidationErrors, PHONE_DIGITS};
use sahayata_core::{Credentials, Profile, Role, SignUpRequest};
use serde::Serialize;
use serde_json::Value;
use tower_cookies::Cookies;

use super::session::{clear_session_cookie, get_session_from_cookies, set_session_cookie};
use crate::crypto::{hash_password, verify_password};
use crate::email::Mailer;
use crate::error::ServerError;
use crate::state::AppState;
use crate::store::{Collection, RowStore, SessionStore, UserStore};

#[derive(Serialize)]
pub struct SessionResponse {
    pub session: Option<sahayata_core::Session>,
}

#[derive(Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}

fn validate_sign_up(req: &SignUpRequest) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    errors.check("email", validate::email(&req.email));
    errors.check("password", validate::password(&req.password));
    if let Some(phone) = req.phone.as_deref().filter(|p| !p.is_empty()) {
        errors.check(
            "phone",
            validate::digits(phone, PHONE_DIGITS, "Phone number must be 10 digits."),
        );
    }
    errors.into_result()
}

/// POST /auth/v1/signup
///
/// Creates the account, its profile and a session. The profile gets the
/// admin role only for configured admin addresses.
pub async fn signup<U, S, R, M>(
    State(state): State<Arc<AppState<U, S, R, M>>>,
    cookies: Cookies,
    Json(req): Json<SignUpRequest>,
) -> Result<(StatusCode, Json<sahayata_core::Session>), ServerError>
where
    U: UserStore,
    S: SessionStore,
    R: RowStore,
    M: Mailer,
{
    validate_sign_up(&req)?;

    let password_hash =
        hash_password(&req.password).map_err(|e| ServerError::Internal(e.to_string()))?;
    let user = state.user_store.create_user(&req.email, &password_hash)?;

    let role = if state.is_admin_email(&user.email) {
        Role::Admin
    } else {
        Role::User
    };
    let full_name = req
        .full_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| display_name_from_email(&user.email));
    let profile = Profile {
        id: user.id,
        full_name,
        email: user.email.clone(),
        phone: req.phone.clone().filter(|p| !p.is_empty()),
        role,
        created_at: Utc::now(),
    };
    let Value::Object(row) = serde_json::to_value(&profile)? else {
        return Err(ServerError::Internal("Profile is not an object".to_string()));
    };
    state.row_store.insert(Collection::Profiles, row)?;

    let session = state.session_store.create(&user)?;
    set_session_cookie(&cookies, &session.id.0);

    if let Err(e) = state.mailer.send_welcome(&user.email, &profile.full_name) {
        tracing::warn!(email = %user.email, error = %e, "Failed to send welcome mail");
    }

    tracing::info!(user_id = %user.id, role = %role, "Account created");
    Ok((StatusCode::CREATED, Json(session.to_client())))
}

/// POST /auth/v1/token
pub async fn token<U, S, R, M>(
    State(state): State<Arc<AppState<U, S, R, M>>>,
    cookies: Cookies,
    Json(req): Json<Credentials>,
) -> Result<Json<sahayata_core::Session>, ServerError>
where
    U: UserStore,
    S: SessionStore,
    R: RowStore,
    M: Mailer,
{
    let user = state
        .user_store
        .get_user_by_email(&req.email)?
        .ok_or(ServerError::InvalidCredentials)?;

    let valid = verify_password(&req.password, &user.password_hash)
        .map_err(|e| ServerError::Internal(e.to_string()))?;
    if !valid {
        tracing::debug!(user_id = %user.id, "Wrong password");
        return Err(ServerError::InvalidCredentials);
    }

    let session = state.session_store.create(&user)?;
    set_session_cookie(&cookies, &session.id.0);

    tracing::info!(user_id = %user.id, "Signed in");
    Ok(Json(session.to_client()))
}

/// POST /auth/v1/logout
pub async fn logout<U, S, R, M>(
    State(state): State<Arc<AppState<U, S, R, M>>>,
    cookies: Cookies,
) -> Json<LogoutResponse>
where
    U: UserStore,
    S: SessionStore,
    R: RowStore,
    M: Mailer,
{
    match get_session_from_cookies(&cookies, state.session_store.as_ref()) {
        Ok(Some(session)) => {
            if let Err(e) = state.session_store.delete(&session.id) {
                tracing::warn!(error = %e, "Failed to delete session");
            }
        }
        Ok(None) => {}
        Err(e) => tracing::warn!(error = %e, "Session lookup failed during logout"),
    }

    clear_session_cookie(&cookies);

    Json(LogoutResponse { success: true })
}

/// GET /auth/v1/session
pub async fn get_session<U, S, R, M>(
    State(state): State<Arc<AppState<U, S, R, M>>>,
    cookies: Cookies,
) -> Result<Json<SessionResponse>, ServerError>
where
    U: UserStore,
    S: SessionStore,
    R: RowStore,
    M: Mailer,
{
    let session = get_session_from_cookies(&cookies, state.session_store.as_ref())?;
    Ok(Json(SessionResponse {
        session: session.map(|s| s.to_client()),
    }))
}
