//! Authentication route handlers.
//!
//! Credential checks are fully delegated to the Identity Toolkit; these
//! handlers only translate between JSON requests, the session, and the
//! per-user sync stores. Signing in attaches the user's cart and wishlist
//! stores (rehydrating from their mirror documents), tearing down the
//! previous user's first if the session is changing hands; signing out
//! detaches them and destroys the session.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::firebase::{AuthUser, OtpChallenge};
use crate::middleware::{clear_current_user, set_current_user};
use crate::models::{CurrentUser, session_keys};
use crate::state::AppState;

/// Email/password credentials.
#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Start-OTP request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendOtpRequest {
    pub phone_number: String,
}

/// Verify-OTP request.
#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    pub code: String,
}

/// The signed-in identity returned by register/login/verify.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub uid: String,
    pub email: Option<String>,
}

/// Record the authenticated user in the session and attach their stores.
async fn establish_session(
    state: &AppState,
    session: &Session,
    auth_user: AuthUser,
) -> Result<UserResponse> {
    let user = CurrentUser {
        uid: auth_user.uid,
        email: auth_user.email,
    };

    // A session can swap identities without a sign-out in between; the
    // previous user's subscriptions must not outlive their session.
    let previous = session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .unwrap_or_default();

    set_current_user(session, &user)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to write session: {e}")))?;

    set_sentry_user(&user.uid, user.email.as_ref().map(tidepool_core::Email::as_str));

    // Rehydrates cart and wishlist from the user's mirror documents
    state
        .stores()
        .reattach(previous.as_ref().map(|p| &p.uid), &user.uid);

    Ok(UserResponse {
        uid: user.uid.into_inner(),
        email: user.email.map(|e| e.as_str().to_owned()),
    })
}

/// Register a new account with email and password, then sign in.
#[instrument(skip(state, session, creds))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Json(creds): Json<Credentials>,
) -> Result<Json<UserResponse>> {
    let auth_user = state
        .identity()
        .sign_up(&creds.email, &creds.password)
        .await?;
    let user = establish_session(&state, &session, auth_user).await?;
    Ok(Json(user))
}

/// Sign in with email and password.
#[instrument(skip(state, session, creds))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(creds): Json<Credentials>,
) -> Result<Json<UserResponse>> {
    let auth_user = state
        .identity()
        .sign_in(&creds.email, &creds.password)
        .await?;
    let user = establish_session(&state, &session, auth_user).await?;
    Ok(Json(user))
}

/// Sign out: detach the stores, clear the session.
#[instrument(skip(state, session))]
pub async fn logout(State(state): State<AppState>, session: Session) -> Json<serde_json::Value> {
    if let Ok(Some(user)) = session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
    {
        state.stores().detach(&user.uid);
    }

    clear_sentry_user();

    if let Err(e) = clear_current_user(&session).await {
        tracing::error!("Failed to clear session: {}", e);
    }

    // Also destroy the entire session
    if let Err(e) = session.flush().await {
        tracing::error!("Failed to flush session: {}", e);
    }

    Json(serde_json::json!({ "status": "signed_out" }))
}

/// Start a phone OTP sign-in. The challenge is held in the session until
/// the code is verified.
#[instrument(skip(state, session, req))]
pub async fn send_otp(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<SendOtpRequest>,
) -> Result<Json<serde_json::Value>> {
    let challenge = state.identity().send_otp(&req.phone_number).await?;

    session
        .insert(session_keys::OTP_CHALLENGE, &challenge)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to write session: {e}")))?;

    Ok(Json(serde_json::json!({ "status": "code_sent" })))
}

/// Complete a phone OTP sign-in.
#[instrument(skip(state, session, req))]
pub async fn verify_otp(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<VerifyOtpRequest>,
) -> Result<Json<UserResponse>> {
    let challenge: OtpChallenge = session
        .get(session_keys::OTP_CHALLENGE)
        .await
        .ok()
        .flatten()
        .ok_or_else(|| AppError::BadRequest("No pending phone verification".to_string()))?;

    let auth_user = state.identity().verify_otp(&challenge, &req.code).await?;

    if let Err(e) = session
        .remove::<OtpChallenge>(session_keys::OTP_CHALLENGE)
        .await
    {
        tracing::warn!("Failed to clear OTP challenge from session: {}", e);
    }

    let user = establish_session(&state, &session, auth_user).await?;
    Ok(Json(user))
}
