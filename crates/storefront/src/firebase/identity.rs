//! Identity Toolkit REST client.
//!
//! All credential handling (password storage, OTP issuance and checking)
//! lives in the backend; this client only relays sign-in requests and maps
//! the backend's error codes onto [`AuthError`].

use std::sync::Arc;

use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::instrument;

use tidepool_core::{Email, Uid};

use crate::config::FirebaseConfig;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] tidepool_core::EmailError),

    /// Invalid credentials (wrong password or unknown account).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// An account with this email already exists.
    #[error("account already exists")]
    AccountExists,

    /// Password rejected by the backend.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// OTP code wrong or expired.
    #[error("invalid or expired verification code")]
    InvalidCode,

    /// Too many attempts; the backend is throttling this client.
    #[error("too many attempts, try again later")]
    TooManyAttempts,

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Unrecognized backend error code.
    #[error("backend error: {0}")]
    Backend(String),
}

/// An authenticated backend identity.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// Backend-assigned user ID.
    pub uid: Uid,
    /// Email, when the account has one (phone sign-ins may not).
    pub email: Option<Email>,
}

/// An in-flight OTP challenge.
///
/// The opaque `session_info` must be echoed back on verification. Stored
/// in the session between the send and verify steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpChallenge {
    /// Opaque backend token binding the code to this send.
    pub session_info: String,
}

/// Client for the Identity Toolkit REST API.
#[derive(Clone)]
pub struct IdentityClient {
    inner: Arc<IdentityClientInner>,
}

struct IdentityClientInner {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl IdentityClient {
    /// Create a new Identity Toolkit client.
    #[must_use]
    pub fn new(config: &FirebaseConfig) -> Self {
        Self {
            inner: Arc::new(IdentityClientInner {
                client: reqwest::Client::new(),
                base_url: "https://identitytoolkit.googleapis.com/v1".to_string(),
                api_key: config.api_key.expose_secret().to_string(),
            }),
        }
    }

    /// Register a new account with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` for malformed emails,
    /// `AuthError::AccountExists` if the email is taken, and
    /// `AuthError::WeakPassword` when the backend rejects the password.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        // Validate shape locally before the round trip
        let email = Email::parse(email)?;

        let body = self
            .call(
                "accounts:signUp",
                &json!({
                    "email": email.as_str(),
                    "password": password,
                    "returnSecureToken": true,
                }),
            )
            .await?;

        Ok(auth_user_from_response(&body))
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for a wrong password or an
    /// unknown account.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        let email = Email::parse(email)?;

        let body = self
            .call(
                "accounts:signInWithPassword",
                &json!({
                    "email": email.as_str(),
                    "password": password,
                    "returnSecureToken": true,
                }),
            )
            .await?;

        Ok(auth_user_from_response(&body))
    }

    /// Start a phone OTP sign-in. Returns the challenge to echo on verify.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TooManyAttempts` when the backend throttles the
    /// number.
    #[instrument(skip(self), fields(phone = %phone_number))]
    pub async fn send_otp(&self, phone_number: &str) -> Result<OtpChallenge, AuthError> {
        let body = self
            .call(
                "accounts:sendVerificationCode",
                &json!({ "phoneNumber": phone_number }),
            )
            .await?;

        let session_info = body
            .get("sessionInfo")
            .and_then(Value::as_str)
            .ok_or_else(|| AuthError::Backend("missing sessionInfo".to_string()))?
            .to_string();

        Ok(OtpChallenge { session_info })
    }

    /// Complete a phone OTP sign-in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCode` for a wrong or expired code.
    #[instrument(skip(self, code))]
    pub async fn verify_otp(
        &self,
        challenge: &OtpChallenge,
        code: &str,
    ) -> Result<AuthUser, AuthError> {
        let body = self
            .call(
                "accounts:signInWithPhoneNumber",
                &json!({
                    "sessionInfo": challenge.session_info,
                    "code": code,
                }),
            )
            .await?;

        Ok(auth_user_from_response(&body))
    }

    /// POST to an Identity Toolkit endpoint and map error codes.
    async fn call(&self, endpoint: &str, body: &Value) -> Result<Value, AuthError> {
        let url = format!("{}/{endpoint}", self.inner.base_url);

        let response = self
            .inner
            .client
            .post(url)
            .query(&[("key", self.inner.api_key.as_str())])
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let payload: Value = response.json().await?;

        if status.is_success() {
            return Ok(payload);
        }

        let code = payload
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(Value::as_str)
            .unwrap_or("UNKNOWN");

        Err(map_error_code(code))
    }
}

/// Map Identity Toolkit error codes onto [`AuthError`] variants.
fn map_error_code(code: &str) -> AuthError {
    // Codes may carry a suffix, e.g. "WEAK_PASSWORD : Password should be..."
    let (head, detail) = match code.split_once(':') {
        Some((head, detail)) => (head.trim(), detail.trim()),
        None => (code.trim(), ""),
    };

    match head {
        "EMAIL_EXISTS" => AuthError::AccountExists,
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" | "USER_DISABLED" => {
            AuthError::InvalidCredentials
        }
        "WEAK_PASSWORD" => AuthError::WeakPassword(if detail.is_empty() {
            "password too weak".to_string()
        } else {
            detail.to_string()
        }),
        "INVALID_CODE" | "SESSION_EXPIRED" | "INVALID_SESSION_INFO" => AuthError::InvalidCode,
        "TOO_MANY_ATTEMPTS_TRY_LATER" | "QUOTA_EXCEEDED" => AuthError::TooManyAttempts,
        other => AuthError::Backend(other.to_string()),
    }
}

/// Build an [`AuthUser`] from a sign-in/sign-up response payload.
fn auth_user_from_response(body: &Value) -> AuthUser {
    let uid = body
        .get("localId")
        .and_then(Value::as_str)
        .unwrap_or_default();

    let email = body
        .get("email")
        .and_then(Value::as_str)
        .and_then(|s| Email::parse(s).ok());

    AuthUser {
        uid: Uid::new(uid),
        email,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_map_error_code_known() {
        assert!(matches!(
            map_error_code("EMAIL_EXISTS"),
            AuthError::AccountExists
        ));
        assert!(matches!(
            map_error_code("INVALID_LOGIN_CREDENTIALS"),
            AuthError::InvalidCredentials
        ));
        assert!(matches!(map_error_code("INVALID_CODE"), AuthError::InvalidCode));
        assert!(matches!(
            map_error_code("TOO_MANY_ATTEMPTS_TRY_LATER"),
            AuthError::TooManyAttempts
        ));
    }

    #[test]
    fn test_map_error_code_weak_password_detail() {
        let err = map_error_code("WEAK_PASSWORD : Password should be at least 6 characters");
        match err {
            AuthError::WeakPassword(msg) => {
                assert_eq!(msg, "Password should be at least 6 characters");
            }
            other => panic!("expected WeakPassword, got {other:?}"),
        }
    }

    #[test]
    fn test_map_error_code_unknown() {
        assert!(matches!(map_error_code("SOMETHING_NEW"), AuthError::Backend(_)));
    }

    #[test]
    fn test_auth_user_from_response() {
        let body = serde_json::json!({
            "localId": "u-123",
            "email": "user@example.com",
            "idToken": "…",
        });
        let user = auth_user_from_response(&body);
        assert_eq!(user.uid.as_str(), "u-123");
        assert_eq!(user.email.unwrap().as_str(), "user@example.com");
    }
}
