//! Session-related types.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use tidepool_core::{Email, Uid};

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the signed-in user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Firebase user ID.
    pub uid: Uid,
    /// User's email address. Absent for phone-only accounts.
    pub email: Option<Email>,
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current signed-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the pending phone verification, between sending the code
    /// and verifying it.
    pub const OTP_CHALLENGE: &str = "otp_challenge";
}
