//! Response envelope and the small session-related payloads.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Every API reply is wrapped in `{ success, payload }`.
///
/// On failure `payload` is a plain message string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    /// Whether the server considers the call successful.
    pub success: bool,
    /// The reply body.
    pub payload: T,
}

/// `GET /api/config` payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Whether unauthenticated callers may create items after a challenge.
    pub turnstile_enabled: bool,
    /// Opaque key used by the challenge provider.
    #[serde(default)]
    pub turnstile_site_key: String,
}

/// The logged-in user as reported by `/api/user-info` and `/api/login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Display name.
    pub name: String,
    /// Avatar URL, if the user has one.
    #[serde(default)]
    pub avatar: Option<String>,
}

/// An email/password pair, used for login and for remembered credentials.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Credentials {
    /// Account email.
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    /// Account password.
    #[validate(length(min = 1, message = "is required"))]
    pub password: String,
}

impl Credentials {
    /// Build a credential pair.
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}
