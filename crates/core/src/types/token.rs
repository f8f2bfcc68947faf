//! Session token types.

use secrecy::{ExposeSecret, SecretString};

/// The access/refresh token pair that represents one authenticated session.
///
/// Only one pair is active at a time. Logging in again, whatever the role,
/// replaces the previous pair.
#[derive(Clone)]
pub struct TokenPair {
    /// Short-lived credential sent as a bearer token.
    pub access_token: SecretString,
    /// Longer-lived credential exchanged for a new pair.
    pub refresh_token: SecretString,
}

impl TokenPair {
    /// Create a token pair from raw token strings.
    #[must_use]
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: SecretString::from(access_token.into()),
            refresh_token: SecretString::from(refresh_token.into()),
        }
    }
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .finish()
    }
}

/// Format an access token as an `Authorization` header value.
#[must_use]
pub fn bearer_value(access_token: &SecretString) -> String {
    format!("Bearer {}", access_token.expose_secret())
}
