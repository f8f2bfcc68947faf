//! Credential storage.
//!
//! The pipeline reads the current tokens from a [`CredentialStore`] on every
//! request and is the only writer during a refresh or teardown.
//!
//! - [`MemoryCredentialStore`] keeps the session in process memory.
//! - [`FileCredentialStore`] persists it as a JSON document on disk.

mod file;
mod memory;

pub use file::FileCredentialStore;
pub use memory::MemoryCredentialStore;

use ecom_core::{TokenPair, UserProfile};
use secrecy::SecretString;
use thiserror::Error;

/// Errors raised while persisting credentials.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stored document could not be encoded.
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Holder of the single active session.
///
/// Implementations are shared between concurrent requests, so every method
/// takes `&self`.
pub trait CredentialStore: Send + Sync {
    /// Current access token.
    fn access_token(&self) -> Option<SecretString>;

    /// Current refresh token.
    fn refresh_token(&self) -> Option<SecretString>;

    /// Store a new token pair, replacing the previous one.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the pair cannot be persisted.
    fn set_tokens(&self, pair: &TokenPair) -> Result<(), StoreError>;

    /// Cached profile of the signed-in user.
    fn user_profile(&self) -> Option<UserProfile>;

    /// Cache the signed-in user's profile.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the profile cannot be persisted.
    fn set_user_profile(&self, profile: &UserProfile) -> Result<(), StoreError>;

    /// Remove tokens and profile.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the backing storage cannot be cleared.
    fn clear(&self) -> Result<(), StoreError>;

    /// Whether an access token is stored.
    fn has_token(&self) -> bool {
        self.access_token().is_some()
    }

    /// Whether a profile is cached.
    fn has_profile(&self) -> bool {
        self.user_profile().is_some()
    }

    /// Store tokens and profile together.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if either write fails.
    fn set_session(&self, pair: &TokenPair, profile: &UserProfile) -> Result<(), StoreError> {
        self.set_tokens(pair)?;
        self.set_user_profile(profile)
    }

    /// Drop everything stored, then store `pair`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if clearing or writing fails.
    fn replace_tokens(&self, pair: &TokenPair) -> Result<(), StoreError> {
        self.clear()?;
        self.set_tokens(pair)
    }
}
