use std::sync::{PoisonError, RwLock};

use ecom_core::{TokenPair, UserProfile};
use secrecy::SecretString;

use super::{CredentialStore, StoreError};

#[derive(Default)]
struct Session {
    tokens: Option<TokenPair>,
    profile: Option<UserProfile>,
}

/// In-process credential store.
#[derive(Default)]
pub struct MemoryCredentialStore {
    session: RwLock<Session>,
}

impl MemoryCredentialStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `pair`.
    #[must_use]
    pub fn with_tokens(pair: TokenPair) -> Self {
        Self {
            session: RwLock::new(Session {
                tokens: Some(pair),
                profile: None,
            }),
        }
    }

    fn read<T>(&self, f: impl FnOnce(&Session) -> T) -> T {
        let session = self.session.read().unwrap_or_else(PoisonError::into_inner);
        f(&session)
    }

    fn write(&self, f: impl FnOnce(&mut Session)) {
        let mut session = self.session.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut session);
    }
}

impl std::fmt::Debug for MemoryCredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCredentialStore")
            .field("has_token", &self.has_token())
            .finish_non_exhaustive()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn access_token(&self) -> Option<SecretString> {
        self.read(|s| s.tokens.as_ref().map(|t| t.access_token.clone()))
    }

    fn refresh_token(&self) -> Option<SecretString> {
        self.read(|s| s.tokens.as_ref().map(|t| t.refresh_token.clone()))
    }

    fn set_tokens(&self, pair: &TokenPair) -> Result<(), StoreError> {
        self.write(|s| s.tokens = Some(pair.clone()));
        Ok(())
    }

    fn user_profile(&self) -> Option<UserProfile> {
        self.read(|s| s.profile.clone())
    }

    fn set_user_profile(&self, profile: &UserProfile) -> Result<(), StoreError> {
        self.write(|s| s.profile = Some(profile.clone()));
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.write(|s| *s = Session::default());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use ecom_core::Role;
    use secrecy::ExposeSecret;

    use super::*;

    fn profile() -> UserProfile {
        UserProfile {
            id: Some("7".to_owned()),
            email: "customer@shop.test".to_owned(),
            full_name: "Customer".to_owned(),
            roles: vec![Role::Customer],
            avatar: None,
            phone: None,
            address: None,
        }
    }

    #[test]
    fn test_empty_store() {
        let store = MemoryCredentialStore::new();
        assert!(store.access_token().is_none());
        assert!(store.refresh_token().is_none());
        assert!(!store.has_token());
        assert!(!store.has_profile());
    }

    #[test]
    fn test_set_session_and_clear() {
        let store = MemoryCredentialStore::new();
        store
            .set_session(&TokenPair::new("a1", "r1"), &profile())
            .unwrap();

        assert_eq!(store.access_token().unwrap().expose_secret(), "a1");
        assert_eq!(store.refresh_token().unwrap().expose_secret(), "r1");
        assert_eq!(store.user_profile().unwrap().id.as_deref(), Some("7"));

        store.clear().unwrap();
        assert!(!store.has_token());
        assert!(!store.has_profile());
    }

    #[test]
    fn test_replace_tokens_drops_profile() {
        let store = MemoryCredentialStore::with_tokens(TokenPair::new("a1", "r1"));
        store.set_user_profile(&profile()).unwrap();

        store.replace_tokens(&TokenPair::new("a2", "r2")).unwrap();
        assert_eq!(store.access_token().unwrap().expose_secret(), "a2");
        assert!(store.user_profile().is_none());
    }
}
