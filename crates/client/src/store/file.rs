use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use ecom_core::{TokenPair, UserProfile};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::warn;

use super::{CredentialStore, StoreError};

/// On-disk layout of the session document.
#[derive(Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredSession {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_data: Option<UserProfile>,
}

impl StoredSession {
    const fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none() && self.user_data.is_none()
    }
}

/// Credential store backed by a JSON file.
///
/// The document is read once, on first access, and kept in memory; reads
/// never touch the disk afterwards. Every write replaces the file atomically
/// through a uniquely named temporary file in the same directory.
pub struct FileCredentialStore {
    path: PathBuf,
    /// `None` until the file has been loaded.
    cache: RwLock<Option<StoredSession>>,
}

impl FileCredentialStore {
    /// Store persisting to `path`. The file is created on first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: RwLock::new(None),
        }
    }

    /// Location of the session document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Cached session, loading it from disk on first use.
    fn session(&self) -> StoredSession {
        if let Some(session) = &*self.cache.read().unwrap_or_else(PoisonError::into_inner) {
            return session.clone();
        }

        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        cache.get_or_insert_with(|| self.load()).clone()
    }

    fn load(&self) -> StoredSession {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return StoredSession::default(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read credential file");
                return StoredSession::default();
            }
        };

        serde_json::from_slice(&bytes).unwrap_or_else(|e| {
            warn!(path = %self.path.display(), error = %e, "Ignoring corrupt credential file");
            StoredSession::default()
        })
    }

    fn update(&self, f: impl FnOnce(&mut StoredSession)) -> Result<(), StoreError> {
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        let mut session = cache.take().unwrap_or_else(|| self.load());
        f(&mut session);

        let written = if session.is_empty() {
            self.remove_file()
        } else {
            self.persist(&session)
        };
        // The in-memory session stays current even if the disk write failed
        *cache = Some(session);
        written
    }

    fn persist(&self, session: &StoredSession) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_vec_pretty(session)?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&json)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }

    fn remove_file(&self) -> Result<(), StoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl std::fmt::Debug for FileCredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileCredentialStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl CredentialStore for FileCredentialStore {
    fn access_token(&self) -> Option<SecretString> {
        self.session().access_token.map(SecretString::from)
    }

    fn refresh_token(&self) -> Option<SecretString> {
        self.session().refresh_token.map(SecretString::from)
    }

    fn set_tokens(&self, pair: &TokenPair) -> Result<(), StoreError> {
        self.update(|s| {
            s.access_token = Some(pair.access_token.expose_secret().to_owned());
            s.refresh_token = Some(pair.refresh_token.expose_secret().to_owned());
        })
    }

    fn user_profile(&self) -> Option<UserProfile> {
        self.session().user_data
    }

    fn set_user_profile(&self, profile: &UserProfile) -> Result<(), StoreError> {
        self.update(|s| s.user_data = Some(profile.clone()))
    }

    fn clear(&self) -> Result<(), StoreError> {
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        *cache = Some(StoredSession::default());
        self.remove_file()
    }
}
