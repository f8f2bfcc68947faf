//! Command implementations.
//!
//! Every command builds its [`ApiClient`] from the same [`Context`], so the
//! session file written by `login` is the one later commands read.

pub mod auth;
pub mod request;

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use ecom_client::{
    ApiClient, ApiError, ClientConfig, ConfigError, CredentialStore, FileCredentialStore,
    StoreError,
};
use thiserror::Error;

/// Session file used when `ECOM_CREDENTIALS_PATH` is not set.
pub const DEFAULT_CREDENTIALS_PATH: &str = ".ecom/credentials.json";

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Backend request failed.
    #[error("Request failed: {0}")]
    Api(#[from] ApiError),

    /// Session file could not be read or written.
    #[error("Credential store error: {0}")]
    Store(#[from] StoreError),

    /// Local file or terminal I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Response could not be rendered.
    #[error("Output error: {0}")]
    Output(#[from] serde_json::Error),

    /// Command needs a session that is not there.
    #[error("Not signed in. Run `ecom login` first")]
    NotSignedIn,
}

/// Configuration and credential store shared by all commands.
pub struct Context {
    config: ClientConfig,
    store: Arc<FileCredentialStore>,
}

impl Context {
    /// Read configuration from the environment.
    ///
    /// # Errors
    ///
    /// Returns `CliError::Config` if an environment variable is invalid.
    pub fn from_env() -> Result<Self, CliError> {
        let config = ClientConfig::from_env()?;
        let credentials_path = config
            .credentials_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CREDENTIALS_PATH));

        Ok(Self {
            config,
            store: Arc::new(FileCredentialStore::new(credentials_path)),
        })
    }

    /// Session file backing this context.
    pub fn store(&self) -> &FileCredentialStore {
        &self.store
    }

    /// Pipeline client over the session file.
    ///
    /// # Errors
    ///
    /// Returns `CliError::Api` if the HTTP client cannot be built.
    pub fn client(&self) -> Result<ApiClient, CliError> {
        Ok(ApiClient::builder(self.config.clone())
            .store(Arc::clone(&self.store) as Arc<dyn CredentialStore>)
            .build()?)
    }
}

/// Pretty-print `value` to stdout.
///
/// # Errors
///
/// Returns `CliError::Output` or `CliError::Io` if writing fails.
pub fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}
