//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `ECOM_API_BASE_URL` - Backend base URL (default: `http://localhost:8080/api/v1`)
//! - `ECOM_API_TIMEOUT_SECS` - Per-request timeout in seconds (default: 10)
//! - `ECOM_LOGIN_ROUTE` - Route opened when the session ends (default: `/login`)
//! - `ECOM_CREDENTIALS_PATH` - File used by the file credential store

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_BASE_URL: &str = "http://localhost:8080/api/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_LOGIN_ROUTE: &str = "/login";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Transport and session settings for [`crate::ApiClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL every request path is appended to.
    pub base_url: Url,
    /// Transport-level timeout applied to every request.
    pub timeout: Duration,
    /// Route the navigator is sent to when the session cannot be recovered.
    pub login_route: String,
    /// Where the file credential store keeps the session, if configured.
    pub credentials_path: Option<PathBuf>,
}

impl ClientConfig {
    /// Configuration for `base_url` with default timeout and login route.
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            login_route: DEFAULT_LOGIN_ROUTE.to_owned(),
            credentials_path: None,
        }
    }

    /// Override the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the login route.
    #[must_use]
    pub fn with_login_route(mut self, route: impl Into<String>) -> Self {
        self.login_route = route.into();
        self
    }

    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if a variable is set but cannot be
    /// parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = get_env_or_default("ECOM_API_BASE_URL", DEFAULT_BASE_URL);
        let base_url = parse_base_url(&base_url)?;

        let timeout_secs = get_env_or_default("ECOM_API_TIMEOUT_SECS", "10")
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidEnvVar("ECOM_API_TIMEOUT_SECS".to_owned(), e.to_string()))?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "ECOM_API_TIMEOUT_SECS".to_owned(),
                "must be greater than zero".to_owned(),
            ));
        }

        let login_route = get_env_or_default("ECOM_LOGIN_ROUTE", DEFAULT_LOGIN_ROUTE);
        let credentials_path = std::env::var("ECOM_CREDENTIALS_PATH")
            .ok()
            .filter(|p| !p.is_empty())
            .map(PathBuf::from);

        Ok(Self {
            base_url,
            timeout: Duration::from_secs(timeout_secs),
            login_route,
            credentials_path,
        })
    }

    /// Absolute URL for `path` below the base URL.
    ///
    /// `Url::join` would drop the base path (`/api/v1`) for absolute paths, so
    /// segments are concatenated instead.
    ///
    /// # Errors
    ///
    /// Returns an error if the combined string is not a valid URL.
    pub fn endpoint(&self, path: &str) -> Result<Url, url::ParseError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Url::parse(&format!("{base}/{path}"))
    }
}

fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw)
        .map_err(|e| ConfigError::InvalidEnvVar("ECOM_API_BASE_URL".to_owned(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            "ECOM_API_BASE_URL".to_owned(),
            format!("unsupported scheme: {}", url.scheme()),
        ));
    }
    Ok(url)
}

fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config(base: &str) -> ClientConfig {
        ClientConfig::new(Url::parse(base).unwrap())
    }

    #[test]
    fn test_defaults() {
        let config = config("http://localhost:8080/api/v1");
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.login_route, "/login");
        assert!(config.credentials_path.is_none());
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let config = config("http://localhost:8080/api/v1");
        assert_eq!(
            config.endpoint("/auth/refresh-token").unwrap().as_str(),
            "http://localhost:8080/api/v1/auth/refresh-token"
        );

        let config = config_with_trailing_slash();
        assert_eq!(
            config.endpoint("brands/3").unwrap().as_str(),
            "http://shop.test/api/brands/3"
        );
    }

    fn config_with_trailing_slash() -> ClientConfig {
        config("http://shop.test/api/")
    }

    #[test]
    fn test_builder_overrides() {
        let config = config("http://shop.test")
            .with_timeout(Duration::from_millis(250))
            .with_login_route("/admin/login");
        assert_eq!(config.timeout, Duration::from_millis(250));
        assert_eq!(config.login_route, "/admin/login");
    }

    #[test]
    fn test_rejects_non_http_scheme() {
        assert!(matches!(
            parse_base_url("ftp://shop.test"),
            Err(ConfigError::InvalidEnvVar(..))
        ));
        assert!(parse_base_url("not a url").is_err());
    }
}
