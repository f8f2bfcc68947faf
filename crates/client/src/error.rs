//! Error types for the authenticated API client.

use std::sync::Arc;

use reqwest::StatusCode;
use thiserror::Error;

use crate::store::StoreError;

/// Errors surfaced to callers of [`crate::ApiClient`].
///
/// Recoverable authentication failures never reach callers; they are handled
/// by the refresh cycle. Everything else is one of the variants below.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport failure, including timeouts.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Request path could not be turned into a URL.
    #[error("invalid request URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// 401 on a request that was already replayed after a refresh.
    #[error("unauthorized{}", format_message(.payload.as_ref()))]
    Unauthorized {
        /// Server-provided error body.
        payload: Option<serde_json::Value>,
    },

    /// 403 from the backend.
    #[error("access denied{}", format_message(.payload.as_ref()))]
    Forbidden {
        /// Server-provided error body.
        payload: Option<serde_json::Value>,
    },

    /// 500 from the backend.
    #[error("server error{}", format_message(.payload.as_ref()))]
    ServerFault {
        /// Server-provided error body.
        payload: Option<serde_json::Value>,
    },

    /// Any other non-success status.
    #[error("HTTP {status}{}", format_message(.payload.as_ref()))]
    Status {
        /// Response status.
        status: StatusCode,
        /// Server-provided error body.
        payload: Option<serde_json::Value>,
    },

    /// A 401 arrived but no refresh token is stored.
    #[error("no refresh token available")]
    MissingRefreshToken,

    /// The task leading a refresh went away before publishing an outcome.
    #[error("token refresh was abandoned")]
    RefreshAbandoned,

    /// The session could not be recovered and has been torn down.
    ///
    /// Every caller caught in the same refresh cycle receives the same cause.
    #[error("session ended: {0}")]
    SessionEnded(Arc<ApiError>),

    /// JSON (de)serialization failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Credential store failure.
    #[error("credential store error: {0}")]
    Store(#[from] StoreError),
}

impl ApiError {
    /// HTTP status carried by this error, if any.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Unauthorized { .. } => Some(StatusCode::UNAUTHORIZED),
            Self::Forbidden { .. } => Some(StatusCode::FORBIDDEN),
            Self::ServerFault { .. } => Some(StatusCode::INTERNAL_SERVER_ERROR),
            Self::Status { status, .. } => Some(*status),
            Self::Http(e) => e.status(),
            Self::SessionEnded(cause) => cause.status(),
            _ => None,
        }
    }

    /// Server-provided error body, if any.
    #[must_use]
    pub fn payload(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Unauthorized { payload }
            | Self::Forbidden { payload }
            | Self::ServerFault { payload }
            | Self::Status { payload, .. } => payload.as_ref(),
            Self::SessionEnded(cause) => cause.payload(),
            _ => None,
        }
    }

    /// The `message` field of the server-provided error body.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.payload()
            .and_then(|p| p.get("message"))
            .and_then(serde_json::Value::as_str)
    }

    /// Whether this error ended the local session.
    #[must_use]
    pub const fn is_session_ended(&self) -> bool {
        matches!(self, Self::SessionEnded(_) | Self::Unauthorized { .. })
    }

    /// Whether this is a transport failure rather than a server response.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        match self {
            Self::Http(e) => e.status().is_none(),
            Self::SessionEnded(cause) => cause.is_transport(),
            _ => false,
        }
    }
}

fn format_message(payload: Option<&serde_json::Value>) -> String {
    payload
        .and_then(|p| p.get("message"))
        .and_then(serde_json::Value::as_str)
        .map(|m| format!(": {m}"))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_status_error_display_uses_server_message() {
        let err = ApiError::Status {
            status: StatusCode::NOT_FOUND,
            payload: Some(json!({"status": 404, "message": "Brand not found"})),
        };
        assert_eq!(err.to_string(), "HTTP 404 Not Found: Brand not found");
        assert_eq!(err.message(), Some("Brand not found"));
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    }

    #[test]
    fn test_forbidden_without_payload() {
        let err = ApiError::Forbidden { payload: None };
        assert_eq!(err.to_string(), "access denied");
        assert!(err.message().is_none());
        assert!(!err.is_session_ended());
    }

    #[test]
    fn test_session_ended_delegates_to_cause() {
        let cause = Arc::new(ApiError::Status {
            status: StatusCode::BAD_REQUEST,
            payload: Some(json!({"message": "Refresh token expired"})),
        });
        let err = ApiError::SessionEnded(cause);
        assert!(err.is_session_ended());
        assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
        assert_eq!(err.message(), Some("Refresh token expired"));
        assert_eq!(
            err.to_string(),
            "session ended: HTTP 400 Bad Request: Refresh token expired"
        );
    }

    #[test]
    fn test_missing_refresh_token_display() {
        let err = ApiError::SessionEnded(Arc::new(ApiError::MissingRefreshToken));
        assert_eq!(err.to_string(), "session ended: no refresh token available");
        assert!(!err.is_transport());
    }
}
