//! End-to-end tests for the ecom request pipeline.
//!
//! Each test starts a `wiremock` server standing in for the backend and
//! drives a real [`ApiClient`] against it, recording navigations and notices
//! so the session-ending behaviour can be asserted.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p ecom-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `refresh_pipeline` - Single-flight refresh, queueing and teardown
//! - `error_handling` - 403/500 notices, status errors and timeouts
//! - `services` - Auth, upload and collection wrappers

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use ecom_client::{
    ApiClient, ClientConfig, CredentialStore, MemoryCredentialStore, Navigator, Notice, Notifier,
};
use ecom_core::TokenPair;
use secrecy::ExposeSecret;
use serde_json::{Value, json};
use url::Url;
use wiremock::MockServer;

/// Path prefix the backend serves the API under.
pub const API_PREFIX: &str = "/api/v1";

/// Route the navigator is sent to when a session ends.
pub const LOGIN_ROUTE: &str = "/login";

/// Full mock-server path for an API path, e.g. `/products` -> `/api/v1/products`.
#[must_use]
pub fn api(path: &str) -> String {
    format!("{API_PREFIX}{path}")
}

/// Backend `ResponseApi` envelope around `data`.
#[must_use]
pub fn envelope(data: Value) -> Value {
    json!({ "status": 200, "message": "OK", "data": data })
}

/// Backend error body.
#[must_use]
pub fn error_body(status: u16, message: &str) -> Value {
    json!({ "status": status, "message": message, "data": null })
}

/// Successful refresh response.
#[must_use]
pub fn refresh_body(access: &str, refresh: &str) -> Value {
    envelope(json!({ "accessToken": access, "refreshToken": refresh }))
}

/// Successful login response.
#[must_use]
pub fn login_body(access: &str, refresh: &str, email: &str, roles: &[&str]) -> Value {
    envelope(json!({
        "accessToken": access,
        "refreshToken": refresh,
        "email": email,
        "roles": roles,
    }))
}

/// Navigator that records every redirect.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    routes: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    /// Routes redirected to so far, in order.
    pub fn routes(&self) -> Vec<String> {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Navigator for RecordingNavigator {
    fn redirect(&self, route: &str) {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(route.to_owned());
    }
}

/// Notifier that records every notice.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    /// Notices raised so far, in order.
    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notice);
    }
}

/// A mock backend plus a client wired to it with recording collaborators.
pub struct TestBackend {
    pub server: MockServer,
    pub client: ApiClient,
    pub store: Arc<dyn CredentialStore>,
    pub navigator: Arc<RecordingNavigator>,
    pub notifier: Arc<RecordingNotifier>,
}

impl TestBackend {
    /// Backend with an empty session.
    pub async fn start() -> Self {
        Self::with_store(Arc::new(MemoryCredentialStore::new()), None).await
    }

    /// Backend with `access`/`refresh` already stored.
    pub async fn signed_in(access: &str, refresh: &str) -> Self {
        let store = MemoryCredentialStore::with_tokens(TokenPair::new(access, refresh));
        Self::with_store(Arc::new(store), None).await
    }

    /// Backend over an arbitrary store, optionally with a request timeout.
    ///
    /// # Panics
    ///
    /// Panics if the mock server URI is not a valid URL.
    pub async fn with_store(store: Arc<dyn CredentialStore>, timeout: Option<Duration>) -> Self {
        let server = MockServer::start().await;
        let base_url =
            Url::parse(&format!("{}{API_PREFIX}", server.uri())).expect("mock server URI");

        let mut config = ClientConfig::new(base_url).with_login_route(LOGIN_ROUTE);
        if let Some(timeout) = timeout {
            config = config.with_timeout(timeout);
        }

        let navigator = Arc::new(RecordingNavigator::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let client = Self::client_for(config, Arc::clone(&store), &navigator, &notifier);

        Self {
            server,
            client,
            store,
            navigator,
            notifier,
        }
    }

    fn client_for(
        config: ClientConfig,
        store: Arc<dyn CredentialStore>,
        navigator: &Arc<RecordingNavigator>,
        notifier: &Arc<RecordingNotifier>,
    ) -> ApiClient {
        ApiClient::builder(config)
            .store(store)
            .navigator(Arc::clone(navigator) as Arc<dyn Navigator>)
            .notifier(Arc::clone(notifier) as Arc<dyn Notifier>)
            .build()
            .expect("HTTP client")
    }

    /// Stored access token, exposed for assertions.
    pub fn access_token(&self) -> Option<String> {
        self.store
            .access_token()
            .map(|t| t.expose_secret().to_owned())
    }

    /// Stored refresh token, exposed for assertions.
    pub fn refresh_token(&self) -> Option<String> {
        self.store
            .refresh_token()
            .map(|t| t.expose_secret().to_owned())
    }
}
