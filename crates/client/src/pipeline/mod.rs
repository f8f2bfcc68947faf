//! Authenticated request pipeline.
//!
//! Every request goes through [`ApiClient::execute`], which:
//!
//! 1. Attaches `Authorization: Bearer <access token>` from the credential store.
//! 2. On a first 401, runs one coordinated token refresh (see
//!    [`coordinator`]) and replays the request with the new token.
//! 3. On an unrecoverable 401, clears the store, makes a best-effort logout
//!    call and redirects to the login route.
//! 4. On 403/500, raises a user-visible notice.
//!
//! # Errors
//!
//! Recovered 401s never reach the caller. See [`ApiError`] for the rest.

mod coordinator;
pub mod request;

use std::sync::Arc;

use ecom_core::{RefreshTokenApiResponse, RefreshTokenRequest, TokenPair, bearer_value};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::session::{LogNavigator, LogNotifier, Navigator, Notice, Notifier, RedirectOnDrop};
use crate::store::{CredentialStore, MemoryCredentialStore};

use self::coordinator::{RefreshCoordinator, RefreshTicket};
pub use self::request::{ApiRequest, Body, FilePart};
use self::request::{Attempt, PipelineCall};

/// Token refresh endpoint.
pub const REFRESH_PATH: &str = "/auth/refresh-token";
/// Session invalidation endpoint.
pub const LOGOUT_PATH: &str = "/auth/logout";
/// Header carrying the refresh token on logout.
pub const REFRESH_TOKEN_HEADER: &str = "Refresh-Token";

/// HTTP client for the e-commerce backend with transparent token refresh.
///
/// Cheap to clone; clones share the credential store and the refresh state.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    config: ClientConfig,
    store: Arc<dyn CredentialStore>,
    navigator: Arc<dyn Navigator>,
    notifier: Arc<dyn Notifier>,
    refresh: RefreshCoordinator,
}

/// Builder for [`ApiClient`].
pub struct ApiClientBuilder {
    config: ClientConfig,
    store: Option<Arc<dyn CredentialStore>>,
    navigator: Option<Arc<dyn Navigator>>,
    notifier: Option<Arc<dyn Notifier>>,
}

impl ApiClientBuilder {
    /// Credential store to read and write tokens. Defaults to an empty
    /// in-memory store.
    #[must_use]
    pub fn store(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Navigator used for the login redirect. Defaults to [`LogNavigator`].
    #[must_use]
    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    /// Notifier for 403/500 notices. Defaults to [`LogNotifier`].
    #[must_use]
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the underlying HTTP client cannot be
    /// created.
    pub fn build(self) -> Result<ApiClient, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .timeout(self.config.timeout)
            .default_headers(headers)
            .build()?;

        Ok(ApiClient {
            inner: Arc::new(ApiClientInner {
                http,
                config: self.config,
                store: self
                    .store
                    .unwrap_or_else(|| Arc::new(MemoryCredentialStore::new())),
                navigator: self.navigator.unwrap_or_else(|| Arc::new(LogNavigator)),
                notifier: self.notifier.unwrap_or_else(|| Arc::new(LogNotifier)),
                refresh: RefreshCoordinator::new(),
            }),
        })
    }
}

impl ApiClient {
    /// Start building a client for `config`.
    #[must_use]
    pub fn builder(config: ClientConfig) -> ApiClientBuilder {
        ApiClientBuilder {
            config,
            store: None,
            navigator: None,
            notifier: None,
        }
    }

    /// Client configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Credential store shared with this client.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.inner.store
    }

    /// Whether a token refresh is currently in flight.
    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        self.inner.refresh.is_refreshing()
    }

    /// Number of requests parked behind the in-flight refresh.
    #[must_use]
    pub fn pending_requests(&self) -> usize {
        self.inner.refresh.pending()
    }

    // =========================================================================
    // Pipeline
    // =========================================================================

    /// Send `request` through the pipeline.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::SessionEnded` when a 401 could not be recovered,
    /// `ApiError::Unauthorized` when a replayed request is rejected again,
    /// `ApiError::Forbidden`/`ApiError::ServerFault` for 403/500,
    /// `ApiError::Status` for other failure statuses and `ApiError::Http` for
    /// transport failures.
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    pub async fn execute(&self, request: ApiRequest) -> Result<Response, ApiError> {
        let mut call = PipelineCall::first(request);
        let mut token: Option<SecretString> = None;

        loop {
            let response = self.send(&call.request, token.take()).await?;
            let status = response.status();
            if status.is_success() {
                return Ok(response);
            }

            if call.request.skip_auth_refresh {
                return Err(status_error(response).await);
            }

            match status {
                StatusCode::UNAUTHORIZED if call.attempt == Attempt::First => {
                    token = Some(self.recover().await?);
                    // Followers too: a 401 on the replay ends the session.
                    call = call.retried();
                }
                StatusCode::UNAUTHORIZED => {
                    let payload = read_payload(response).await;
                    warn!("Replayed request rejected again, ending session");
                    self.end_session().await;
                    return Err(ApiError::Unauthorized { payload });
                }
                StatusCode::FORBIDDEN => {
                    self.inner.notifier.notify(Notice::AccessDenied);
                    let payload = read_payload(response).await;
                    return Err(ApiError::Forbidden { payload });
                }
                StatusCode::INTERNAL_SERVER_ERROR => {
                    self.inner.notifier.notify(Notice::ServerError);
                    let payload = read_payload(response).await;
                    return Err(ApiError::ServerFault { payload });
                }
                _ => return Err(status_error(response).await),
            }
        }
    }

    /// Obtain a fresh access token after a 401, leading or joining the
    /// refresh cycle.
    async fn recover(&self) -> Result<SecretString, ApiError> {
        match self.inner.refresh.acquire_or_enqueue() {
            RefreshTicket::Follower(waiter) => {
                debug!("Refresh already in flight, queueing request");
                waiter.wait().await.map_err(ApiError::SessionEnded)
            }
            RefreshTicket::Leader(lease) => {
                debug!("Leading token refresh");
                let outcome = self.refresh_session().await.map_err(Arc::new);
                lease.settle(outcome.clone());

                match outcome {
                    Ok(token) => Ok(token),
                    Err(cause) => {
                        warn!(error = %cause, "Token refresh failed, ending session");
                        self.end_session().await;
                        Err(ApiError::SessionEnded(cause))
                    }
                }
            }
        }
    }

    /// Exchange the stored refresh token for a new pair and persist it.
    async fn refresh_session(&self) -> Result<SecretString, ApiError> {
        let Some(refresh_token) = self.inner.store.refresh_token() else {
            return Err(ApiError::MissingRefreshToken);
        };

        let pair = self.request_token_refresh(&refresh_token).await?;
        self.inner.store.set_tokens(&pair)?;
        info!("Access token refreshed");
        Ok(pair.access_token)
    }

    /// Call the refresh endpoint directly.
    ///
    /// The call is exempt from refresh handling: any failure is returned
    /// as-is and nothing is written to the store.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Status` if the backend rejects the refresh token,
    /// `ApiError::Http` on transport failure and `ApiError::Parse` if the
    /// response body is malformed.
    #[instrument(skip_all)]
    pub async fn request_token_refresh(
        &self,
        refresh_token: &SecretString,
    ) -> Result<TokenPair, ApiError> {
        let request = ApiRequest::post(REFRESH_PATH)
            .json(&RefreshTokenRequest {
                refresh_token: refresh_token.expose_secret().to_owned(),
            })?
            .skip_auth_refresh();

        let response = self.send(&request, None).await?;
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let body: RefreshTokenApiResponse = decode(response).await?;
        Ok(body.data.token_pair())
    }

    /// Invalidate the session on the backend.
    ///
    /// Bypasses the pipeline entirely, so a 401 here never triggers a refresh.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Status` for a failure status and `ApiError::Http` on
    /// transport failure.
    #[instrument(skip_all)]
    pub async fn revoke_session(&self, refresh_token: Option<&SecretString>) -> Result<(), ApiError> {
        let url = self.inner.config.endpoint(LOGOUT_PATH)?;
        let response = self
            .inner
            .http
            .post(url)
            .header(
                REFRESH_TOKEN_HEADER,
                refresh_token.map(|t| t.expose_secret()).unwrap_or_default(),
            )
            .json(&serde_json::json!({}))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }
        Ok(())
    }

    /// Clear local credentials, attempt a backend logout and redirect to the
    /// login route.
    ///
    /// The logout call runs in its own error boundary. The redirect is issued
    /// by a drop guard once everything else has finished.
    #[instrument(skip(self))]
    async fn end_session(&self) {
        let _redirect = RedirectOnDrop::new(
            self.inner.navigator.clone(),
            self.inner.config.login_route.as_str(),
        );

        let refresh_token = self.inner.store.refresh_token();
        if let Err(e) = self.inner.store.clear() {
            warn!(error = %e, "Failed to clear stored credentials");
        }

        if let Err(e) = self.revoke_session(refresh_token.as_ref()).await {
            warn!(error = %e, "Logout failed, continuing with redirect");
        }
    }

    /// Build and send one attempt of `request`.
    ///
    /// `token` overrides the stored access token; it is set when replaying a
    /// request after a refresh.
    async fn send(
        &self,
        request: &ApiRequest,
        token: Option<SecretString>,
    ) -> Result<Response, ApiError> {
        let url = self.url_for(request)?;
        let mut builder = self.inner.http.request(request.method.clone(), url);

        if let Some(token) = token.or_else(|| self.inner.store.access_token()) {
            builder = builder.header(AUTHORIZATION, bearer_value(&token));
        }

        builder = match &request.body {
            Body::Empty => builder,
            Body::Json(value) => builder.json(value),
            Body::Multipart(files) => builder.multipart(ApiRequest::build_multipart(files)?),
        };

        Ok(builder.send().await?)
    }

    fn url_for(&self, request: &ApiRequest) -> Result<Url, ApiError> {
        let mut url = self.inner.config.endpoint(&request.path)?;
        if !request.query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(request.query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }
        Ok(url)
    }

    // =========================================================================
    // Typed helpers
    // =========================================================================

    /// Execute `request` and decode the JSON response body.
    ///
    /// # Errors
    ///
    /// Returns any pipeline error, or `ApiError::Parse` if the body does not
    /// decode into `T`.
    pub async fn fetch<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let response = self.execute(request).await?;
        decode(response).await
    }

    /// `GET path`.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::fetch`].
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.fetch(ApiRequest::get(path)).await
    }

    /// `GET path?k=v&...`.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::fetch`].
    pub async fn get_with_query<T, K, V>(&self, path: &str, query: &[(K, V)]) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        K: AsRef<str>,
        V: ToString,
    {
        let request = query
            .iter()
            .fold(ApiRequest::get(path), |request, (key, value)| {
                request.query(key.as_ref(), value.to_string())
            });
        self.fetch(request).await
    }

    /// `POST path` with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::fetch`].
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.fetch(ApiRequest::post(path).json(body)?).await
    }

    /// `PUT path` with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::fetch`].
    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.fetch(ApiRequest::put(path).json(body)?).await
    }

    /// `PUT path` without a body, ignoring the response body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::execute`].
    pub async fn put_empty(&self, path: &str) -> Result<(), ApiError> {
        self.execute(ApiRequest::put(path)).await?;
        Ok(())
    }

    /// `PATCH path` without a body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::fetch`].
    pub async fn patch<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.fetch(ApiRequest::patch(path)).await
    }

    /// `DELETE path`, ignoring the response body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::execute`].
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.execute(ApiRequest::delete(path)).await?;
        Ok(())
    }

    /// `POST path` as `multipart/form-data`.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::fetch`].
    pub async fn upload<T: DeserializeOwned>(
        &self,
        path: &str,
        files: Vec<FilePart>,
    ) -> Result<T, ApiError> {
        self.fetch(ApiRequest::post(path).multipart(files)).await
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.config.base_url.as_str())
            .field("refreshing", &self.is_refreshing())
            .finish_non_exhaustive()
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Error body of a failed response, when it is JSON.
async fn read_payload(response: Response) -> Option<serde_json::Value> {
    let bytes = response.bytes().await.ok()?;
    serde_json::from_slice(&bytes).ok()
}

async fn status_error(response: Response) -> ApiError {
    let status = response.status();
    let payload = read_payload(response).await;
    ApiError::Status { status, payload }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        ApiClient::builder(ClientConfig::new(Url::parse(base).unwrap()))
            .build()
            .unwrap()
    }

    #[test]
    fn test_url_for_appends_query() {
        let client = client("http://localhost:8080/api/v1");
        let request = ApiRequest::get("/products")
            .query("page", 2)
            .query("size", 7)
            .query("search", "green tea");

        assert_eq!(
            client.url_for(&request).unwrap().as_str(),
            "http://localhost:8080/api/v1/products?page=2&size=7&search=green+tea"
        );
    }

    #[test]
    fn test_url_for_without_query() {
        let client = client("http://localhost:8080/api/v1/");
        let request = ApiRequest::get("brands/5");
        assert_eq!(
            client.url_for(&request).unwrap().as_str(),
            "http://localhost:8080/api/v1/brands/5"
        );
    }

    #[test]
    fn test_new_client_is_idle() {
        let client = client("http://shop.test");
        assert!(!client.is_refreshing());
        assert_eq!(client.pending_requests(), 0);
        assert!(!client.store().has_token());
    }
}
