//! Authentication endpoints.
//!
//! Sign-in calls are exempt from refresh handling: a 401 from `/auth/login`
//! means bad credentials, not an expired session, and must not tear down
//! whatever session is currently stored.

use ecom_core::{
    AuthResponse, LoginRequest, LoginResponse, RegisterRequest, ResponseApi, TokenPair,
    UserProfile,
};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::error::ApiError;
use crate::pipeline::{ApiClient, ApiRequest};

const LOGIN_PATH: &str = "/auth/login";
const ADMIN_LOGIN_PATH: &str = "/auth/admin/login";
const REGISTER_PATH: &str = "/auth/register";
const PROFILE_PATH: &str = "/auth/profile";
const SOCIAL_LOGIN_PATH: &str = "/auth/social-login";
const SOCIAL_CALLBACK_PATH: &str = "/auth/social-login/callback";

/// Login, registration, profile and logout.
#[derive(Debug, Clone)]
pub struct AuthService {
    client: ApiClient,
}

impl AuthService {
    #[must_use]
    pub const fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Storefront login. Replaces any stored session.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Status` with the backend's message for rejected
    /// credentials, or a transport/store error.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
        self.sign_in(ApiRequest::post(LOGIN_PATH), request).await
    }

    /// Dashboard login for admin and staff accounts. Replaces any stored
    /// session.
    ///
    /// # Errors
    ///
    /// See [`AuthService::login`].
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn admin_login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
        self.sign_in(ApiRequest::post(ADMIN_LOGIN_PATH), request).await
    }

    /// Register a customer account.
    ///
    /// The backend answers with an empty envelope, so no session is created
    /// and the store is left untouched; sign in afterwards with
    /// [`AuthService::login`].
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Status` with the backend's message when the account
    /// is rejected (e.g. email taken), or a transport error.
    #[instrument(skip(self, account), fields(email = %account.email))]
    pub async fn register(&self, account: &RegisterRequest) -> Result<(), ApiError> {
        let request = ApiRequest::post(REGISTER_PATH)
            .json(account)?
            .skip_auth_refresh();
        let _: ResponseApi<Option<serde_json::Value>> = self.client.fetch(request).await?;
        info!(email = %account.email, "Registered");
        Ok(())
    }

    async fn sign_in<B: Serialize + ?Sized>(
        &self,
        request: ApiRequest,
        body: &B,
    ) -> Result<LoginResponse, ApiError> {
        let request = request.json(body)?.skip_auth_refresh();
        let response: AuthResponse = self.client.fetch(request).await?;
        self.persist(response.into_data())
    }

    fn persist(&self, login: LoginResponse) -> Result<LoginResponse, ApiError> {
        self.client.store().replace_tokens(&login.token_pair())?;
        info!(email = %login.email, roles = ?login.roles, "Signed in");
        Ok(login)
    }

    /// URL of the provider's consent page for `login_type` (e.g. `google`).
    ///
    /// # Errors
    ///
    /// Returns any pipeline error.
    #[instrument(skip(self))]
    pub async fn social_login_url(&self, login_type: &str) -> Result<String, ApiError> {
        let request = ApiRequest::get(SOCIAL_LOGIN_PATH).query("login_type", login_type);
        let response: ResponseApi<String> = self.client.fetch(request).await?;
        Ok(response.into_data())
    }

    /// Complete a social login with the provider's authorization `code`.
    ///
    /// # Errors
    ///
    /// See [`AuthService::login`].
    #[instrument(skip(self, code))]
    pub async fn social_login_callback(
        &self,
        login_type: &str,
        code: &str,
    ) -> Result<LoginResponse, ApiError> {
        let request = ApiRequest::get(SOCIAL_CALLBACK_PATH)
            .query("login_type", login_type)
            .query("code", code)
            .skip_auth_refresh();
        let response: AuthResponse = self.client.fetch(request).await?;
        self.persist(response.into_data())
    }

    /// Fetch the signed-in user's profile and cache it in the store.
    ///
    /// # Errors
    ///
    /// Returns any pipeline error, including `ApiError::SessionEnded` if the
    /// session could not be refreshed.
    #[instrument(skip(self))]
    pub async fn profile(&self) -> Result<UserProfile, ApiError> {
        let response: ResponseApi<UserProfile> = self.client.get(PROFILE_PATH).await?;
        let profile = response.into_data();
        self.client.store().set_user_profile(&profile)?;
        Ok(profile)
    }

    /// Exchange the stored refresh token for a new pair outside of the
    /// pipeline's 401 handling.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::MissingRefreshToken` if no session is stored, or the
    /// refresh endpoint's error. The stored session is left untouched on
    /// failure.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<TokenPair, ApiError> {
        let refresh_token = self
            .client
            .store()
            .refresh_token()
            .ok_or(ApiError::MissingRefreshToken)?;
        let pair = self.client.request_token_refresh(&refresh_token).await?;
        self.client.store().set_tokens(&pair)?;
        Ok(pair)
    }

    /// Invalidate the session on the backend and clear local credentials.
    ///
    /// Local credentials are cleared even when the backend call fails.
    ///
    /// # Errors
    ///
    /// Returns the backend call's error after clearing, or a store error.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), ApiError> {
        let store = self.client.store();
        let refresh_token = store.refresh_token();
        let revoked = self.client.revoke_session(refresh_token.as_ref()).await;
        store.clear()?;

        if let Err(ref e) = revoked {
            warn!(error = %e, "Backend logout failed, local session cleared");
        } else {
            info!("Signed out");
        }
        revoked
    }
}
