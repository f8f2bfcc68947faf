//! Request and response bodies of the `/auth` endpoints.

use serde::{Deserialize, Serialize};

use super::envelope::ResponseApi;
use super::profile::Role;
use super::token::TokenPair;

/// Email/password login.
#[derive(Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Customer self-registration.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub full_name: String,
    /// ISO date, e.g. `1999-12-31`.
    pub date_of_birth: String,
    pub phone: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl std::fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("full_name", &self.full_name)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

/// Body of `POST /auth/refresh-token`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

/// Tokens and identity returned by login, registration and social login.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub email: String,
    #[serde(default)]
    pub roles: Vec<Role>,
}

impl LoginResponse {
    /// Session tokens carried by this response.
    #[must_use]
    pub fn token_pair(&self) -> TokenPair {
        TokenPair::new(self.access_token.as_str(), self.refresh_token.as_str())
    }
}

impl std::fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginResponse")
            .field("email", &self.email)
            .field("roles", &self.roles)
            .finish_non_exhaustive()
    }
}

/// New token pair minted by the refresh endpoint.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl RefreshTokenResponse {
    /// Session tokens carried by this response.
    #[must_use]
    pub fn token_pair(&self) -> TokenPair {
        TokenPair::new(self.access_token.as_str(), self.refresh_token.as_str())
    }
}

/// Envelope returned by login-like endpoints.
pub type AuthResponse = ResponseApi<LoginResponse>;

/// Envelope returned by the refresh endpoint.
pub type RefreshTokenApiResponse = ResponseApi<RefreshTokenResponse>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    #[test]
    fn test_refresh_request_uses_camel_case() {
        let body = serde_json::to_value(RefreshTokenRequest {
            refresh_token: "r1".to_owned(),
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"refreshToken": "r1"}));
    }

    #[test]
    fn test_auth_response_to_token_pair() {
        let json = r#"{
            "status": 200,
            "message": "Login success",
            "data": {
                "accessToken": "a1",
                "refreshToken": "r1",
                "email": "admin@shop.test",
                "roles": ["ADMIN"]
            }
        }"#;

        let response: AuthResponse = serde_json::from_str(json).unwrap();
        let pair = response.data.token_pair();
        assert_eq!(pair.access_token.expose_secret(), "a1");
        assert_eq!(pair.refresh_token.expose_secret(), "r1");
        assert_eq!(response.data.roles, vec![Role::Admin]);
    }

    #[test]
    fn test_login_request_debug_hides_password() {
        let request = LoginRequest {
            email: "user@shop.test".to_owned(),
            password: "hunter2".to_owned(),
        };
        assert!(!format!("{request:?}").contains("hunter2"));
    }
}
