//! Cached user profile and roles.

use serde::{Deserialize, Serialize};

/// Role granted to a user by the backend.
///
/// Unknown role strings are preserved so that new backend roles do not break
/// profile decoding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    /// Full access to the administrative dashboard.
    Admin,
    /// Staff member with dashboard access.
    Staff,
    /// Storefront customer.
    Customer,
    /// Any role this client does not know about.
    Other(String),
}

impl Role {
    /// Wire name of the role.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Admin => "ADMIN",
            Self::Staff => "STAFF",
            Self::Customer => "CUSTOMER",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        match value.trim_start_matches("ROLE_").to_ascii_uppercase().as_str() {
            "ADMIN" => Self::Admin,
            "STAFF" => Self::Staff,
            "CUSTOMER" | "USER" => Self::Customer,
            _ => Self::Other(value),
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_owned()
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Profile of the signed-in user, cached alongside the session tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Backend identifier. The profile endpoint does not send one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Login email.
    pub email: String,
    /// Display name.
    #[serde(alias = "name")]
    pub full_name: String,
    /// Granted roles.
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl UserProfile {
    /// Whether the user holds `role`.
    #[must_use]
    pub fn has_role(&self, role: &Role) -> bool {
        self.roles.contains(role)
    }

    /// Whether the user may use the administrative dashboard.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.has_role(&Role::Admin) || self.has_role(&Role::Staff)
    }
}
