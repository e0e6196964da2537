//! Core data type definitions

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Coarse-grained user category. Drives view gating and the post-login
/// landing page on the client; the backend re-checks authorization itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    Customer,
    Driver,
    SupportAgent,
    /// A role name this client does not know about yet
    Other(String),
}

impl Role {
    /// Wire name of the role, exactly as the backend spells it
    pub fn as_str(&self) -> &str {
        match self {
            Role::Admin => "ADMIN",
            Role::Customer => "CUSTOMER",
            Role::Driver => "DRIVER",
            Role::SupportAgent => "SUPPORT_AGENT",
            Role::Other(name) => name,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exact, case-sensitive parse. Never fails: unknown names become `Other`.
impl FromStr for Role {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "ADMIN" => Role::Admin,
            "CUSTOMER" => Role::Customer,
            "DRIVER" => Role::Driver,
            "SUPPORT_AGENT" => Role::SupportAgent,
            other => Role::Other(other.to_string()),
        })
    }
}

impl From<&str> for Role {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(role) => role,
            Err(never) => match never {},
        }
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Role::from(name.as_str()))
    }
}

/// Who is signed in. Cached next to the token and never allowed to outlive it.
///
/// Built from a sign-in response every field is present. Built from a
/// bootstrap token the fields come from the token claims and are display
/// hints only, so any of them may be missing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub user_id: Option<i64>,
    pub role: Option<Role>,
    pub display_name: Option<String>,
    pub email: Option<String>,
}

impl Identity {
    /// Name to greet the user with
    pub fn greeting_name(&self) -> &str {
        self.display_name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or("user")
    }
}

/// Body of `POST /api/auth/sign-in`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

/// Body of `POST /api/auth/sign-up`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

/// Response of sign-in and sign-up.
///
/// Every field is optional on the wire so that a response missing a
/// required field can be rejected as a whole instead of half-stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: Option<String>,
    pub role: Option<String>,
    pub user_id: Option<i64>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse_is_exact() {
        assert_eq!(Role::from("DRIVER"), Role::Driver);
        assert_eq!(Role::from("SUPPORT_AGENT"), Role::SupportAgent);
        assert_eq!(Role::from("driver"), Role::Other("driver".to_string()));
        assert_eq!(Role::from("DISPATCHER").as_str(), "DISPATCHER");
    }

    #[test]
    fn test_role_serde_uses_wire_names() {
        let json = serde_json::to_string(&Role::SupportAgent).unwrap();
        assert_eq!(json, "\"SUPPORT_AGENT\"");

        let role: Role = serde_json::from_str("\"ADMIN\"").unwrap();
        assert_eq!(role, Role::Admin);
    }

    #[test]
    fn test_auth_response_tolerates_missing_fields() {
        let response: AuthResponse =
            serde_json::from_str(r#"{"accessToken":"t","role":"CUSTOMER"}"#).unwrap();
        assert_eq!(response.access_token.as_deref(), Some("t"));
        assert_eq!(response.user_id, None);
    }

    #[test]
    fn test_identity_greeting_falls_back_to_email() {
        let identity = Identity {
            email: Some("ann@example.com".to_string()),
            ..Default::default()
        };
        assert_eq!(identity.greeting_name(), "ann@example.com");
    }
}
