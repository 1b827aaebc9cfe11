//! Authentication Models
//! Mission: Define the identity claim and wire-level auth payloads

use serde::{Deserialize, Serialize};

/// User roles for access control.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Role {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "admin")]
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::User
    }
}

/// The decoded payload of a verified token. Attached to the request for one
/// request-response cycle; never persisted by the authorization pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
}

/// Raw JWT claims. Timestamps are set by the codec at issue time and
/// stripped again on verification, so refreshed tokens never inherit the
/// old `iat`/`exp`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn identity(&self) -> Identity {
        Identity {
            id: self.sub.clone(),
            email: self.email.clone(),
            name: self.name.clone(),
            role: self.role,
        }
    }
}

/// POST /api/auth/register body
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub name: String,
}

/// POST /api/auth/login body
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// POST /api/auth/refresh body
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    #[serde(rename = "refreshToken", default)]
    pub refresh_token: String,
}

/// Token pair issued on register/login.
#[derive(Debug, Serialize)]
pub struct TokenPair {
    #[serde(rename = "accessToken")]
    pub access_token: String,
    #[serde(rename = "refreshToken")]
    pub refresh_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), r#""admin""#);
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), r#""user""#);

        let role: Role = serde_json::from_str(r#""user""#).unwrap();
        assert_eq!(role, Role::User);
    }

    #[test]
    fn test_claims_to_identity_strips_timestamps() {
        let claims = Claims {
            sub: "42".to_string(),
            email: "a@b.c".to_string(),
            name: "Ada".to_string(),
            role: Role::User,
            iat: 1_700_000_000,
            exp: 1_700_000_900,
        };

        let identity = claims.identity();
        assert_eq!(identity.id, "42");
        assert_eq!(identity.role, Role::User);
        // Identity carries no iat/exp; a token minted from it gets fresh ones.
        let json = serde_json::to_value(&identity).unwrap();
        assert!(json.get("iat").is_none());
        assert!(json.get("exp").is_none());
    }

    #[test]
    fn test_refresh_request_wire_name() {
        let req: RefreshRequest = serde_json::from_str(r#"{"refreshToken": "abc"}"#).unwrap();
        assert_eq!(req.refresh_token, "abc");
    }
}
