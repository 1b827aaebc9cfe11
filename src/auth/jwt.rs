//! Token Codec
//! Mission: Sign and verify access/refresh tokens with separate secrets

use crate::auth::models::{Claims, Identity};
use crate::config::JwtConfig;
use chrono::Utc;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use std::time::Duration;
use tracing::debug;

/// Why a token failed verification. The HTTP layer collapses all of these
/// into 401, but the distinction is kept for logging.
#[derive(Debug, PartialEq, Eq)]
pub enum TokenError {
    /// Signature valid but `exp` is in the past.
    Expired,
    /// Malformed token, bad signature, or wrong algorithm.
    Invalid,
    /// Authorization header is not of the form `Bearer <token>`.
    InvalidFormat,
    Other(String),
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenError::Expired => write!(f, "Token expired"),
            TokenError::Invalid => write!(f, "Invalid token"),
            TokenError::InvalidFormat => {
                write!(f, "Invalid authorization format. Use: Bearer <token>")
            }
            TokenError::Other(msg) => write!(f, "Token verification failed: {msg}"),
        }
    }
}

impl std::error::Error for TokenError {}

/// Codec for the two bearer token classes.
///
/// Access and refresh tokens are signed with distinct symmetric secrets and
/// a fixed HS256 algorithm; a token of one class never verifies against the
/// other's secret.
pub struct TokenCodec {
    access_secret: String,
    refresh_secret: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenCodec {
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            access_secret: config.access_secret.clone(),
            refresh_secret: config.refresh_secret.clone(),
            access_ttl: config.access_ttl,
            refresh_ttl: config.refresh_ttl,
        }
    }

    /// Issue a short-lived access token for per-request authorization.
    pub fn issue_access(&self, identity: &Identity) -> Result<String, TokenError> {
        self.sign(identity, &self.access_secret, self.access_ttl)
    }

    /// Issue a long-lived refresh token, used only to mint new access tokens.
    pub fn issue_refresh(&self, identity: &Identity) -> Result<String, TokenError> {
        self.sign(identity, &self.refresh_secret, self.refresh_ttl)
    }

    pub fn verify_access(&self, token: &str) -> Result<Identity, TokenError> {
        self.verify(token, &self.access_secret)
    }

    pub fn verify_refresh(&self, token: &str) -> Result<Identity, TokenError> {
        self.verify(token, &self.refresh_secret)
    }

    /// Refresh flow: a valid refresh token yields a fresh access token.
    ///
    /// `verify_refresh` returns an `Identity` with the old timestamps already
    /// stripped, so the new token gets its own `iat`/`exp`.
    pub fn refresh_access(&self, refresh_token: &str) -> Result<String, TokenError> {
        let identity = self.verify_refresh(refresh_token)?;
        self.issue_access(&identity)
    }

    fn sign(
        &self,
        identity: &Identity,
        secret: &str,
        ttl: Duration,
    ) -> Result<String, TokenError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: identity.id.clone(),
            email: identity.email.clone(),
            name: identity.name.clone(),
            role: identity.role,
            iat: now,
            exp: now + ttl.as_secs() as i64,
        };

        debug!(
            "Signing token for {} (ttl {}s)",
            identity.email,
            ttl.as_secs()
        );

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .map_err(|e| TokenError::Other(e.to_string()))
    }

    fn verify(&self, token: &str, secret: &str) -> Result<Identity, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let decoded = decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidToken
            | ErrorKind::InvalidSignature
            | ErrorKind::InvalidAlgorithm
            | ErrorKind::Base64(_)
            | ErrorKind::Json(_)
            | ErrorKind::Utf8(_) => TokenError::Invalid,
            _ => TokenError::Other(e.to_string()),
        })?;

        Ok(decoded.claims.identity())
    }
}

/// Extract the token from an `Authorization` header value.
///
/// Accepts exactly `Bearer <token>` with a non-empty token; anything else,
/// including a missing header, is an `InvalidFormat`.
pub fn extract_bearer(header: Option<&str>) -> Result<&str, TokenError> {
    let token = header
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or(TokenError::InvalidFormat)?;
    if token.is_empty() {
        return Err(TokenError::InvalidFormat);
    }
    Ok(token)
}

/// Decode a token without verifying its signature or expiry.
///
/// Diagnostics only. Never call this on the authorization path: the result
/// is attacker-controlled.
pub fn decode_unverified(token: &str) -> Result<Claims, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.required_spec_claims.clear();

    decode::<Claims>(token, &DecodingKey::from_secret(b""), &validation)
        .map(|data| data.claims)
        .map_err(|_| TokenError::Invalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::Role;

    fn test_codec() -> TokenCodec {
        TokenCodec::new(&JwtConfig {
            access_secret: "access-secret-for-tests-0123456789".to_string(),
            refresh_secret: "refresh-secret-for-tests-0123456789".to_string(),
            access_ttl: Duration::from_secs(900),
            refresh_ttl: Duration::from_secs(604_800),
        })
    }

    fn test_identity() -> Identity {
        Identity {
            id: "user-1".to_string(),
            email: "ada@example.com".to_string(),
            name: "Ada".to_string(),
            role: Role::User,
        }
    }

    #[test]
    fn test_access_round_trip() {
        let codec = test_codec();
        let identity = test_identity();

        let token = codec.issue_access(&identity).unwrap();
        let verified = codec.verify_access(&token).unwrap();
        assert_eq!(verified, identity);
    }

    #[test]
    fn test_refresh_round_trip() {
        let codec = test_codec();
        let identity = test_identity();

        let token = codec.issue_refresh(&identity).unwrap();
        let verified = codec.verify_refresh(&token).unwrap();
        assert_eq!(verified, identity);
    }

    #[test]
    fn test_token_classes_not_interchangeable() {
        let codec = test_codec();
        let identity = test_identity();

        let access = codec.issue_access(&identity).unwrap();
        let refresh = codec.issue_refresh(&identity).unwrap();

        assert_eq!(codec.verify_refresh(&access), Err(TokenError::Invalid));
        assert_eq!(codec.verify_access(&refresh), Err(TokenError::Invalid));
    }

    #[test]
    fn test_expired_token_reports_expired_not_invalid() {
        let codec = test_codec();
        let now = Utc::now().timestamp();

        // Hand-roll a token whose exp is already in the past, signed with
        // the correct access secret.
        let claims = Claims {
            sub: "user-1".to_string(),
            email: "ada@example.com".to_string(),
            name: "Ada".to_string(),
            role: Role::User,
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"access-secret-for-tests-0123456789"),
        )
        .unwrap();

        assert_eq!(codec.verify_access(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_tampered_token_rejected() {
        let codec = test_codec();
        let token = codec.issue_access(&test_identity()).unwrap();

        let mut tampered = token.into_bytes();
        let last = tampered.len() - 1;
        tampered[last] = if tampered[last] == b'A' { b'B' } else { b'A' };
        let tampered = String::from_utf8(tampered).unwrap();

        assert!(codec.verify_access(&tampered).is_err());
    }

    #[test]
    fn test_refresh_mints_fresh_access_token() {
        let codec = test_codec();
        let identity = test_identity();

        let refresh = codec.issue_refresh(&identity).unwrap();
        let access = codec.refresh_access(&refresh).unwrap();

        let verified = codec.verify_access(&access).unwrap();
        assert_eq!(verified, identity);

        // New token carries fresh timestamps derived from the access TTL,
        // not the refresh token's 7-day expiry.
        let claims = decode_unverified(&access).unwrap();
        let now = Utc::now().timestamp();
        assert!(claims.exp <= now + 900 + 5);
        assert!(claims.exp > now);
    }

    #[test]
    fn test_refresh_rejects_access_token() {
        let codec = test_codec();
        let access = codec.issue_access(&test_identity()).unwrap();
        assert_eq!(codec.refresh_access(&access), Err(TokenError::Invalid));
    }

    #[test]
    fn test_extract_bearer() {
        assert_eq!(extract_bearer(Some("Bearer abc")).unwrap(), "abc");
        assert_eq!(extract_bearer(Some("abc")), Err(TokenError::InvalidFormat));
        assert_eq!(extract_bearer(Some("")), Err(TokenError::InvalidFormat));
        assert_eq!(
            extract_bearer(Some("Bearer ")),
            Err(TokenError::InvalidFormat)
        );
        assert_eq!(
            extract_bearer(Some("bearer abc")),
            Err(TokenError::InvalidFormat)
        );
        assert_eq!(extract_bearer(None), Err(TokenError::InvalidFormat));
    }

    #[test]
    fn test_decode_unverified_ignores_signature() {
        let codec = test_codec();
        let token = codec.issue_access(&test_identity()).unwrap();

        // Works even though we hand it no secret.
        let claims = decode_unverified(&token).unwrap();
        assert_eq!(claims.sub, "user-1");
    }
}
