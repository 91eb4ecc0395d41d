//! Bearer token handling.
//!
//! Tokens are never logged. [`BearerToken`] prints as a short SHA-256
//! fingerprint and can decode the `exp` claim of JWT-shaped tokens.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use sha2::{Digest, Sha256};

/// Prefix of a base64url-encoded JSON object, i.e. the first segment of a JWT.
pub const JWT_PREFIX: &str = "eyJ";

/// An opaque credential presented as `Authorization: Bearer <token>`.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Parse the value of an `Authorization` header.
    ///
    /// Returns `None` unless the value is `Bearer <non-empty token>`.
    #[must_use]
    pub fn from_authorization_header(value: &str) -> Option<Self> {
        let token = value.trim().strip_prefix("Bearer ")?.trim();
        if token.is_empty() {
            None
        } else {
            Some(Self::new(token))
        }
    }

    /// Raw token text, for building request headers only.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// `Bearer <token>` header value.
    #[must_use]
    pub fn header_value(&self) -> String {
        format!("Bearer {}", self.0)
    }

    /// First 8 bytes of the SHA-256 digest, hex encoded.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.0.as_bytes());
        hex::encode(&digest[..8])
    }

    #[must_use]
    pub fn is_jwt_shaped(&self) -> bool {
        looks_like_jwt(&self.0)
    }

    /// Expiry decoded from the JWT `exp` claim, if the token carries one.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        decode_exp_claim(&self.0)
    }

    /// True when the token is a JWT whose `exp` is at or before `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|exp| exp <= now)
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BearerToken({})", self.fingerprint())
    }
}

impl fmt::Display for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "token:{}", self.fingerprint())
    }
}

/// True when `value` has the shape `eyJ….….…`.
#[must_use]
pub fn looks_like_jwt(value: &str) -> bool {
    value.starts_with(JWT_PREFIX) && value.split('.').count() == 3
}

#[derive(Debug, Deserialize)]
struct ExpClaim {
    #[serde(default)]
    exp: Option<i64>,
}

fn decode_exp_claim(token: &str) -> Option<DateTime<Utc>> {
    let mut parts = token.split('.');
    let (_header, payload, _signature) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    let decoded = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: ExpClaim = serde_json::from_slice(&decoded).ok()?;
    DateTime::from_timestamp(claims.exp?, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_jwt(payload: &str) -> String {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(payload);
        format!("{header}.{body}.signature")
    }

    #[test]
    fn parses_bearer_header() {
        let token = BearerToken::from_authorization_header("Bearer abc.def").unwrap();
        assert_eq!(token.expose(), "abc.def");
        assert_eq!(token.header_value(), "Bearer abc.def");
        assert!(BearerToken::from_authorization_header("Basic abc").is_none());
        assert!(BearerToken::from_authorization_header("Bearer ").is_none());
    }

    #[test]
    fn debug_and_display_hide_token() {
        let token = BearerToken::new("super-secret-token");
        assert!(!format!("{token:?}").contains("super-secret"));
        assert!(!token.to_string().contains("super-secret"));
        assert_eq!(token.fingerprint().len(), 16);
    }

    #[test]
    fn decodes_exp_claim() {
        let token = BearerToken::new(make_jwt(r#"{"sub":"1","exp":1767225600}"#));
        assert!(token.is_jwt_shaped());
        let exp = token.expires_at().unwrap();
        assert_eq!(exp.timestamp(), 1_767_225_600);
        assert!(token.is_expired_at(exp));
        assert!(!token.is_expired_at(DateTime::from_timestamp(0, 0).unwrap()));
    }

    #[test]
    fn opaque_tokens_never_expire() {
        let token = BearerToken::new("opaque");
        assert!(!token.is_jwt_shaped());
        assert!(token.expires_at().is_none());
        assert!(!token.is_expired_at(Utc::now()));
    }

    #[test]
    fn jwt_without_exp_has_no_expiry() {
        let token = BearerToken::new(make_jwt(r#"{"sub":"1"}"#));
        assert!(token.expires_at().is_none());
    }
}
