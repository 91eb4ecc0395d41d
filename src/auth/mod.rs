//! Session authentication.
//!
//! Turns a [`Credential`] into a [`BearerToken`] accepted by the portal's
//! GraphQL endpoint. Two strategies exist:
//!
//! - [`BrowserAuthenticator`]: drives a headless Chrome through the login
//!   form and records the `Authorization` header of the first GraphQL call
//!   the page makes.
//! - [`HttpLoginAuthenticator`]: replays the login form with a cookie-jar
//!   HTTP client. Succeeds only when the token ends up in a cookie.

pub mod browser;
pub mod capture;
pub mod http_login;

use chrono::Utc;

use crate::core::{BearerToken, Credential};
use crate::error::{RsmError, Result};
use crate::storage::{Config, StrategyKind};

pub use browser::{BrowserAuthenticator, BrowserSettings};
pub use http_login::HttpLoginAuthenticator;

/// Failure message when the browser never observed a bearer token.
pub const NO_TOKEN_MESSAGE: &str = "Could not retrieve Bearer token";

/// Failure message when the direct login cannot reach the token.
pub const INTERACTIVE_CAPTURE_MESSAGE: &str = "token extraction requires interactive capture";

/// Exchanges a credential for a bearer token.
#[allow(async_fn_in_trait)]
pub trait Authenticator {
    /// Strategy name for logs.
    fn name(&self) -> &'static str;

    /// Log in as `credential` and return the portal bearer token.
    ///
    /// # Errors
    ///
    /// Returns an auth error if login fails or no token is observed.
    async fn authenticate(&self, credential: &Credential) -> Result<BearerToken>;
}

/// Strategy chosen by configuration.
pub enum AuthStrategy {
    Browser(BrowserAuthenticator),
    Http(HttpLoginAuthenticator),
}

impl AuthStrategy {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        match config.auth.strategy {
            StrategyKind::Browser => Self::Browser(BrowserAuthenticator::new(
                BrowserSettings::from_config(config),
            )),
            StrategyKind::Http => Self::Http(HttpLoginAuthenticator::from_config(config)),
        }
    }
}

impl Authenticator for AuthStrategy {
    fn name(&self) -> &'static str {
        match self {
            Self::Browser(a) => a.name(),
            Self::Http(a) => a.name(),
        }
    }

    async fn authenticate(&self, credential: &Credential) -> Result<BearerToken> {
        match self {
            Self::Browser(a) => a.authenticate(credential).await,
            Self::Http(a) => a.authenticate(credential).await,
        }
    }
}

/// Log the token fingerprint and expiry, rejecting tokens that are already
/// expired.
///
/// # Errors
///
/// Returns an auth error for a JWT whose `exp` is in the past.
pub fn accept_token(strategy: &str, token: BearerToken) -> Result<BearerToken> {
    let expires_at = token.expires_at();
    if token.is_expired_at(Utc::now()) {
        tracing::warn!(
            strategy,
            fingerprint = %token.fingerprint(),
            expires_at = ?expires_at,
            "Captured bearer token is already expired"
        );
        return Err(RsmError::auth("captured bearer token is already expired"));
    }
    tracing::info!(
        strategy,
        fingerprint = %token.fingerprint(),
        jwt = token.is_jwt_shaped(),
        expires_at = ?expires_at,
        "Bearer token acquired"
    );
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;

    fn jwt_with_exp(exp: i64) -> BearerToken {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none"}"#);
        let claims = URL_SAFE_NO_PAD.encode(format!(r#"{{"exp":{exp}}}"#));
        BearerToken::new(format!("{header}.{claims}.sig"))
    }

    #[test]
    fn opaque_token_is_accepted() {
        let token = accept_token("test", BearerToken::new("opaque")).unwrap();
        assert_eq!(token.expose(), "opaque");
    }

    #[test]
    fn future_jwt_is_accepted() {
        let exp = Utc::now().timestamp() + 3600;
        assert!(accept_token("test", jwt_with_exp(exp)).is_ok());
    }

    #[test]
    fn expired_jwt_is_rejected() {
        let exp = Utc::now().timestamp() - 60;
        let err = accept_token("test", jwt_with_exp(exp)).unwrap_err();
        assert!(matches!(err, RsmError::Auth { .. }));
        assert!(err.to_string().contains("expired"));
    }

    #[test]
    fn strategy_follows_config() {
        let mut config = Config::default();
        assert_eq!(AuthStrategy::from_config(&config).name(), "browser");
        config.auth.strategy = StrategyKind::Http;
        assert_eq!(AuthStrategy::from_config(&config).name(), "http");
    }
}
