//! HTTP client utilities.
//!
//! Builds the two clients the crate needs: the authenticated portal session
//! used by the harvester, and the cookie-jar client used by the direct
//! login flow.

use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;
use reqwest::header::{
    ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue, ORIGIN, REFERER, USER_AGENT,
};
use reqwest::{Client, ClientBuilder};

use super::token::BearerToken;
use crate::error::{RsmError, Result};

/// Default timeout for HTTP requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Browser-like user agent sent to the portal.
pub const PORTAL_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";

/// Fixed headers for the authenticated portal session.
///
/// # Errors
///
/// Returns an auth error if the token or origin contain bytes that are not
/// valid in a header value.
pub fn session_headers(token: &BearerToken, origin: &str, referer: &str) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("application/json, text/plain, */*"),
    );
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(USER_AGENT, HeaderValue::from_static(PORTAL_USER_AGENT));

    let mut auth = HeaderValue::from_str(&token.header_value())
        .map_err(|_| RsmError::auth("bearer token is not a valid header value"))?;
    auth.set_sensitive(true);
    headers.insert(AUTHORIZATION, auth);

    headers.insert(
        ORIGIN,
        HeaderValue::from_str(origin)
            .map_err(|e| RsmError::Config(format!("invalid portal origin '{origin}': {e}")))?,
    );
    headers.insert(
        REFERER,
        HeaderValue::from_str(referer)
            .map_err(|e| RsmError::Config(format!("invalid portal referer '{referer}': {e}")))?,
    );
    Ok(headers)
}

/// Build the client for an authenticated portal session.
///
/// # Errors
///
/// Returns error if client construction fails.
pub fn build_session_client(
    token: &BearerToken,
    origin: &str,
    referer: &str,
    timeout: Duration,
) -> Result<Client> {
    ClientBuilder::new()
        .timeout(timeout)
        .default_headers(session_headers(token, origin, referer)?)
        .build()
        .map_err(|e| RsmError::transport(e.to_string()))
}

/// Build a cookie-jar client that follows redirects, for form login replay.
///
/// # Errors
///
/// Returns error if client construction fails.
pub fn build_login_client(jar: Arc<Jar>, timeout: Duration) -> Result<Client> {
    ClientBuilder::new()
        .timeout(timeout)
        .user_agent(PORTAL_USER_AGENT)
        .cookie_provider(jar)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .map_err(|e| RsmError::auth(format!("failed to build login client: {e}")))
}

/// Map a request failure to a transport error.
#[must_use]
pub fn transport_error(err: &reqwest::Error, timeout: Duration) -> RsmError {
    if err.is_timeout() {
        RsmError::Timeout(timeout.as_secs())
    } else {
        RsmError::transport(err.to_string())
    }
}
