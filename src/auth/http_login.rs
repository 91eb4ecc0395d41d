//! Direct form-login replay.
//!
//! Walks the identity-provider login with a cookie-jar client:
//! portal root, redirect to the login page, scrape hidden form fields,
//! POST the form, follow redirects back to the portal. The bearer token is
//! normally attached by in-page JavaScript, so this strategy only succeeds
//! when the portal also drops a JWT-shaped cookie.

use std::sync::Arc;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Client, Response, Url};

use super::{Authenticator, INTERACTIVE_CAPTURE_MESSAGE, accept_token};
use crate::core::http::build_login_client;
use crate::core::token::JWT_PREFIX;
use crate::core::{BearerToken, Credential};
use crate::error::{RsmError, Result};
use crate::storage::Config;

static INPUT_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<input\b[^>]*>").expect("valid regex"));
static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)([a-z_:][-a-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("valid regex")
});
static FORM_ACTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<form\b[^>]*\baction\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("valid regex")
});
static LOGIN_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)https?://[^\s"'<>]*(?:login|signin|sign-in|authorize)[^\s"'<>]*"#)
        .expect("valid regex")
});

/// Path fragments that mark an identity-provider login page.
const LOGIN_PATH_MARKERS: &[&str] = &["login", "signin", "sign-in", "authorize"];

/// Hidden fields and target of the login form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginForm {
    pub action: Option<String>,
    pub csrf_field: String,
    pub csrf_token: String,
    pub state: String,
    pub email_field: String,
    pub password_field: String,
}

impl LoginForm {
    /// Scrape the login form from `html`.
    ///
    /// Returns `None` unless both a CSRF input and a `state` input exist.
    #[must_use]
    pub fn parse(html: &str) -> Option<Self> {
        let mut csrf = None;
        let mut state = None;
        let mut email_field = None;
        let mut password_field = None;

        for tag in INPUT_TAG.find_iter(html) {
            let attrs = attributes(tag.as_str());
            let get = |key: &str| {
                attrs
                    .iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(key))
                    .map(|(_, v)| v.clone())
            };
            let Some(name) = get("name") else { continue };
            let kind = get("type").unwrap_or_default().to_lowercase();
            let lower = name.to_lowercase();

            if lower.contains("csrf") && csrf.is_none() {
                csrf = Some((name, get("value").unwrap_or_default()));
            } else if lower == "state" && state.is_none() {
                state = get("value");
            } else if kind == "password" && password_field.is_none() {
                password_field = Some(name);
            } else if (kind == "email" || matches!(lower.as_str(), "email" | "username" | "login"))
                && email_field.is_none()
            {
                email_field = Some(name);
            }
        }

        let (csrf_field, csrf_token) = csrf?;
        let action = FORM_ACTION
            .captures(html)
            .and_then(|c| c.get(1).or_else(|| c.get(2)))
            .map(|m| decode_entities(m.as_str()))
            .filter(|a| !a.is_empty());

        Some(Self {
            action,
            csrf_field,
            csrf_token,
            state: state?,
            email_field: email_field.unwrap_or_else(|| "email".to_string()),
            password_field: password_field.unwrap_or_else(|| "password".to_string()),
        })
    }

    fn fields<'a>(&'a self, credential: &'a Credential) -> Vec<(&'a str, &'a str)> {
        vec![
            (self.email_field.as_str(), credential.account.as_str()),
            (self.password_field.as_str(), credential.secret.as_str()),
            (self.csrf_field.as_str(), self.csrf_token.as_str()),
            ("state", self.state.as_str()),
        ]
    }
}

fn attributes(tag: &str) -> Vec<(String, String)> {
    ATTRIBUTE
        .captures_iter(tag)
        .filter_map(|c| {
            let key = c.get(1)?.as_str().to_string();
            let value = c.get(2).or_else(|| c.get(3))?.as_str();
            Some((key, decode_entities(value)))
        })
        .collect()
}

fn decode_entities(value: &str) -> String {
    value
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&#x2F;", "/")
        .replace("&#47;", "/")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

fn is_login_path(url: &Url) -> bool {
    let path = url.path().to_lowercase();
    LOGIN_PATH_MARKERS.iter().any(|m| path.contains(m))
}

fn is_portal(url: &Url, portal_host: Option<&str>) -> bool {
    url.host_str() == portal_host && !is_login_path(url)
}

/// Find the identity-provider login page after loading the portal root.
///
/// The final URL wins when the redirect chain already left the portal;
/// otherwise the page body is searched for a login link.
#[must_use]
pub fn resolve_login_url(final_url: &Url, portal_host: Option<&str>, body: &str) -> Option<Url> {
    if !is_portal(final_url, portal_host) {
        return Some(final_url.clone());
    }
    LOGIN_LINK
        .find(body)
        .and_then(|m| Url::parse(&decode_entities(m.as_str())).ok())
}

/// First cookie value that looks like a JWT.
#[must_use]
pub fn find_token_cookie<'a>(values: impl IntoIterator<Item = &'a str>) -> Option<BearerToken> {
    values
        .into_iter()
        .map(str::trim)
        .find(|v| v.starts_with(JWT_PREFIX))
        .map(BearerToken::new)
}

fn cookie_values(header: &str) -> impl Iterator<Item = &str> {
    header
        .split(';')
        .filter_map(|pair| pair.split_once('=').map(|(_, v)| v))
}

/// Strategy B: replay the login form over plain HTTP.
#[derive(Debug, Clone)]
pub struct HttpLoginAuthenticator {
    portal_url: String,
    portal_host: Option<String>,
    login_endpoint: Option<String>,
    timeout: Duration,
}

impl HttpLoginAuthenticator {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            portal_url: config.portal.login_url(),
            portal_host: config.portal.host(),
            login_endpoint: config.auth.login_endpoint.clone(),
            timeout: config.general.timeout(),
        }
    }

    async fn get(client: &Client, url: &str, step: &str) -> Result<Response> {
        client
            .get(url)
            .send()
            .await
            .map_err(|e| RsmError::auth(format!("{step} request failed: {e}")))
    }

    async fn text(resp: Response, step: &str) -> Result<String> {
        resp.text()
            .await
            .map_err(|e| RsmError::auth(format!("{step} response unreadable: {e}")))
    }
}

impl Authenticator for HttpLoginAuthenticator {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn authenticate(&self, credential: &Credential) -> Result<BearerToken> {
        let jar = Arc::new(Jar::default());
        let client = build_login_client(Arc::clone(&jar), self.timeout)?;
        let portal_host = self.portal_host.as_deref();

        tracing::info!(url = %self.portal_url, "Loading portal");
        let resp = Self::get(&client, &self.portal_url, "portal").await?;
        let landed = resp.url().clone();
        let body = Self::text(resp, "portal").await?;
        let login_url = resolve_login_url(&landed, portal_host, &body)
            .ok_or_else(|| RsmError::auth("could not locate the identity-provider login page"))?;

        tracing::debug!(url = %login_url, "Loading login page");
        let resp = Self::get(&client, login_url.as_str(), "login page").await?;
        let page_url = resp.url().clone();
        let html = Self::text(resp, "login page").await?;
        let form = LoginForm::parse(&html)
            .ok_or_else(|| RsmError::auth("login page is missing the CSRF token or state"))?;

        let endpoint = match (&self.login_endpoint, &form.action) {
            (Some(configured), _) => Url::parse(configured)
                .map_err(|e| RsmError::auth(format!("invalid login endpoint '{configured}': {e}")))?,
            (None, Some(action)) => page_url
                .join(action)
                .map_err(|e| RsmError::auth(format!("invalid form action '{action}': {e}")))?,
            (None, None) => page_url,
        };

        tracing::debug!(url = %endpoint, "Submitting login form");
        let resp = client
            .post(endpoint)
            .form(&form.fields(credential))
            .send()
            .await
            .map_err(|e| RsmError::auth(format!("login request failed: {e}")))?;

        let status = resp.status();
        let arrived = resp.url().clone();
        if status.is_client_error() || status.is_server_error() {
            return Err(RsmError::auth(format!("login rejected: HTTP {}", status.as_u16())));
        }
        if !is_portal(&arrived, portal_host) {
            tracing::warn!(url = %arrived, "Login did not return to the portal");
            return Err(RsmError::auth("login did not return to the portal"));
        }

        let response_cookies: Vec<String> = resp.cookies().map(|c| c.value().to_string()).collect();
        let jar_cookies = jar
            .cookies(&arrived)
            .and_then(|h| h.to_str().ok().map(str::to_string))
            .unwrap_or_default();

        let token = find_token_cookie(
            response_cookies
                .iter()
                .map(String::as_str)
                .chain(cookie_values(&jar_cookies)),
        );

        match token {
            Some(token) => accept_token(self.name(), token),
            None => {
                tracing::warn!("Login succeeded but no token cookie was set");
                Err(RsmError::auth(INTERACTIVE_CAPTURE_MESSAGE))
            }
        }
    }
}
