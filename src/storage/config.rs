//! Configuration file loading and management.
//!
//! Loads configuration from:
//! - Linux/macOS: `~/.config/rsm-monitor/config.toml`
//! - Windows: `%APPDATA%/rsm-monitor/config.toml`
//!
//! ## Precedence
//!
//! Settings are resolved with the following precedence (highest first):
//! 1. CLI flags
//! 2. Environment variables
//! 3. Config file
//! 4. Built-in defaults
//!
//! ## Environment Variables
//!
//! - `RSM_CONFIG`: Override config file path
//! - `RSM_EMAIL`: Portal account email
//! - `RSM_SECRET_ID`: Secret holding the account password
//! - `RSM_SECRET_BACKEND`: `aws`, `keyring`, or `file`
//! - `RSM_AWS_REGION`: Secrets Manager region
//! - `RSM_CREDENTIALS_FILE`: Local credential file path
//! - `RSM_STUDENT_IDS`: Comma-separated student ids
//! - `RSM_ACADEMIC_END_YEAR`: Academic year passed to the enrollment query
//! - `RSM_AUTH_STRATEGY`: `browser` or `http`
//! - `RSM_WEBDRIVER_URL`: Existing WebDriver server to use
//! - `RSM_CHROMEDRIVER`: chromedriver binary to spawn
//! - `RSM_CHROME_BINARY`: Chrome binary for the browser strategy
//! - `RSM_PORTAL_URL`: Portal base URL
//! - `RSM_TIMEOUT`: Request timeout in seconds

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::AppPaths;
use crate::error::{RsmError, Result};

// =============================================================================
// Environment Variable Names
// =============================================================================

pub const ENV_CONFIG: &str = "RSM_CONFIG";
pub const ENV_EMAIL: &str = "RSM_EMAIL";
pub const ENV_SECRET_ID: &str = "RSM_SECRET_ID";
pub const ENV_SECRET_BACKEND: &str = "RSM_SECRET_BACKEND";
pub const ENV_AWS_REGION: &str = "RSM_AWS_REGION";
pub const ENV_CREDENTIALS_FILE: &str = "RSM_CREDENTIALS_FILE";
pub const ENV_STUDENT_IDS: &str = "RSM_STUDENT_IDS";
pub const ENV_ACADEMIC_END_YEAR: &str = "RSM_ACADEMIC_END_YEAR";
pub const ENV_AUTH_STRATEGY: &str = "RSM_AUTH_STRATEGY";
pub const ENV_WEBDRIVER_URL: &str = "RSM_WEBDRIVER_URL";
pub const ENV_CHROMEDRIVER: &str = "RSM_CHROMEDRIVER";
pub const ENV_CHROME_BINARY: &str = "RSM_CHROME_BINARY";
pub const ENV_PORTAL_URL: &str = "RSM_PORTAL_URL";
pub const ENV_TIMEOUT: &str = "RSM_TIMEOUT";

/// Set by the Lambda runtime in every function sandbox.
pub const ENV_LAMBDA_FUNCTION_NAME: &str = "AWS_LAMBDA_FUNCTION_NAME";

// =============================================================================
// Enumerated settings
// =============================================================================

/// Where the account password is read from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecretBackend {
    /// AWS Secrets Manager.
    #[default]
    Aws,
    /// OS keyring.
    Keyring,
    /// Local JSON credential file.
    File,
}

impl SecretBackend {
    #[must_use]
    pub fn from_arg(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "aws" | "secretsmanager" => Some(Self::Aws),
            "keyring" => Some(Self::Keyring),
            "file" | "local" => Some(Self::File),
            _ => None,
        }
    }
}

/// Which token acquisition strategy to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// Headless browser capture.
    #[default]
    Browser,
    /// Direct form-login replay.
    Http,
}

impl StrategyKind {
    #[must_use]
    pub fn from_arg(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "browser" | "webdriver" => Some(Self::Browser),
            "http" | "direct" => Some(Self::Http),
            _ => None,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Browser => "browser",
            Self::Http => "http",
        }
    }
}

// =============================================================================
// Config sections
// =============================================================================

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub portal: PortalConfig,
    pub account: AccountConfig,
    pub secrets: SecretsConfig,
    pub auth: AuthConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Timeout for each portal request in seconds.
    pub timeout_seconds: u64,
}

/// Portal endpoints and query parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    /// Scheme and host of the portal, without trailing slash.
    pub base_url: String,
    /// Login page, relative to `base_url`.
    pub login_path: String,
    /// GraphQL endpoint, relative to `base_url`.
    pub graphql_path: String,
    /// Referer sent with GraphQL requests, relative to `base_url`.
    pub referer_path: String,
    /// Authenticated page that issues GraphQL calls. `{student_id}` is
    /// replaced with the first configured student.
    pub content_path: String,
    /// `academicEndYear` for the enrollment query.
    pub academic_end_year: i32,
    /// `types` filter for the assignment query.
    pub assignment_types: Vec<String>,
}

/// Account to log in with and students to harvest.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountConfig {
    /// Portal login email. An `email` field in the secret takes precedence.
    pub email: String,
    /// Secret identifier holding the password.
    pub secret_id: String,
    /// Students to harvest, in order.
    pub student_ids: Vec<i64>,
}

/// Secret store selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecretsConfig {
    pub backend: SecretBackend,
    /// AWS region for Secrets Manager.
    pub region: String,
    /// Local credential file; defaults to `~/.rsm_credentials`.
    pub credentials_file: Option<PathBuf>,
}

/// Token acquisition settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub strategy: StrategyKind,
    /// Existing WebDriver server. When unset a chromedriver is spawned.
    pub webdriver_url: Option<String>,
    /// chromedriver binary; searched in well-known locations when unset.
    pub chromedriver_path: Option<PathBuf>,
    /// Port for a spawned chromedriver.
    pub chromedriver_port: u16,
    /// Chrome binary; defaults to the Lambda layer path inside Lambda.
    pub chrome_binary: Option<PathBuf>,
    pub headless: bool,
    /// Upper bound for each browser step (element lookup, navigation).
    pub step_timeout_secs: u64,
    /// Upper bound for the bearer token to show up after navigation.
    pub capture_timeout_secs: u64,
    /// Poll interval for every bounded wait.
    pub poll_interval_ms: u64,
    /// Form POST target for the direct login. Defaults to the login form's
    /// own action.
    pub login_endpoint: Option<String>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
        }
    }
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            base_url: "https://parents.mathschool.com".to_string(),
            login_path: "/parent-portal/".to_string(),
            graphql_path: "/parent-portal/graphql".to_string(),
            referer_path: "/parent-portal/splash".to_string(),
            content_path: "/parent-portal/content/student/{student_id}/academics".to_string(),
            academic_end_year: 2026,
            assignment_types: vec!["HOMEWORK".to_string()],
        }
    }
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            email: String::new(),
            secret_id: "rsm-credentials".to_string(),
            student_ids: vec![163_934, 183_013, 267_501],
        }
    }
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self {
            backend: SecretBackend::Aws,
            region: "us-east-1".to_string(),
            credentials_file: None,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::Browser,
            webdriver_url: None,
            chromedriver_path: None,
            chromedriver_port: 9515,
            chrome_binary: None,
            headless: true,
            step_timeout_secs: 20,
            capture_timeout_secs: 30,
            poll_interval_ms: 250,
            login_endpoint: None,
        }
    }
}

// =============================================================================
// Derived values
// =============================================================================

impl PortalConfig {
    fn join(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    #[must_use]
    pub fn origin(&self) -> String {
        self.base_url.trim_end_matches('/').to_string()
    }

    #[must_use]
    pub fn login_url(&self) -> String {
        self.join(&self.login_path)
    }

    #[must_use]
    pub fn graphql_url(&self) -> String {
        self.join(&self.graphql_path)
    }

    #[must_use]
    pub fn referer_url(&self) -> String {
        self.join(&self.referer_path)
    }

    #[must_use]
    pub fn content_url(&self, student_id: i64) -> String {
        self.join(
            &self
                .content_path
                .replace("{student_id}", &student_id.to_string()),
        )
    }

    /// Host of `base_url`, used to recognise arrival back at the portal.
    #[must_use]
    pub fn host(&self) -> Option<String> {
        reqwest::Url::parse(&self.base_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
    }
}

impl GeneralConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl AuthConfig {
    #[must_use]
    pub const fn step_timeout(&self) -> Duration {
        Duration::from_secs(self.step_timeout_secs)
    }

    #[must_use]
    pub const fn capture_timeout(&self) -> Duration {
        Duration::from_secs(self.capture_timeout_secs)
    }

    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl SecretsConfig {
    /// Configured credential file, or `~/.rsm_credentials`.
    #[must_use]
    pub fn credentials_file_path(&self) -> PathBuf {
        self.credentials_file
            .clone()
            .unwrap_or_else(AppPaths::local_credentials_file)
    }
}

// =============================================================================
// Loading
// =============================================================================

impl Config {
    /// Load configuration from `RSM_CONFIG` or the default path, then apply
    /// environment overrides and validate.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but is invalid, or an override
    /// has an invalid value.
    pub fn resolve(explicit_path: Option<&Path>) -> Result<Self> {
        let path = explicit_path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var(ENV_CONFIG).ok().map(PathBuf::from))
            .unwrap_or_else(Self::config_path);

        let mut config = Self::load_from(&path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific path.
    ///
    /// Returns default config if the file doesn't exist.
    /// Returns error only if the file exists but is invalid.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(?path, "Config file not found, using defaults");
            return Ok(Self::default());
        }

        tracing::debug!(?path, "Loading config file");
        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| RsmError::ConfigParse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Get the default config file path.
    #[must_use]
    pub fn config_path() -> PathBuf {
        AppPaths::new().config_file()
    }

    /// Apply environment overrides using `lookup` to read variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigInvalid` for values that do not parse.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(email) = get(ENV_EMAIL) {
            self.account.email = email.trim().to_string();
        }
        if let Some(secret_id) = get(ENV_SECRET_ID) {
            self.account.secret_id = secret_id.trim().to_string();
        }
        if let Some(ids) = get(ENV_STUDENT_IDS) {
            self.account.student_ids = parse_student_ids(&ids).ok_or_else(|| {
                RsmError::ConfigInvalid {
                    key: ENV_STUDENT_IDS.to_string(),
                    value: ids.clone(),
                    message: "expected comma-separated integers".to_string(),
                }
            })?;
        }
        if let Some(year) = get(ENV_ACADEMIC_END_YEAR) {
            self.portal.academic_end_year =
                year.trim().parse().map_err(|_| RsmError::ConfigInvalid {
                    key: ENV_ACADEMIC_END_YEAR.to_string(),
                    value: year.clone(),
                    message: "expected a year".to_string(),
                })?;
        }
        if let Some(backend) = get(ENV_SECRET_BACKEND) {
            self.secrets.backend =
                SecretBackend::from_arg(&backend).ok_or_else(|| RsmError::ConfigInvalid {
                    key: ENV_SECRET_BACKEND.to_string(),
                    value: backend.clone(),
                    message: "expected aws, keyring, or file".to_string(),
                })?;
        }
        if let Some(region) = get(ENV_AWS_REGION) {
            self.secrets.region = region.trim().to_string();
        }
        if let Some(path) = get(ENV_CREDENTIALS_FILE) {
            self.secrets.credentials_file = Some(PathBuf::from(path.trim()));
        }
        if let Some(strategy) = get(ENV_AUTH_STRATEGY) {
            self.auth.strategy =
                StrategyKind::from_arg(&strategy).ok_or_else(|| RsmError::ConfigInvalid {
                    key: ENV_AUTH_STRATEGY.to_string(),
                    value: strategy.clone(),
                    message: "expected browser or http".to_string(),
                })?;
        }
        if let Some(url) = get(ENV_WEBDRIVER_URL) {
            self.auth.webdriver_url = Some(url.trim().to_string());
        }
        if let Some(path) = get(ENV_CHROMEDRIVER) {
            self.auth.chromedriver_path = Some(PathBuf::from(path.trim()));
        }
        if let Some(path) = get(ENV_CHROME_BINARY) {
            self.auth.chrome_binary = Some(PathBuf::from(path.trim()));
        }
        if let Some(url) = get(ENV_PORTAL_URL) {
            self.portal.base_url = url.trim().trim_end_matches('/').to_string();
        }
        if let Some(timeout) = get(ENV_TIMEOUT) {
            self.general.timeout_seconds =
                timeout.trim().parse().map_err(|_| RsmError::ConfigInvalid {
                    key: ENV_TIMEOUT.to_string(),
                    value: timeout.clone(),
                    message: "expected seconds".to_string(),
                })?;
        }
        Ok(())
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigInvalid` naming the first offending key.
    pub fn validate(&self) -> Result<()> {
        let invalid = |key: &str, value: String, message: &str| RsmError::ConfigInvalid {
            key: key.to_string(),
            value,
            message: message.to_string(),
        };

        if self.account.student_ids.is_empty() {
            return Err(invalid(
                "account.student_ids",
                "[]".to_string(),
                "at least one student is required",
            ));
        }
        if self.account.secret_id.trim().is_empty() {
            return Err(invalid(
                "account.secret_id",
                String::new(),
                "must not be empty",
            ));
        }
        if self.general.timeout_seconds == 0 || self.general.timeout_seconds > 300 {
            return Err(invalid(
                "general.timeout_seconds",
                self.general.timeout_seconds.to_string(),
                "must be between 1 and 300 seconds",
            ));
        }
        if self.auth.step_timeout_secs == 0 || self.auth.capture_timeout_secs == 0 {
            return Err(invalid(
                "auth.step_timeout_secs",
                format!(
                    "{}/{}",
                    self.auth.step_timeout_secs, self.auth.capture_timeout_secs
                ),
                "browser timeouts must be non-zero",
            ));
        }
        if self.auth.poll_interval_ms == 0 {
            return Err(invalid(
                "auth.poll_interval_ms",
                "0".to_string(),
                "must be non-zero",
            ));
        }
        check_http_url("portal.base_url", &self.portal.base_url)?;
        if let Some(url) = &self.auth.webdriver_url {
            check_http_url("auth.webdriver_url", url)?;
        }
        if let Some(url) = &self.auth.login_endpoint {
            check_http_url("auth.login_endpoint", url)?;
        }
        Ok(())
    }

    /// Render as TOML for display.
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| RsmError::Config(format!("Failed to serialize config: {e}")))
    }
}

fn check_http_url(key: &str, value: &str) -> Result<()> {
    match reqwest::Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.host_str().is_some() => Ok(()),
        _ => Err(RsmError::ConfigInvalid {
            key: key.to_string(),
            value: value.to_string(),
            message: "expected an http(s) URL".to_string(),
        }),
    }
}

/// Parse `"1, 2,3"` into ids. Empty segments are ignored.
#[must_use]
pub fn parse_student_ids(value: &str) -> Option<Vec<i64>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse().ok())
        .collect()
}

/// True when running inside an AWS Lambda sandbox.
#[must_use]
pub fn running_in_lambda() -> bool {
    std::env::var_os(ENV_LAMBDA_FUNCTION_NAME).is_some()
}
