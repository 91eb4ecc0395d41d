//! Error types for rsm-monitor.
//!
//! Uses `thiserror` for structured error types that map to exit codes and
//! to the error envelope returned by the invocation handler.
//!
//! ## Error Taxonomy
//!
//! - **Credential**: the secret store is unreachable, the secret is missing,
//!   or its JSON payload is malformed
//! - **Authentication**: any step of the portal login flow failed, or no
//!   bearer token could be extracted
//! - **Transport**: the authenticated session broke mid-harvest (connection
//!   refused, timeout, session rejected)
//! - **Configuration**: config file parsing, validation, or missing values
//! - **Internal**: I/O, serialization, and unclassified errors
//!
//! Per-item skip conditions inside the harvester (a bad enrollment or
//! assignment response) are not errors and never surface here.
//!
//! Each error has a stable error code (e.g., `RSM-A001`) for programmatic handling.

pub mod suggestions;

use thiserror::Error;

pub use suggestions::FixSuggestion;

// =============================================================================
// Error Categories
// =============================================================================

/// High-level error categories for classification and routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Secret store lookup failures.
    Credential,
    /// Portal login failures.
    Authentication,
    /// Network failures against an established session.
    Transport,
    /// Configuration issues (parse errors, invalid values).
    Configuration,
    /// Internal errors (bugs, unexpected state, unclassified).
    Internal,
}

impl ErrorCategory {
    /// Returns a human-readable description of the category.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Credential => "Credential error",
            Self::Authentication => "Authentication error",
            Self::Transport => "Transport error",
            Self::Configuration => "Configuration error",
            Self::Internal => "Internal error",
        }
    }

    /// Returns a short code prefix for this category.
    #[must_use]
    pub const fn code_prefix(&self) -> &'static str {
        match self {
            Self::Credential => "S",
            Self::Authentication => "A",
            Self::Transport => "N",
            Self::Configuration => "C",
            Self::Internal => "X",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

// =============================================================================
// Exit Codes
// =============================================================================

/// Process exit codes for the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Success
    Success = 0,
    /// Unexpected failure, or the invocation returned an error envelope
    GeneralError = 1,
    /// Credential or authentication failure
    AuthFailure = 2,
    /// Config parse/validation errors
    ConfigError = 3,
    /// Timeout
    Timeout = 4,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as Self
    }
}

/// Main error type for rsm-monitor operations.
#[derive(Error, Debug)]
pub enum RsmError {
    // ==========================================================================
    // Credential errors (Category: Credential)
    // ==========================================================================
    /// Secret store unreachable, secret missing, or payload malformed.
    #[error("{message}")]
    Credential { message: String },

    // ==========================================================================
    // Authentication errors (Category: Authentication)
    // ==========================================================================
    /// Login flow failed or no bearer token could be extracted.
    #[error("{message}")]
    Auth { message: String },

    // ==========================================================================
    // Transport errors (Category: Transport)
    // ==========================================================================
    /// Network failure against the authenticated session.
    #[error("transport failure: {message}")]
    Transport { message: String },

    /// Request timed out.
    #[error("request timeout after {0} seconds")]
    Timeout(u64),

    // ==========================================================================
    // Configuration errors (Category: Configuration)
    // ==========================================================================
    /// Generic configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Error parsing configuration file.
    #[error("config parse error at {path}: {message}")]
    ConfigParse { path: String, message: String },

    /// Invalid value in configuration.
    #[error("invalid config value for '{key}': {message}")]
    ConfigInvalid {
        key: String,
        value: String,
        message: String,
    },

    // ==========================================================================
    // Internal errors (Category: Internal)
    // ==========================================================================
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Catch-all for other errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RsmError {
    /// Build a credential error.
    pub fn credential(message: impl Into<String>) -> Self {
        Self::Credential {
            message: message.into(),
        }
    }

    /// Build an authentication error.
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// Build a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Map error to a CLI exit code.
    #[must_use]
    pub const fn exit_code(&self) -> ExitCode {
        match self {
            Self::Credential { .. } | Self::Auth { .. } => ExitCode::AuthFailure,
            Self::Config(_) | Self::ConfigParse { .. } | Self::ConfigInvalid { .. } => {
                ExitCode::ConfigError
            }
            Self::Timeout(_) => ExitCode::Timeout,
            Self::Transport { .. } | Self::Io(_) | Self::Json(_) | Self::Other(_) => {
                ExitCode::GeneralError
            }
        }
    }

    /// Returns the error category for classification and routing.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Credential { .. } => ErrorCategory::Credential,
            Self::Auth { .. } => ErrorCategory::Authentication,
            Self::Transport { .. } | Self::Timeout(_) => ErrorCategory::Transport,
            Self::Config(_) | Self::ConfigParse { .. } | Self::ConfigInvalid { .. } => {
                ErrorCategory::Configuration
            }
            Self::Io(_) | Self::Json(_) | Self::Other(_) => ErrorCategory::Internal,
        }
    }

    /// Returns a stable error code for programmatic handling.
    ///
    /// Format: `RSM-{category}{number}`.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Credential { .. } => "RSM-S001",
            Self::Auth { .. } => "RSM-A001",
            Self::Transport { .. } => "RSM-N001",
            Self::Timeout(_) => "RSM-N002",
            Self::Config(_) => "RSM-C001",
            Self::ConfigParse { .. } => "RSM-C002",
            Self::ConfigInvalid { .. } => "RSM-C003",
            Self::Io(_) => "RSM-X001",
            Self::Json(_) => "RSM-X002",
            Self::Other(_) => "RSM-X099",
        }
    }

    /// Returns actionable fix suggestions for this error.
    #[must_use]
    pub fn fix_suggestions(&self) -> Vec<FixSuggestion> {
        match self {
            Self::Credential { message } => suggestions::credential_suggestions(message),
            Self::Auth { message } => suggestions::auth_suggestions(message),
            Self::Transport { message } => suggestions::transport_suggestions(message),
            Self::Timeout(seconds) => suggestions::timeout_suggestions(*seconds),
            Self::ConfigParse { path, message } => {
                suggestions::config_parse_suggestions(path, message)
            }
            Self::ConfigInvalid { key, value, message } => {
                suggestions::config_invalid_suggestions(key, value, message)
            }
            Self::Config(msg) => vec![FixSuggestion::new(
                vec!["rsm-monitor config".to_string()],
                format!("Configuration error: {msg}"),
            )],
            Self::Io(_) | Self::Json(_) | Self::Other(_) => vec![FixSuggestion::new(
                vec!["RSM_LOG=debug rsm-monitor run".to_string()],
                "An unexpected error occurred. Re-run with debug logging for details.",
            )],
        }
    }
}

/// Result type alias for rsm-monitor operations.
pub type Result<T> = std::result::Result<T, RsmError>;
