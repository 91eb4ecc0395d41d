//! `run` command: one local invocation.

use std::path::Path;

use chrono::Utc;
use serde_json::Value;

use crate::cli::args::RunArgs;
use crate::error::Result;
use crate::handler::{InvocationContext, InvocationHandler, ResponseEnvelope};
use crate::storage::Config;

/// Request id for a local invocation.
#[must_use]
pub fn local_request_id() -> String {
    format!("local-{:x}", Utc::now().timestamp_millis())
}

/// Load configuration and apply the `run` flags on top.
///
/// # Errors
///
/// Returns a config error if loading fails or the result is invalid.
pub fn resolve_config(config_path: Option<&Path>, args: &RunArgs) -> Result<Config> {
    let mut config = Config::resolve(config_path)?;
    if let Some(strategy) = args.strategy {
        config.auth.strategy = strategy.into();
    }
    if let Some(backend) = args.secret_backend {
        config.secrets.backend = backend.into();
    }
    if !args.students.is_empty() {
        config.account.student_ids.clone_from(&args.students);
    }
    config.validate()?;
    Ok(config)
}

/// Render the envelope as printed by `run`.
///
/// # Errors
///
/// Returns error if serialization fails.
pub fn render_envelope(envelope: &ResponseEnvelope, pretty: bool) -> Result<String> {
    // Show the body as nested JSON rather than an escaped string.
    let body: Value = envelope
        .body_json()
        .unwrap_or_else(|_| Value::String(envelope.body.clone()));
    let shown = serde_json::json!({
        "statusCode": envelope.status_code,
        "body": body,
    });
    Ok(if pretty {
        serde_json::to_string_pretty(&shown)?
    } else {
        serde_json::to_string(&shown)?
    })
}

/// Execute the run command. Returns whether the invocation succeeded.
///
/// # Errors
///
/// Returns an error only when configuration cannot be resolved.
pub async fn execute(config_path: Option<&Path>, args: &RunArgs) -> Result<bool> {
    let config = resolve_config(config_path, args)?;
    let ctx = InvocationContext::new(args.request_id.clone().unwrap_or_else(local_request_id));

    let handler = InvocationHandler::from_config(config).await;
    let envelope = handler.handle(&Value::Null, &ctx).await;

    println!("{}", render_envelope(&envelope, args.pretty)?);
    Ok(envelope.is_success())
}
