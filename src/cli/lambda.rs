//! `lambda` command: serve the AWS Lambda runtime.

use std::path::Path;
use std::sync::Arc;

use lambda_runtime::{LambdaEvent, service_fn};
use serde_json::Value;

use crate::error::{RsmError, Result};
use crate::handler::{InvocationContext, InvocationHandler};
use crate::storage::Config;

/// Run the Lambda event loop until the runtime shuts down.
///
/// Configuration is resolved once per cold start; every invocation builds
/// its own session and browser.
///
/// # Errors
///
/// Returns an error if configuration is invalid or the runtime fails.
pub async fn execute(config_path: Option<&Path>) -> Result<()> {
    let config = Config::resolve(config_path)?;
    let handler = Arc::new(InvocationHandler::from_config(config).await);

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| {
        let handler = Arc::clone(&handler);
        async move {
            let ctx = InvocationContext::new(event.context.request_id.clone());
            let envelope = handler.handle(&event.payload, &ctx).await;
            Ok::<Value, lambda_runtime::Error>(serde_json::to_value(envelope)?)
        }
    }))
    .await
    .map_err(|e| RsmError::Other(anyhow::anyhow!("lambda runtime failed: {e}")))
}
