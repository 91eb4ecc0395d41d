//! Invocation handler.
//!
//! One invocation runs the whole pipeline (credential, token, session,
//! harvest) and always produces a [`ResponseEnvelope`]. Failures become a
//! 500 envelope; nothing panics or escapes.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::Instrument;

use crate::auth::{AuthStrategy, Authenticator};
use crate::core::HarvestResult;
use crate::error::Result;
use crate::harvest::{HarvestSettings, Harvester, PortalSession};
use crate::secrets::{CredentialProvider, SecretBackendStore, SecretStore};
use crate::storage::Config;

pub const SUCCESS_MESSAGE: &str = "RSM academic data retrieved successfully";
pub const ERROR_PREFIX: &str = "ERROR: Failed to retrieve RSM data";

/// Per-invocation metadata from the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationContext {
    pub request_id: String,
}

impl InvocationContext {
    #[must_use]
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
        }
    }
}

/// HTTP-style response returned to the runtime. `body` is a JSON string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

impl ResponseEnvelope {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status_code == 200
    }

    /// Parse `body` back into JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if `body` is not valid JSON.
    pub fn body_json(&self) -> Result<Value> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

#[derive(Serialize)]
struct SuccessBody<'a> {
    message: &'static str,
    students_processed: usize,
    total_assignments: usize,
    data: &'a HarvestResult,
    timestamp: &'a str,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: String,
    timestamp: &'a str,
}

fn envelope<T: Serialize>(status_code: u16, body: &T, request_id: &str) -> ResponseEnvelope {
    let body = serde_json::to_string(body).unwrap_or_else(|e| {
        json!({ "error": format!("{ERROR_PREFIX}: {e}"), "timestamp": request_id }).to_string()
    });
    ResponseEnvelope { status_code, body }
}

/// Runs one harvest per invocation.
pub struct InvocationHandler<S, A> {
    credentials: CredentialProvider<S>,
    authenticator: A,
    config: Config,
}

impl InvocationHandler<SecretBackendStore, AuthStrategy> {
    /// Build the handler with the backends named in `config`.
    pub async fn from_config(config: Config) -> Self {
        let store = SecretBackendStore::from_config(&config.secrets).await;
        let authenticator = AuthStrategy::from_config(&config);
        Self::new(CredentialProvider::new(store), authenticator, config)
    }
}

impl<S: SecretStore, A: Authenticator> InvocationHandler<S, A> {
    pub const fn new(credentials: CredentialProvider<S>, authenticator: A, config: Config) -> Self {
        Self {
            credentials,
            authenticator,
            config,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Handle one invocation. The event payload is not used.
    pub async fn handle(&self, _event: &Value, ctx: &InvocationContext) -> ResponseEnvelope {
        let span = tracing::info_span!("invocation", request_id = %ctx.request_id);
        async {
            tracing::info!(
                students = self.config.account.student_ids.len(),
                strategy = self.authenticator.name(),
                "Invocation started"
            );
            match self.run().await {
                Ok(result) => {
                    let students_processed = result.student_count();
                    let total_assignments = result.total_assignments();
                    tracing::info!(students_processed, total_assignments, "Invocation succeeded");
                    let body = SuccessBody {
                        message: SUCCESS_MESSAGE,
                        students_processed,
                        total_assignments,
                        data: &result,
                        timestamp: &ctx.request_id,
                    };
                    envelope(200, &body, &ctx.request_id)
                }
                Err(err) => {
                    tracing::error!(
                        error = %err,
                        code = err.error_code(),
                        "Invocation failed"
                    );
                    let body = ErrorBody {
                        error: format!("{ERROR_PREFIX}: {err}"),
                        timestamp: &ctx.request_id,
                    };
                    envelope(500, &body, &ctx.request_id)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn run(&self) -> Result<HarvestResult> {
        let account = &self.config.account;
        let credential = self
            .credentials
            .get_credential(&account.secret_id, &account.email)
            .await?;

        let token = self.authenticator.authenticate(&credential).await?;

        let session = PortalSession::new(&token, &self.config.portal, self.config.general.timeout())?;
        Harvester::new(&session, HarvestSettings::from(&self.config.portal))
            .harvest(&account.student_ids)
            .await
    }
}
