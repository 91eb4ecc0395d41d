use aws_config::{BehaviorVersion, Region};
use aws_sdk_secretsmanager::Client;
use aws_sdk_secretsmanager::error::DisplayErrorContext;

use super::SecretStore;
use crate::error::{RsmError, Result};

/// AWS Secrets Manager backend.
pub struct AwsSecretsManager {
    client: Client,
}

impl AwsSecretsManager {
    /// Build a client for `region` using the default credential chain.
    pub async fn new(region: &str) -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .load()
            .await;
        Self {
            client: Client::new(&config),
        }
    }
}

impl SecretStore for AwsSecretsManager {
    fn name(&self) -> &'static str {
        "aws-secretsmanager"
    }

    async fn fetch(&self, secret_id: &str) -> Result<String> {
        let output = self
            .client
            .get_secret_value()
            .secret_id(secret_id)
            .send()
            .await
            .map_err(|e| {
                tracing::debug!(error = %DisplayErrorContext(&e), "GetSecretValue failed");
                RsmError::credential(format!(
                    "No password found in AWS Secrets Manager: {}",
                    DisplayErrorContext(&e)
                ))
            })?;

        output
            .secret_string()
            .map(str::to_string)
            .ok_or_else(|| RsmError::credential("No password found in AWS Secrets Manager"))
    }
}
