//! Credential provider.
//!
//! Resolves the portal password from a secret store. The stored value is a
//! small JSON object that must contain `password` and may contain `email`.
//!
//! Backends:
//! - [`AwsSecretsManager`]: AWS Secrets Manager `GetSecretValue`
//! - [`KeyringStore`]: OS keyring entry
//! - [`FileStore`]: local JSON credential file

mod aws;
mod file;
mod keyring_store;

use serde::Deserialize;

use crate::core::models::Credential;
use crate::error::{RsmError, Result};
use crate::storage::{SecretBackend, SecretsConfig};

pub use aws::AwsSecretsManager;
pub use file::FileStore;
pub use keyring_store::{KEYRING_SERVICE, KeyringStore};

/// A key-value store of secret strings.
#[allow(async_fn_in_trait)]
pub trait SecretStore {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Fetch the raw secret string stored under `secret_id`.
    ///
    /// # Errors
    ///
    /// Returns a credential error if the store is unreachable or the
    /// secret does not exist.
    async fn fetch(&self, secret_id: &str) -> Result<String>;
}

/// JSON payload stored in the secret.
#[derive(Deserialize)]
pub struct SecretPayload {
    pub password: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl SecretPayload {
    /// Parse a secret string.
    ///
    /// # Errors
    ///
    /// Returns a credential error when the JSON is malformed or has no
    /// non-empty `password`.
    pub fn parse(raw: &str) -> Result<Self> {
        let payload: Self = serde_json::from_str(raw)
            .map_err(|e| RsmError::credential(format!("malformed secret payload: {e}")))?;
        if payload.password.is_empty() {
            return Err(RsmError::credential("secret payload has an empty password"));
        }
        Ok(payload)
    }
}

/// Resolves account passwords from a [`SecretStore`].
pub struct CredentialProvider<S> {
    store: S,
}

impl<S: SecretStore> CredentialProvider<S> {
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Fetch `secret_id` and return its `password` field.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError` when the store is unreachable, the secret is
    /// missing, or the payload is malformed.
    pub async fn get_password(&self, secret_id: &str) -> Result<String> {
        Ok(self.load(secret_id).await?.password)
    }

    /// Fetch `secret_id` as a full credential. An `email` in the secret
    /// takes precedence over `default_account`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::get_password`], plus a credential error when neither
    /// the secret nor `default_account` name an account.
    pub async fn get_credential(&self, secret_id: &str, default_account: &str) -> Result<Credential> {
        let payload = self.load(secret_id).await?;
        let account = payload
            .email
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| default_account.to_string());
        if account.trim().is_empty() {
            return Err(RsmError::credential(
                "no account email configured (set RSM_EMAIL or add \"email\" to the secret)",
            ));
        }
        Ok(Credential::new(account, payload.password))
    }

    async fn load(&self, secret_id: &str) -> Result<SecretPayload> {
        tracing::debug!(backend = self.store.name(), secret_id, "Fetching secret");
        let raw = self.store.fetch(secret_id).await.inspect_err(|e| {
            tracing::error!(backend = self.store.name(), secret_id, error = %e, "Failed to get credentials");
        })?;
        SecretPayload::parse(&raw).inspect_err(|e| {
            tracing::error!(backend = self.store.name(), secret_id, error = %e, "Failed to parse credentials");
        })
    }
}

/// Secret store chosen by configuration.
pub enum SecretBackendStore {
    Aws(AwsSecretsManager),
    Keyring(KeyringStore),
    File(FileStore),
}

impl SecretBackendStore {
    /// Build the configured backend.
    pub async fn from_config(config: &SecretsConfig) -> Self {
        match config.backend {
            SecretBackend::Aws => Self::Aws(AwsSecretsManager::new(&config.region).await),
            SecretBackend::Keyring => Self::Keyring(KeyringStore::new()),
            SecretBackend::File => Self::File(FileStore::new(config.credentials_file_path())),
        }
    }
}

impl SecretStore for SecretBackendStore {
    fn name(&self) -> &'static str {
        match self {
            Self::Aws(s) => s.name(),
            Self::Keyring(s) => s.name(),
            Self::File(s) => s.name(),
        }
    }

    async fn fetch(&self, secret_id: &str) -> Result<String> {
        match self {
            Self::Aws(s) => s.fetch(secret_id).await,
            Self::Keyring(s) => s.fetch(secret_id).await,
            Self::File(s) => s.fetch(secret_id).await,
        }
    }
}
