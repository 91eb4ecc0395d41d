use super::SecretStore;
use crate::error::{RsmError, Result};

/// Keyring service name; the secret id is the keyring user.
pub const KEYRING_SERVICE: &str = "rsm-monitor";

/// OS keyring backend.
#[derive(Debug, Default)]
pub struct KeyringStore {
    service: String,
}

impl KeyringStore {
    #[must_use]
    pub fn new() -> Self {
        Self::with_service(KEYRING_SERVICE)
    }

    #[must_use]
    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }
}

impl SecretStore for KeyringStore {
    fn name(&self) -> &'static str {
        "keyring"
    }

    async fn fetch(&self, secret_id: &str) -> Result<String> {
        let entry = keyring::Entry::new(&self.service, secret_id)
            .map_err(|e| RsmError::credential(format!("Keyring error: {e}")))?;
        entry.get_password().map_err(|e| match e {
            keyring::Error::NoEntry => {
                RsmError::credential(format!("No password found in keyring for '{secret_id}'"))
            }
            other => RsmError::credential(format!("Keyring error: {other}")),
        })
    }
}
