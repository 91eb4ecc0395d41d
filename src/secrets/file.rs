use std::path::PathBuf;

use super::SecretStore;
use crate::error::{RsmError, Result};

/// Local JSON credential file (`{"email": …, "password": …}`).
///
/// The secret id is ignored; the file holds exactly one credential.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }

    #[cfg(unix)]
    fn warn_if_exposed(&self, metadata: &std::fs::Metadata) {
        use std::os::unix::fs::PermissionsExt;
        let mode = metadata.permissions().mode();
        if mode & 0o077 != 0 {
            tracing::warn!(
                path = %self.path.display(),
                mode = %format!("{:o}", mode & 0o777),
                "Credential file is readable by other users; expected 600"
            );
        }
    }

    #[cfg(not(unix))]
    fn warn_if_exposed(&self, _metadata: &std::fs::Metadata) {}
}

impl SecretStore for FileStore {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn fetch(&self, _secret_id: &str) -> Result<String> {
        let metadata = tokio::fs::metadata(&self.path).await.map_err(|e| {
            RsmError::credential(format!(
                "No password found: cannot read {}: {e}",
                self.path.display()
            ))
        })?;
        self.warn_if_exposed(&metadata);

        tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            RsmError::credential(format!(
                "No password found: cannot read {}: {e}",
                self.path.display()
            ))
        })
    }
}
