//! chromedriver process lifecycle.
//!
//! When no WebDriver server is configured, the browser strategy spawns a
//! local chromedriver for the duration of one invocation. The child is
//! killed when [`ChromeDriverProcess`] is dropped, on success and failure
//! alike.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::{Child, Command};

use super::wait::poll_until;
use crate::error::{RsmError, Result};

/// CLI binary name.
pub const CHROMEDRIVER_NAME: &str = "chromedriver";

/// Locations used by the Lambda Chrome layer.
pub const LAMBDA_CHROMEDRIVER_PATHS: &[&str] = &[
    "/opt/chromedriver",
    "/opt/bin/chromedriver",
    "/usr/local/bin/chromedriver",
];

/// Find a chromedriver binary.
///
/// Order: `explicit` if it exists, then `candidates` that exist, then `PATH`.
///
/// # Errors
///
/// Returns an auth error naming every location tried.
pub fn locate(explicit: Option<&Path>, candidates: &[&str]) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        tracing::warn!(path = %path.display(), "Configured chromedriver does not exist");
    }

    if let Some(found) = candidates.iter().map(PathBuf::from).find(|p| p.exists()) {
        tracing::info!(path = %found.display(), "Using ChromeDriver");
        return Ok(found);
    }

    which::which(CHROMEDRIVER_NAME).map_err(|_| {
        RsmError::auth(format!(
            "chromedriver not found (tried {}, and PATH); set RSM_CHROMEDRIVER or RSM_WEBDRIVER_URL",
            explicit
                .map(|p| p.display().to_string())
                .into_iter()
                .chain(candidates.iter().map(|c| (*c).to_string()))
                .collect::<Vec<_>>()
                .join(", ")
        ))
    })
}

/// A running chromedriver child process.
#[derive(Debug)]
pub struct ChromeDriverProcess {
    child: Child,
    url: String,
}

impl ChromeDriverProcess {
    /// Spawn `binary` on `port` and wait until its `/status` endpoint
    /// reports ready.
    ///
    /// # Errors
    ///
    /// Returns an auth error if the process cannot start or never becomes
    /// ready within `ready_timeout`.
    pub async fn spawn(
        binary: &Path,
        port: u16,
        ready_timeout: Duration,
        poll_interval: Duration,
    ) -> Result<Self> {
        let child = Command::new(binary)
            .arg(format!("--port={port}"))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                RsmError::auth(format!(
                    "failed to start chromedriver at {}: {e}",
                    binary.display()
                ))
            })?;

        let process = Self {
            child,
            url: format!("http://127.0.0.1:{port}"),
        };

        let client = reqwest::Client::builder()
            .timeout(poll_interval.max(Duration::from_millis(500)))
            .build()
            .map_err(|e| RsmError::auth(format!("failed to build status client: {e}")))?;
        let status_url = format!("{}/status", process.url);

        let ready = poll_until(ready_timeout, poll_interval, || {
            let request = client.get(&status_url).send();
            async move {
                Ok(match request.await {
                    Ok(resp) if resp.status().is_success() => Some(()),
                    _ => None,
                })
            }
        })
        .await?;

        if ready.is_none() {
            return Err(RsmError::auth(format!(
                "chromedriver did not become ready within {}s",
                ready_timeout.as_secs()
            )));
        }

        tracing::debug!(url = %process.url, pid = ?process.child.id(), "chromedriver ready");
        Ok(process)
    }

    /// WebDriver endpoint of this process.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Drop for ChromeDriverProcess {
    fn drop(&mut self) {
        if let Err(e) = self.child.start_kill() {
            tracing::debug!(error = %e, "chromedriver already exited");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_path_wins() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let found = locate(Some(file.path()), &["/nonexistent/chromedriver"]).unwrap();
        assert_eq!(found, file.path());
    }

    #[test]
    fn first_existing_candidate_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let driver = dir.path().join("chromedriver");
        std::fs::write(&driver, "").unwrap();
        let driver_str = driver.to_str().unwrap();

        let found = locate(
            Some(Path::new("/nonexistent/explicit")),
            &["/nonexistent/a", driver_str],
        )
        .unwrap();
        assert_eq!(found, driver);
    }

    #[tokio::test]
    async fn spawn_missing_binary_is_auth_error() {
        let err = ChromeDriverProcess::spawn(
            Path::new("/nonexistent/chromedriver"),
            19_515,
            Duration::from_millis(50),
            Duration::from_millis(10),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, RsmError::Auth { .. }));
        assert!(err.to_string().contains("failed to start chromedriver"));
    }
}
