//! Bounded condition polling.
//!
//! Replaces fixed sleeps between browser steps: a probe is retried at a fixed
//! interval until it yields a value or the deadline passes.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::error::Result;

/// Poll `probe` every `interval` until it returns `Some` or `timeout` elapses.
///
/// The probe always runs at least once. A probe error aborts the wait.
///
/// # Errors
///
/// Propagates the first error returned by `probe`.
pub async fn poll_until<T, F, Fut>(timeout: Duration, interval: Duration, mut probe: F) -> Result<Option<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(value) = probe().await? {
            return Ok(Some(value));
        }
        let now = Instant::now();
        if now >= deadline {
            return Ok(None);
        }
        tokio::time::sleep(interval.min(deadline - now)).await;
    }
}
