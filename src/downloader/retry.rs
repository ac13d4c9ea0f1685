//! Fixed-delay retry for fallible async operations

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, warn};

/// Runs `op` up to `max_attempts` times, sleeping `delay` between attempts.
///
/// The error of the final attempt is returned when every attempt fails.
/// `max_attempts` of zero is treated as one.
pub async fn retry_async<T, E, F, Fut>(
    label: &str,
    max_attempts: usize,
    delay: Duration,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < max_attempts => {
                warn!("{} failed (attempt {}/{}): {}", label, attempt, max_attempts, e);
                sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                error!("{} failed after {} attempts: {}", label, max_attempts, e);
                return Err(e);
            }
        }
    }
}
