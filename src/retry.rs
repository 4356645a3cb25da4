use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// How often and how patiently a single translation call is retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Total attempts including the first; zero is treated as one.
    pub max_attempts: u32,
    /// Pause between two consecutive attempts.
    pub delay: Duration,
}

impl RetryConfig {
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Per-string translation calls: 3 attempts, 1s apart.
    pub fn translation() -> Self {
        Self::fixed(3, Duration::from_secs(1))
    }
}

/// Run `operation` until it succeeds or the attempts run out, sleeping
/// `config.delay` between attempts. The last error is returned.
pub async fn with_retry<T, E, F, Fut>(
    config: &RetryConfig,
    operation_name: &str,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let attempts = config.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    debug!("{}: succeeded on attempt {}/{}", operation_name, attempt, attempts);
                }
                return Ok(result);
            }
            Err(e) if attempt < attempts => {
                warn!(
                    "{}: attempt {}/{} failed ({}), retrying in {:?}",
                    operation_name, attempt, attempts, e, config.delay
                );
                sleep(config.delay).await;
                attempt += 1;
            }
            Err(e) => {
                warn!("{}: giving up after {} attempts: {}", operation_name, attempts, e);
                return Err(e);
            }
        }
    }
}
