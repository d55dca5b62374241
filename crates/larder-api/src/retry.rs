// Retry logic with exponential backoff
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Retry configuration
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 1000,
            max_delay_ms: 30000,
            backoff_multiplier: 2.0,
        }
    }
}

/// Run an operation, retrying failures with progressively longer waits.
///
/// The food database is a volunteer-run public service; hammering it on a
/// transient failure helps nobody. Operations decide themselves which errors
/// are permanent by returning early before this wrapper sees success.
pub async fn with_retry<F, Fut, T, E>(config: &RetryConfig, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 0;
    let mut delay_ms = config.initial_delay_ms;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    debug!("Request succeeded after {} retries", attempt);
                }
                return Ok(result);
            }
            Err(err) => {
                attempt += 1;

                if attempt > config.max_retries {
                    warn!(
                        "Request failed after {} attempts: {}",
                        config.max_retries, err
                    );
                    return Err(err);
                }

                warn!(
                    "Request failed (attempt {}/{}): {}. Retrying in {}ms...",
                    attempt, config.max_retries, err, delay_ms
                );

                sleep(Duration::from_millis(delay_ms)).await;

                delay_ms = ((delay_ms as f64) * config.backoff_multiplier) as u64;
                delay_ms = delay_ms.min(config.max_delay_ms);
            }
        }
    }
}

/// Check if an HTTP status code is worth retrying
pub fn is_retryable_status(status: reqwest::StatusCode) -> bool {
    // 5xx: the server is having a moment. 429/408: asked to back off.
    // Everything else 4xx is our fault and will not improve on retry.
    status.is_server_error()
        || status == reqwest::StatusCode::TOO_MANY_REQUESTS
        || status == reqwest::StatusCode::REQUEST_TIMEOUT
}
