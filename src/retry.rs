//! Bounded retry for units of scraping work.
//!
//! One route or one operator is a unit: it gets a fixed number of attempts
//! with a fixed pause between them, and exhaustion surfaces the last error
//! to the caller, which records it in the failure log and moves on. A
//! failing unit never aborts the run.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Configuration for retrying one unit of work.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Fixed pause between attempts.
    pub backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(5),
        }
    }
}

/// Run `operation` until it succeeds or `max_attempts` is exhausted.
pub async fn retry_unit<T, E, F, Fut>(
    config: &RetryConfig,
    unit_name: &str,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let attempts = config.max_attempts.max(1);
    let mut last_error: Option<E> = None;

    for attempt in 1..=attempts {
        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    debug!("{} succeeded on attempt {}", unit_name, attempt);
                }
                return Ok(result);
            }
            Err(e) => {
                if attempt < attempts {
                    warn!(
                        "{} failed (attempt {}/{}): {}. Retrying in {:?}...",
                        unit_name, attempt, attempts, e, config.backoff
                    );
                    sleep(config.backoff).await;
                }
                last_error = Some(e);
            }
        }
    }

    Err(last_error.expect("at least one attempt ran"))
}
