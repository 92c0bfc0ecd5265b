//! Navigation driver: condition-based waiting on top of a [`Backend`].
//!
//! Element presence is the readiness signal wherever one exists; the fixed
//! settle delay is kept only for the window right after navigation and
//! clicks, where client-side rendering offers nothing to wait on.

use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

use crate::error::ScrapeError;
use crate::scraper::browser::{Backend, ElementSnapshot};

/// How often `wait_for` re-polls the page for matching elements.
const POLL_INTERVAL: Duration = Duration::from_millis(250);
/// Pause between `wait_for` retry rounds after a timeout.
const RETRY_BACKOFF: Duration = Duration::from_secs(2);

pub struct Navigator<B> {
    backend: B,
    settle: Duration,
}

impl<B: Backend> Navigator<B> {
    pub fn new(backend: B, settle: Duration) -> Self {
        Self { backend, settle }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Give the browser session back, e.g. for shutdown.
    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Navigate and give client-side rendering a fixed window to settle.
    pub async fn open(&self, url: &str) -> Result<(), ScrapeError> {
        debug!("opening {}", url);
        self.backend.goto(url).await?;
        sleep(self.settle).await;
        Ok(())
    }

    /// Snapshot whatever currently matches, without waiting.
    pub async fn find(&self, selector: &str) -> Result<Vec<ElementSnapshot>, ScrapeError> {
        self.backend.query(selector).await
    }

    /// Poll for at least one element matching `selector`. Each round polls
    /// for up to `timeout`; after a timed-out round the driver backs off and
    /// tries again, up to `retries` rounds in total, before reporting
    /// [`ScrapeError::NotFound`].
    pub async fn wait_for(
        &self,
        selector: &str,
        timeout: Duration,
        retries: u32,
    ) -> Result<Vec<ElementSnapshot>, ScrapeError> {
        let attempts = retries.max(1);
        for attempt in 1..=attempts {
            let deadline = tokio::time::Instant::now() + timeout;
            loop {
                let found = self.backend.query(selector).await?;
                if !found.is_empty() {
                    return Ok(found);
                }
                if tokio::time::Instant::now() >= deadline {
                    break;
                }
                sleep(POLL_INTERVAL).await;
            }
            debug!(
                "wait_for `{}` timed out (attempt {}/{})",
                selector, attempt, attempts
            );
            if attempt < attempts {
                sleep(RETRY_BACKOFF).await;
            }
        }
        Err(ScrapeError::NotFound {
            selector: selector.to_string(),
            attempts,
        })
    }

    /// Click the first match, then allow the page to settle.
    pub async fn click(&self, selector: &str) -> Result<(), ScrapeError> {
        self.backend.click(selector).await?;
        sleep(self.settle).await;
        Ok(())
    }

    /// Force lazily-loaded content to materialize: scroll to the document
    /// bottom until the scroll extent stops growing for `max_stable_rounds`
    /// consecutive iterations.
    pub async fn scroll_to_bottom_until_stable(
        &self,
        max_stable_rounds: u32,
    ) -> Result<(), ScrapeError> {
        let mut last_height = self.backend.scroll_to_bottom().await?;
        let mut stable_rounds = 0;
        while stable_rounds < max_stable_rounds {
            sleep(self.settle.min(Duration::from_secs(2))).await;
            let height = self.backend.scroll_to_bottom().await?;
            if (height - last_height).abs() < f64::EPSILON {
                stable_rounds += 1;
            } else {
                stable_rounds = 0;
            }
            last_height = height;
        }
        Ok(())
    }
}
