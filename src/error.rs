//! Error taxonomy for the scraping pipeline.
//!
//! Failures are recovered at the lowest applicable level: parse failures
//! degrade to defaults inside the field parsers, row failures skip one row,
//! unit failures (a route or operator exhausting its retries) are logged to
//! the failure log and the run moves on. Only fatal failures (no browser
//! session, no store) propagate out of the command runners.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScrapeError {
    /// An expected element set never appeared within the wait budget.
    /// Non-fatal everywhere except the operator directory.
    #[error("no elements matched `{selector}` after {attempts} attempts")]
    NotFound { selector: String, attempts: u32 },

    /// The browser transport failed (navigation, script evaluation, CDP).
    #[error("browser error: {0}")]
    Browser(String),

    /// One listing row could not be assembled or persisted.
    #[error("row {index} failed: {reason}")]
    Row { index: usize, reason: String },

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl ScrapeError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ScrapeError::NotFound { .. })
    }
}
