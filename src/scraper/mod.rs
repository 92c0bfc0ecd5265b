//! Browser-driven scraping pipeline.
//!
//! Provides the browser capability layer, the navigation driver, the
//! directory walker, and the listing extractor/paginator that together run
//! one full scraping pass.

pub mod browser;
pub mod directory;
pub mod fields;
pub mod listings;
pub mod navigator;
pub mod runner;
pub mod selectors;
pub mod slug;

pub use browser::{Backend, ChromeBackend, ElementSnapshot};
pub use navigator::Navigator;
pub use runner::{RunSummary, ScrapeRunner};
pub use selectors::PageSelectorSet;

use slug::route_slug;

/// Build the public-search URL for a route, e.g.
/// `https://www.redbus.in/bus-tickets/mumbai-to-delhi`.
pub fn search_url(base: &str, route_name: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), route_slug(route_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_url() {
        assert_eq!(
            search_url(
                "https://www.redbus.in/bus-tickets",
                "Mumbai (Maharashtra) to Delhi (NCR)"
            ),
            "https://www.redbus.in/bus-tickets/mumbai-to-delhi"
        );
    }

    #[test]
    fn test_search_url_trims_trailing_slash() {
        assert_eq!(
            search_url("https://example.com/bus-tickets/", "A to B"),
            "https://example.com/bus-tickets/a-to-b"
        );
    }
}
