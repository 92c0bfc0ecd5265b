//! busboard: browser-driven bus listing scraper.
//!
//! Walks a travel booking site's operator directory, extracts every bus
//! listing for every route (paging through lazily-loaded results), and
//! upserts the rows into a SQLite store that a read-only server exposes
//! through filtered views.

pub mod cli;
pub mod config;
pub mod error;
pub mod failure_log;
pub mod retry;
pub mod routes;
pub mod scraper;
pub mod storage;
pub mod types;

pub use error::ScrapeError;
pub use types::{BusListing, ListingFilter, OperatorRef, RouteRef};
