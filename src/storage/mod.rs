//! SQLite storage for scraped bus listings.
//!
//! One table, upsert-only writes keyed by the listing's natural key, and
//! read queries for the filtered views.

pub mod repository;
pub mod schema;

pub use repository::ListingRepository;
pub use schema::create_tables;
