//! Core data types shared across the scraper, storage, and serve layers.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Operator name recorded for listings found via the public search pages
/// rather than an operator's own directory entry.
pub const PRIVATE_OPERATOR: &str = "Private Vehicle";

/// One scraped bus offering. The tuple
/// (operator, route_name, bus_name, departing_time) is the natural key;
/// re-extracting the same combination overwrites the earlier row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusListing {
    pub operator: String,
    pub route_name: String,
    /// Source URL the row was extracted from.
    pub route_url: String,
    pub bus_name: String,
    pub bus_type: String,
    /// Raw venue-local time-of-day text, e.g. "21:30". Not parsed.
    pub departing_time: String,
    pub duration: String,
    pub reaching_time: String,
    /// 0.0 when no rating was present or it failed to parse.
    pub star_rating: f64,
    /// 0.0 when the fare text was missing or unparseable.
    pub price: f64,
    /// 0 when the seat text was missing or unparseable.
    pub seats_available: u32,
    pub scraped_at: NaiveDateTime,
}

/// An operator discovered on the top-level directory page. Transient;
/// consumed within a single scraping pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorRef {
    pub name: String,
    pub url: String,
}

/// A route discovered under an operator. Transient, like [`OperatorRef`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRef {
    pub name: String,
    pub url: String,
}

/// Filter set for reading back the accumulated table. All fields are
/// optional; `None` means "no constraint on this column".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListingFilter {
    pub operator: Option<String>,
    pub route_name: Option<String>,
    pub bus_type: Option<String>,
    pub departing_time: Option<String>,
    pub min_rating: Option<f64>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

impl ListingFilter {
    pub fn for_route(route_name: &str) -> Self {
        Self {
            route_name: Some(route_name.to_string()),
            ..Default::default()
        }
    }
}
