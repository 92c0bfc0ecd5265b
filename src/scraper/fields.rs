//! Tolerant parsers for the free-text listing fields.
//!
//! A single malformed field must never abort extraction of a page, so each
//! parser degrades to a documented default instead of returning an error:
//! 0.0 for ratings and prices, 0 for seat counts. Out-of-range ratings are
//! passed through as-is; validation is the caller's concern.

use regex::Regex;
use std::sync::LazyLock;

static NON_PRICE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\d.]").unwrap());
static NON_DIGIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^0-9]").unwrap());

/// Parse a star rating from text like "4.3" or "4.3 (120 ratings)".
/// The first whitespace-separated token is taken as the value.
pub fn parse_rating(raw: &str) -> f64 {
    raw.split_whitespace()
        .next()
        .and_then(|token| token.parse::<f64>().ok())
        .unwrap_or(0.0)
}

/// Parse a fare from text like "INR 1,234" or "₹550". Everything that is not
/// a digit or decimal point is stripped before parsing.
pub fn parse_price(raw: &str) -> f64 {
    let digits = NON_PRICE.replace_all(raw, "");
    digits.parse::<f64>().unwrap_or(0.0)
}

/// Parse a seat count from text like "12 Seats available".
pub fn parse_seats(raw: &str) -> u32 {
    let digits = NON_DIGIT.replace_all(raw, "");
    digits.parse::<u32>().unwrap_or(0)
}
