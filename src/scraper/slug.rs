//! Route-name normalization for building public search URLs.
//!
//! "Mumbai (Maharashtra) to Delhi (NCR)" becomes "mumbai-to-delhi", which is
//! appended to the search base path to reach the public listing for a route.

use regex::Regex;
use std::sync::LazyLock;

static BRACKETED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\([^)]*\)|\[[^\]]*\]").unwrap());
static TO_SEPARATOR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+to\s+").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static DISALLOWED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9-]").unwrap());
static HYPHEN_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-+").unwrap());

/// Convert a human-readable route label into a lowercase, hyphen-separated
/// URL slug. Pure and idempotent: `route_slug(route_slug(x)) == route_slug(x)`.
pub fn route_slug(route_name: &str) -> String {
    let lower = route_name.to_lowercase();
    let stripped = BRACKETED.replace_all(&lower, "");
    let joined = TO_SEPARATOR.replace_all(&stripped, "-to-");
    let hyphenated = WHITESPACE.replace_all(&joined, "-");
    let cleaned = DISALLOWED.replace_all(&hyphenated, "");
    let collapsed = HYPHEN_RUNS.replace_all(&cleaned, "-");
    collapsed.trim_matches('-').to_string()
}
