//! CSS locators for the source site's markup, keyed by logical field.
//!
//! The extractor never hard-codes a class name: it receives a
//! [`PageSelectorSet`] and asks for locators by role. Markup drift, or a port
//! to a different booking site, is a configuration change only: override the
//! `selectors` table in the config file.

use serde::{Deserialize, Serialize};

/// Mapping from logical page element to its CSS locator. Defaults match the
/// redbus.in markup the pipeline was built against.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PageSelectorSet {
    /// One entry per operator on the top-level directory page.
    pub operator_item: String,
    /// Anchor inside an operator entry carrying the directory link.
    pub operator_link: String,
    /// Route anchors on an operator's page.
    pub route_link: String,
    /// "View buses" expansion control on operator-direct listing pages.
    pub view_buses_button: String,
    pub bus_name: String,
    pub bus_type: String,
    pub departing_time: String,
    pub duration: String,
    pub reaching_time: String,
    pub star_rating: String,
    pub price: String,
    pub seats_available: String,
    /// "Next page" control; a `disabled` class marks pagination exhausted.
    pub next_page: String,
}

impl Default for PageSelectorSet {
    fn default() -> Self {
        Self {
            operator_item: "li.D113_item_rtc".to_string(),
            operator_link: "li.D113_item_rtc a".to_string(),
            route_link: ".route".to_string(),
            view_buses_button: ".button".to_string(),
            bus_name: ".travels.lh-24.f-bold.d-color".to_string(),
            bus_type: ".bus-type.f-12.m-top-16.l-color.evBus".to_string(),
            departing_time: ".dp-time.f-19.d-color.f-bold".to_string(),
            duration: ".dur.l-color.lh-24".to_string(),
            reaching_time: ".bp-time.f-19.d-color.disp-Inline".to_string(),
            star_rating: "div.rating-sec.lh-24".to_string(),
            price: ".fare.d-block".to_string(),
            seats_available: "div[class*='seat-left']".to_string(),
            next_page: "button[class*='next-btn']".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_nonempty() {
        let set = PageSelectorSet::default();
        for sel in [
            &set.operator_item,
            &set.operator_link,
            &set.route_link,
            &set.view_buses_button,
            &set.bus_name,
            &set.bus_type,
            &set.departing_time,
            &set.duration,
            &set.reaching_time,
            &set.star_rating,
            &set.price,
            &set.seats_available,
            &set.next_page,
        ] {
            assert!(!sel.is_empty());
        }
    }

    #[test]
    fn test_partial_override_keeps_defaults() {
        let set: PageSelectorSet =
            serde_json::from_str(r#"{"bus_name": ".custom-name"}"#).unwrap();
        assert_eq!(set.bus_name, ".custom-name");
        assert_eq!(set.next_page, PageSelectorSet::default().next_page);
    }
}
