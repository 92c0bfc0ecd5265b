//! Listing extractor and paginator, the core of the pipeline.
//!
//! For one route page the extractor expands the listing (operator-direct
//! pages hide it behind a "view buses" control), forces lazy content to
//! render, pulls the parallel field columns, deduplicates rows against
//! everything already seen for the route, upserts the novel rows, and
//! follows the "next page" control until it disappears or reports disabled.

use std::collections::HashSet;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use crate::error::ScrapeError;
use crate::scraper::browser::Backend;
use crate::scraper::fields::{parse_price, parse_rating, parse_seats};
use crate::scraper::navigator::Navigator;
use crate::scraper::selectors::PageSelectorSet;
use crate::storage::ListingRepository;
use crate::types::{BusListing, RouteRef, PRIVATE_OPERATOR};

/// Which face of the site a route is being scraped from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// The operator's own listing page; needs the "view buses" expansion.
    OperatorDirect,
    /// The public search page built from the route slug; renders
    /// immediately and its listings belong to unaffiliated operators.
    PublicSearch,
}

/// What one route/source extraction produced.
#[derive(Debug, Default, Clone, Copy)]
pub struct RouteOutcome {
    /// Extraction rounds performed (pages visited with content).
    pub pages: u32,
    /// Rows upserted (novel under the in-flight dedup key).
    pub new_rows: u32,
    /// Rows skipped because a row-level failure was recovered.
    pub skipped_rows: u32,
}

pub struct ListingExtractor<'a, B> {
    nav: &'a Navigator<B>,
    selectors: &'a PageSelectorSet,
    repo: &'a ListingRepository,
    wait_timeout: Duration,
    wait_retries: u32,
    max_stable_rounds: u32,
}

impl<'a, B: Backend> ListingExtractor<'a, B> {
    pub fn new(
        nav: &'a Navigator<B>,
        selectors: &'a PageSelectorSet,
        repo: &'a ListingRepository,
        wait_timeout: Duration,
        wait_retries: u32,
        max_stable_rounds: u32,
    ) -> Self {
        Self {
            nav,
            selectors,
            repo,
            wait_timeout,
            wait_retries,
            max_stable_rounds,
        }
    }

    /// Run the full extract/dedup/persist/paginate loop for one route page.
    pub async fn scrape_route(
        &self,
        operator_name: &str,
        route: &RouteRef,
        url: &str,
        kind: SourceKind,
    ) -> Result<RouteOutcome, ScrapeError> {
        let mut outcome = RouteOutcome::default();

        self.nav.open(url).await?;

        if kind == SourceKind::OperatorDirect {
            // Operator pages hide listings behind a "view buses" control.
            // No control within the wait budget means no listings here.
            match self
                .nav
                .wait_for(
                    &self.selectors.view_buses_button,
                    self.wait_timeout,
                    self.wait_retries,
                )
                .await
            {
                Ok(_) => self.nav.click(&self.selectors.view_buses_button).await?,
                Err(e) if e.is_not_found() => {
                    warn!("no 'view buses' control for route {}", route.name);
                    return Ok(outcome);
                }
                Err(e) => return Err(e),
            }
        }

        let operator = match kind {
            SourceKind::OperatorDirect => operator_name,
            SourceKind::PublicSearch => PRIVATE_OPERATOR,
        };

        // Dedup key is (bus name, departing time): coarser than the
        // persisted natural key, so a re-rendered bus on a later page is
        // caught without operator/route context.
        let mut seen: HashSet<(String, String)> = HashSet::new();

        let mut page = 1u32;
        loop {
            self.nav
                .scroll_to_bottom_until_stable(self.max_stable_rounds)
                .await?;

            let columns = self.extract_columns().await?;
            if columns.row_count == 0 {
                if page == 1 {
                    warn!("no listings found for route {} at {}", route.name, url);
                }
                break;
            }
            outcome.pages += 1;

            let mut new_on_page = 0u32;
            for i in 0..columns.row_count {
                let key = (
                    columns.bus_name[i].clone(),
                    columns.departing_time[i].clone(),
                );
                if seen.contains(&key) {
                    continue;
                }
                seen.insert(key);

                let listing = columns.row(i, operator, &route.name, url);
                match self.repo.upsert(&listing) {
                    Ok(()) => {
                        outcome.new_rows += 1;
                        new_on_page += 1;
                    }
                    Err(e) => {
                        // One corrupt row must not abort the page.
                        outcome.skipped_rows += 1;
                        let row_err = ScrapeError::Row {
                            index: i,
                            reason: e.to_string(),
                        };
                        warn!("route {} page {}: {}", route.name, page, row_err);
                    }
                }
            }
            info!(
                "route {} page {}: {} new rows",
                route.name, page, new_on_page
            );

            if !self.advance_page().await? {
                break;
            }
            page += 1;
        }

        info!(
            "route {} ({:?}): {} unique rows over {} pages",
            route.name, kind, outcome.new_rows, outcome.pages
        );
        Ok(outcome)
    }

    /// Snapshot every field column currently rendered.
    async fn extract_columns(&self) -> Result<PageColumns, ScrapeError> {
        let texts = |els: Vec<crate::scraper::browser::ElementSnapshot>| -> Vec<String> {
            els.into_iter().map(|el| el.text.trim().to_string()).collect()
        };

        let bus_name = texts(self.nav.find(&self.selectors.bus_name).await?);
        let bus_type = texts(self.nav.find(&self.selectors.bus_type).await?);
        let departing_time = texts(self.nav.find(&self.selectors.departing_time).await?);
        let duration = texts(self.nav.find(&self.selectors.duration).await?);
        let reaching_time = texts(self.nav.find(&self.selectors.reaching_time).await?);
        let star_rating = texts(self.nav.find(&self.selectors.star_rating).await?);
        let price = texts(self.nav.find(&self.selectors.price).await?);
        let seats = texts(self.nav.find(&self.selectors.seats_available).await?);

        // A complete row needs all five required columns; rating, price and
        // seats render sparsely and default per-field when absent.
        let row_count = [
            bus_name.len(),
            bus_type.len(),
            departing_time.len(),
            duration.len(),
            reaching_time.len(),
        ]
        .into_iter()
        .min()
        .unwrap_or(0);

        Ok(PageColumns {
            row_count,
            bus_name,
            bus_type,
            departing_time,
            duration,
            reaching_time,
            star_rating,
            price,
            seats,
        })
    }

    /// Click through to the next page if a live "next" control exists.
    /// Returns false when pagination is exhausted.
    async fn advance_page(&self) -> Result<bool, ScrapeError> {
        let controls = self.nav.find(&self.selectors.next_page).await?;
        match controls.first() {
            None => Ok(false),
            Some(control) if control.is_disabled() => Ok(false),
            Some(_) => {
                self.nav.click(&self.selectors.next_page).await?;
                Ok(true)
            }
        }
    }
}

/// Parallel per-field columns for one rendered page.
struct PageColumns {
    row_count: usize,
    bus_name: Vec<String>,
    bus_type: Vec<String>,
    departing_time: Vec<String>,
    duration: Vec<String>,
    reaching_time: Vec<String>,
    star_rating: Vec<String>,
    price: Vec<String>,
    seats: Vec<String>,
}

impl PageColumns {
    fn row(&self, i: usize, operator: &str, route_name: &str, url: &str) -> BusListing {
        BusListing {
            operator: operator.to_string(),
            route_name: route_name.to_string(),
            route_url: url.to_string(),
            bus_name: self.bus_name[i].clone(),
            bus_type: self.bus_type[i].clone(),
            departing_time: self.departing_time[i].clone(),
            duration: self.duration[i].clone(),
            reaching_time: self.reaching_time[i].clone(),
            star_rating: self
                .star_rating
                .get(i)
                .map(|s| parse_rating(s))
                .unwrap_or(0.0),
            price: self.price.get(i).map(|s| parse_price(s)).unwrap_or(0.0),
            seats_available: self.seats.get(i).map(|s| parse_seats(s)).unwrap_or(0),
            scraped_at: Utc::now().naive_utc(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraper::browser::ElementSnapshot;
    use async_trait::async_trait;
    use std::collections::HashMap;

    /// Backend serving one static listing page.
    struct PageBackend {
        elements: HashMap<String, Vec<ElementSnapshot>>,
    }

    impl PageBackend {
        fn with_rows(selectors: &PageSelectorSet, rows: &[(&str, &str)]) -> Self {
            let column = |texts: Vec<String>| -> Vec<ElementSnapshot> {
                texts
                    .into_iter()
                    .map(|text| ElementSnapshot {
                        text,
                        ..Default::default()
                    })
                    .collect()
            };

            let mut elements = HashMap::new();
            elements.insert(
                selectors.bus_name.clone(),
                column(rows.iter().map(|(name, _)| name.to_string()).collect()),
            );
            elements.insert(
                selectors.departing_time.clone(),
                column(rows.iter().map(|(_, dep)| dep.to_string()).collect()),
            );
            for selector in [
                &selectors.bus_type,
                &selectors.duration,
                &selectors.reaching_time,
            ] {
                elements.insert(
                    selector.clone(),
                    column(rows.iter().map(|_| "filler".to_string()).collect()),
                );
            }
            Self { elements }
        }
    }

    #[async_trait]
    impl Backend for PageBackend {
        async fn goto(&self, _url: &str) -> Result<(), ScrapeError> {
            Ok(())
        }

        async fn query(&self, selector: &str) -> Result<Vec<ElementSnapshot>, ScrapeError> {
            Ok(self.elements.get(selector).cloned().unwrap_or_default())
        }

        async fn click(&self, _selector: &str) -> Result<(), ScrapeError> {
            Ok(())
        }

        async fn scroll_to_bottom(&self) -> Result<f64, ScrapeError> {
            Ok(1000.0)
        }
    }

    fn route() -> RouteRef {
        RouteRef {
            name: "A to B".to_string(),
            url: "http://example/route".to_string(),
        }
    }

    #[tokio::test]
    async fn test_storage_failure_skips_rows_and_finishes_page() {
        let selectors = PageSelectorSet::default();
        let backend =
            PageBackend::with_rows(&selectors, &[("Bus 1", "06:00"), ("Bus 2", "07:00")]);

        // A store whose writes all fail; extraction must skip each row and
        // still complete the page normally.
        let repo = ListingRepository::in_memory().unwrap();
        repo.drop_listings_table().unwrap();

        let nav = Navigator::new(backend, Duration::ZERO);
        let extractor = ListingExtractor::new(&nav, &selectors, &repo, Duration::ZERO, 1, 1);

        let outcome = extractor
            .scrape_route("SomeRTC", &route(), &route().url, SourceKind::PublicSearch)
            .await
            .unwrap();

        assert_eq!(outcome.pages, 1);
        assert_eq!(outcome.new_rows, 0);
        assert_eq!(outcome.skipped_rows, 2);
    }

    #[tokio::test]
    async fn test_healthy_store_counts_no_skips() {
        let selectors = PageSelectorSet::default();
        let backend =
            PageBackend::with_rows(&selectors, &[("Bus 1", "06:00"), ("Bus 2", "07:00")]);
        let repo = ListingRepository::in_memory().unwrap();

        let nav = Navigator::new(backend, Duration::ZERO);
        let extractor = ListingExtractor::new(&nav, &selectors, &repo, Duration::ZERO, 1, 1);

        let outcome = extractor
            .scrape_route("SomeRTC", &route(), &route().url, SourceKind::PublicSearch)
            .await
            .unwrap();

        assert_eq!(outcome.new_rows, 2);
        assert_eq!(outcome.skipped_rows, 0);
        assert_eq!(repo.count().unwrap(), 2);
    }
}
