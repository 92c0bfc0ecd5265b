//! Full scraping pass orchestration.
//!
//! One runner owns the browser session, the store connection, and the
//! failure log for the duration of a pass. Each operator and each route is a
//! unit of work behind the bounded retry wrapper; a unit that exhausts its
//! retries lands in the failure log and the pass carries on.

use std::time::Duration;

use anyhow::Context;
use tracing::{error, info};

use crate::config::ScraperConfig;
use crate::error::ScrapeError;
use crate::failure_log::FailureLog;
use crate::retry::{retry_unit, RetryConfig};
use crate::scraper::browser::Backend;
use crate::scraper::directory::DirectoryWalker;
use crate::scraper::listings::{ListingExtractor, SourceKind};
use crate::scraper::navigator::Navigator;
use crate::scraper::search_url;
use crate::scraper::selectors::PageSelectorSet;
use crate::storage::ListingRepository;
use crate::types::{OperatorRef, RouteRef};

/// Totals for one completed pass.
#[derive(Debug, Default, Clone, Copy)]
pub struct RunSummary {
    pub operators: usize,
    pub routes: u32,
    pub rows_upserted: u64,
    pub unit_failures: u32,
}

/// What scraping one operator produced.
#[derive(Debug, Default, Clone, Copy)]
struct OperatorOutcome {
    routes: u32,
    rows: u64,
    route_failures: u32,
}

pub struct ScrapeRunner<B> {
    nav: Navigator<B>,
    repo: ListingRepository,
    selectors: PageSelectorSet,
    config: ScraperConfig,
    failures: FailureLog,
    retry: RetryConfig,
}

impl<B: Backend> ScrapeRunner<B> {
    pub fn new(
        backend: B,
        repo: ListingRepository,
        selectors: PageSelectorSet,
        config: ScraperConfig,
        failures: FailureLog,
    ) -> Self {
        let nav = Navigator::new(backend, Duration::from_secs(config.settle_secs));
        let retry = RetryConfig {
            max_attempts: config.max_attempts,
            backoff: Duration::from_secs(config.retry_backoff_secs),
        };
        Self {
            nav,
            repo,
            selectors,
            config,
            failures,
            retry,
        }
    }

    pub fn repository(&self) -> &ListingRepository {
        &self.repo
    }

    /// Tear the runner apart so the caller can release the browser session
    /// and the store on every exit path.
    pub fn into_parts(self) -> (B, ListingRepository) {
        (self.nav.into_backend(), self.repo)
    }

    /// Run one full pass over the operator directory.
    pub async fn run(&self) -> anyhow::Result<RunSummary> {
        let walker = self.walker();
        let operators = walker
            .list_operators(&self.config.directory_url)
            .await
            .context("operator directory unavailable; nothing to scrape")?;
        if operators.is_empty() {
            anyhow::bail!("operator directory listed no operators");
        }

        let mut summary = RunSummary {
            operators: operators.len(),
            ..Default::default()
        };

        for operator in &operators {
            info!("scraping operator: {} ({})", operator.name, operator.url);
            match retry_unit(&self.retry, &format!("operator {}", operator.name), || {
                self.scrape_operator(operator)
            })
            .await
            {
                Ok(outcome) => {
                    summary.routes += outcome.routes;
                    summary.rows_upserted += outcome.rows;
                    summary.unit_failures += outcome.route_failures;
                }
                Err(e) => {
                    error!(
                        "operator {} failed after {} attempts: {}",
                        operator.name, self.retry.max_attempts, e
                    );
                    self.failures
                        .record(&operator.url, "", &operator.name, &e.to_string())?;
                    summary.unit_failures += 1;
                }
            }
        }

        info!(
            "pass complete: {} operators, {} routes, {} rows upserted, {} unit failures",
            summary.operators, summary.routes, summary.rows_upserted, summary.unit_failures
        );
        Ok(summary)
    }

    /// One operator unit: load its page, walk its routes, scrape each route
    /// from both sources. Route failures are contained here; only failures
    /// to reach the operator page or its route list propagate to the
    /// operator-level retry.
    async fn scrape_operator(&self, operator: &OperatorRef) -> Result<OperatorOutcome, ScrapeError> {
        self.nav.open(&operator.url).await?;
        let routes = self.walker().list_routes(operator).await?;

        let mut outcome = OperatorOutcome::default();
        for route in &routes {
            match retry_unit(&self.retry, &format!("route {}", route.name), || {
                self.scrape_route(operator, route)
            })
            .await
            {
                Ok(rows) => {
                    outcome.routes += 1;
                    outcome.rows += rows;
                }
                Err(e) => {
                    error!(
                        "route {} failed after {} attempts: {}",
                        route.name, self.retry.max_attempts, e
                    );
                    if let Err(log_err) =
                        self.failures
                            .record(&route.url, &route.name, &operator.name, &e.to_string())
                    {
                        error!("failed to write failure log: {}", log_err);
                    }
                    outcome.route_failures += 1;
                }
            }
        }
        Ok(outcome)
    }

    /// One route unit: the operator-direct listing (with the expansion
    /// click), then the public-search listing built from the route slug.
    async fn scrape_route(
        &self,
        operator: &OperatorRef,
        route: &RouteRef,
    ) -> Result<u64, ScrapeError> {
        let extractor = self.extractor();

        let direct = extractor
            .scrape_route(&operator.name, route, &route.url, SourceKind::OperatorDirect)
            .await?;

        let public_url = search_url(&self.config.search_base_url, &route.name);
        let public = extractor
            .scrape_route(&operator.name, route, &public_url, SourceKind::PublicSearch)
            .await?;

        // Read hook: surface the accumulated table for this route.
        match self.repo.listings_for_route(&route.name) {
            Ok(rows) => info!("route {}: {} rows accumulated in store", route.name, rows.len()),
            Err(e) => error!("failed to read back route {}: {}", route.name, e),
        }

        Ok(u64::from(direct.new_rows) + u64::from(public.new_rows))
    }

    fn walker(&self) -> DirectoryWalker<'_, B> {
        DirectoryWalker::new(
            &self.nav,
            &self.selectors,
            Duration::from_secs(self.config.wait_timeout_secs),
            self.config.wait_retries,
        )
    }

    fn extractor(&self) -> ListingExtractor<'_, B> {
        ListingExtractor::new(
            &self.nav,
            &self.selectors,
            &self.repo,
            Duration::from_secs(self.config.wait_timeout_secs),
            self.config.wait_retries,
            self.config.max_stable_rounds,
        )
    }
}
