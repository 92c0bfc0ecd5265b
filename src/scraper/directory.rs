//! Directory walker: discovers operators and their routes.

use std::time::Duration;
use tracing::{info, warn};

use crate::error::ScrapeError;
use crate::scraper::browser::Backend;
use crate::scraper::navigator::Navigator;
use crate::scraper::selectors::PageSelectorSet;
use crate::types::{OperatorRef, RouteRef};

pub struct DirectoryWalker<'a, B> {
    nav: &'a Navigator<B>,
    selectors: &'a PageSelectorSet,
    wait_timeout: Duration,
    wait_retries: u32,
}

impl<'a, B: Backend> DirectoryWalker<'a, B> {
    pub fn new(
        nav: &'a Navigator<B>,
        selectors: &'a PageSelectorSet,
        wait_timeout: Duration,
        wait_retries: u32,
    ) -> Self {
        Self {
            nav,
            selectors,
            wait_timeout,
            wait_retries,
        }
    }

    /// Open the top-level directory and return every operator in document
    /// order. `NotFound` here is fatal to the run: no operators, no work.
    pub async fn list_operators(
        &self,
        directory_url: &str,
    ) -> Result<Vec<OperatorRef>, ScrapeError> {
        self.nav.open(directory_url).await?;

        let items = self
            .nav
            .wait_for(&self.selectors.operator_item, self.wait_timeout, self.wait_retries)
            .await?;
        let links = self.nav.find(&self.selectors.operator_link).await?;

        // The name comes from the list item, the URL from its anchor; the
        // two lists are parallel in document order.
        let operators: Vec<OperatorRef> = items
            .iter()
            .zip(links.iter())
            .filter_map(|(item, link)| {
                let name = item.text.trim().to_string();
                let url = link.href.clone()?;
                if name.is_empty() {
                    return None;
                }
                Some(OperatorRef { name, url })
            })
            .collect();

        info!("discovered {} operators", operators.len());
        Ok(operators)
    }

    /// Return the routes listed on the currently loaded operator page.
    /// A missing route list is "zero routes", not an error.
    pub async fn list_routes(&self, operator: &OperatorRef) -> Result<Vec<RouteRef>, ScrapeError> {
        let elements = match self
            .nav
            .wait_for(&self.selectors.route_link, self.wait_timeout, self.wait_retries)
            .await
        {
            Ok(elements) => elements,
            Err(e) if e.is_not_found() => {
                warn!("no routes found for operator {}", operator.name);
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        let routes: Vec<RouteRef> = elements
            .iter()
            .filter_map(|el| {
                let name = el.text.trim().to_string();
                let url = el.href.clone()?;
                if name.is_empty() {
                    return None;
                }
                Some(RouteRef { name, url })
            })
            .collect();

        info!("operator {}: {} routes", operator.name, routes.len());
        Ok(routes)
    }
}
