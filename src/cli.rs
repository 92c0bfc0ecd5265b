//! CLI commands for busboard.
//!
//! Two modes: `scrape` runs one full extraction pass against the operator
//! directory; `serve` opens the store read-only and serves filtered views.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::AppConfig;
use crate::failure_log::FailureLog;
use crate::scraper::{ChromeBackend, ScrapeRunner};
use crate::storage::ListingRepository;

#[derive(Parser)]
#[command(name = "busboard")]
#[command(version, about = "Bus listing scraper and filtered-view server", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a full scraping pass over the operator directory
    Scrape {
        /// Database path override
        #[arg(short, long)]
        db: Option<PathBuf>,

        /// Run the browser with a visible window
        #[arg(long, default_value_t = false)]
        headed: bool,
    },

    /// Serve read-only filtered views over the accumulated store
    Serve {
        /// Host to bind to
        #[arg(short = 'H', long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value_t = 8080)]
        port: u16,

        /// Database path override
        #[arg(short, long)]
        db: Option<PathBuf>,
    },
}

/// Run one full scraping pass.
pub async fn run_scrape(db: Option<PathBuf>, headed: bool) -> anyhow::Result<()> {
    let mut config = AppConfig::load()?;
    if let Some(path) = db {
        config.storage.db_path = path.to_string_lossy().to_string();
    }
    if headed {
        config.scraper.headless = false;
    }

    tracing::info!("opening store at {}", config.storage.db_path);
    let repo = ListingRepository::new(std::path::Path::new(&config.storage.db_path))?;

    tracing::info!("launching browser session");
    let backend = ChromeBackend::launch(config.scraper.headless).await?;

    let failures = FailureLog::new(&config.storage.failure_log);
    let runner = ScrapeRunner::new(
        backend,
        repo,
        config.selectors.clone(),
        config.scraper.clone(),
        failures,
    );

    let result = runner.run().await;

    // Release the browser on success and failure paths alike.
    let (backend, _repo) = runner.into_parts();
    if let Err(e) = backend.close().await {
        tracing::warn!("browser shutdown failed: {}", e);
    }

    let summary = result?;
    println!(
        "Scraping pass complete: {} operators, {} routes, {} rows upserted, {} failed units",
        summary.operators, summary.routes, summary.rows_upserted, summary.unit_failures
    );
    Ok(())
}
