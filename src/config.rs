//! Configuration for busboard.
//!
//! Layered: compiled-in defaults, then an optional `config.*` file, then
//! environment variables with the `BUSBOARD` prefix
//! (e.g. `BUSBOARD_SERVER_PORT=9090`).

use serde::{Deserialize, Serialize};

use crate::scraper::selectors::PageSelectorSet;

/// Server configuration for `serve` mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Where the listing store and failure log live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
    #[serde(default = "default_failure_log")]
    pub failure_log: String,
}

fn default_db_path() -> String {
    "data/bus_listings.db".to_string()
}

fn default_failure_log() -> String {
    "data/failure_log.csv".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            failure_log: default_failure_log(),
        }
    }
}

/// Scraping pass tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    /// Top-level operator directory. The whole pass starts here.
    #[serde(default = "default_directory_url")]
    pub directory_url: String,
    /// Base path the route slug is appended to for the public-search pass.
    #[serde(default = "default_search_base_url")]
    pub search_base_url: String,
    /// Fixed settle delay after navigation and clicks, in seconds.
    #[serde(default = "default_settle_secs")]
    pub settle_secs: u64,
    /// Per-round element wait budget, in seconds.
    #[serde(default = "default_wait_timeout_secs")]
    pub wait_timeout_secs: u64,
    /// Wait rounds before an element set is reported missing.
    #[serde(default = "default_wait_retries")]
    pub wait_retries: u32,
    /// Attempts per unit of work (route or operator), including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Fixed pause between unit attempts, in seconds.
    #[serde(default = "default_retry_backoff_secs")]
    pub retry_backoff_secs: u64,
    /// Consecutive unchanged scroll extents before a page counts as fully
    /// lazy-loaded.
    #[serde(default = "default_max_stable_rounds")]
    pub max_stable_rounds: u32,
    #[serde(default = "default_headless")]
    pub headless: bool,
}

fn default_directory_url() -> String {
    "https://www.redbus.in/online-booking/rtc-directory".to_string()
}

fn default_search_base_url() -> String {
    "https://www.redbus.in/bus-tickets".to_string()
}

fn default_settle_secs() -> u64 {
    5
}

fn default_wait_timeout_secs() -> u64 {
    10
}

fn default_wait_retries() -> u32 {
    3
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_backoff_secs() -> u64 {
    5
}

fn default_max_stable_rounds() -> u32 {
    5
}

fn default_headless() -> bool {
    true
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            directory_url: default_directory_url(),
            search_base_url: default_search_base_url(),
            settle_secs: default_settle_secs(),
            wait_timeout_secs: default_wait_timeout_secs(),
            wait_retries: default_wait_retries(),
            max_attempts: default_max_attempts(),
            retry_backoff_secs: default_retry_backoff_secs(),
            max_stable_rounds: default_max_stable_rounds(),
            headless: default_headless(),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(default)]
    pub selectors: PageSelectorSet,
}

impl AppConfig {
    /// Load configuration from defaults, config file, and environment.
    pub fn load() -> anyhow::Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?)
            .add_source(config::File::with_name("config").required(false))
            .add_source(
                config::Environment::with_prefix("BUSBOARD")
                    .separator("_")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }
}
