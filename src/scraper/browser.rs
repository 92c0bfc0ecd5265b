//! Browser automation using chromiumoxide.
//!
//! The pipeline consumes the browser through the small [`Backend`] capability
//! trait (navigate, query, click, scroll) so the navigation logic can be
//! exercised against a scripted fake without a real Chrome session.
//! [`ChromeBackend`] is the production implementation, driving one persistent
//! page over CDP.

use async_trait::async_trait;
use chromiumoxide::browser::{Browser as ChromeBrowser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;

use crate::error::ScrapeError;

/// A snapshot of one matched element: its visible text plus the attributes
/// the pipeline cares about.
#[derive(Debug, Clone, Default)]
pub struct ElementSnapshot {
    pub text: String,
    pub href: Option<String>,
    pub class: Option<String>,
}

impl ElementSnapshot {
    /// Whether the element's class list marks it as disabled.
    pub fn is_disabled(&self) -> bool {
        self.class
            .as_deref()
            .map(|c| c.split_whitespace().any(|t| t.contains("disabled")))
            .unwrap_or(false)
    }
}

/// Capability interface over a browser session.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Navigate the session's page to `url` and wait for the navigation to
    /// commit. Client-side rendering may still be in flight on return.
    async fn goto(&self, url: &str) -> Result<(), ScrapeError>;

    /// Snapshot every element currently matching the CSS selector.
    async fn query(&self, selector: &str) -> Result<Vec<ElementSnapshot>, ScrapeError>;

    /// Click the first element matching the selector. Implementations must
    /// click in a way that is not defeated by overlapping elements.
    async fn click(&self, selector: &str) -> Result<(), ScrapeError>;

    /// Scroll to the current document bottom and report the new scroll
    /// extent, so callers can detect when lazy loading has stopped growing
    /// the page.
    async fn scroll_to_bottom(&self) -> Result<f64, ScrapeError>;
}

/// Production [`Backend`] over a headless Chrome session.
pub struct ChromeBackend {
    browser: ChromeBrowser,
    page: Page,
    handle: tokio::task::JoinHandle<()>,
}

impl ChromeBackend {
    /// Launch a browser and open the single page the whole run drives.
    pub async fn launch(headless: bool) -> anyhow::Result<Self> {
        let chrome_path = if cfg!(target_os = "macos") {
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome"
        } else if cfg!(target_os = "windows") {
            "C:\\Program Files\\Google\\Chrome\\Application\\chrome.exe"
        } else {
            "google-chrome"
        };

        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .no_sandbox()
            .disable_default_args()
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-extensions")
            .arg("--disable-background-networking")
            .arg("--mute-audio")
            .window_size(1920, 1080);
        if headless {
            builder = builder.arg("--headless=new");
        }
        let config = builder
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build browser config: {}", e))?;

        let (browser, mut handler) = ChromeBrowser::launch(config)
            .await
            .map_err(|e| anyhow::anyhow!("failed to launch browser: {}", e))?;

        // The handler stream must be polled for the whole session.
        let handle = tokio::spawn(async move {
            loop {
                match handler.next().await {
                    Some(Ok(_)) => continue,
                    Some(Err(_)) => continue,
                    None => break,
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| anyhow::anyhow!("failed to open page: {}", e))?;

        Ok(Self {
            browser,
            page,
            handle,
        })
    }

    /// Close the browser session.
    pub async fn close(mut self) -> anyhow::Result<()> {
        let _ = self.browser.close().await;
        self.handle.abort();
        Ok(())
    }

    async fn eval<T: serde::de::DeserializeOwned>(&self, script: String) -> Result<T, ScrapeError> {
        self.page
            .evaluate(script)
            .await
            .map_err(|e| ScrapeError::Browser(e.to_string()))?
            .into_value()
            .map_err(|e| ScrapeError::Browser(e.to_string()))
    }
}

#[async_trait]
impl Backend for ChromeBackend {
    async fn goto(&self, url: &str) -> Result<(), ScrapeError> {
        self.page
            .goto(url)
            .await
            .map_err(|e| ScrapeError::Browser(e.to_string()))?;
        self.page
            .wait_for_navigation()
            .await
            .map_err(|e| ScrapeError::Browser(e.to_string()))?;
        Ok(())
    }

    async fn query(&self, selector: &str) -> Result<Vec<ElementSnapshot>, ScrapeError> {
        let elements = match self.page.find_elements(selector).await {
            Ok(elements) => elements,
            // CDP reports "no node found" as an error; treat it as zero matches.
            Err(_) => return Ok(Vec::new()),
        };

        let mut snapshots = Vec::with_capacity(elements.len());
        for element in elements {
            let text = element
                .inner_text()
                .await
                .map_err(|e| ScrapeError::Browser(e.to_string()))?
                .unwrap_or_default();
            let href = element
                .attribute("href")
                .await
                .map_err(|e| ScrapeError::Browser(e.to_string()))?;
            let class = element
                .attribute("class")
                .await
                .map_err(|e| ScrapeError::Browser(e.to_string()))?;
            snapshots.push(ElementSnapshot { text, href, class });
        }
        Ok(snapshots)
    }

    async fn click(&self, selector: &str) -> Result<(), ScrapeError> {
        // A JS click lands even when another element overlaps the target,
        // which a synthesized mouse click would hit instead.
        let quoted = serde_json::to_string(selector)
            .map_err(|e| ScrapeError::Browser(e.to_string()))?;
        let script = format!(
            "(() => {{ const el = document.querySelector({quoted}); if (el) el.click(); }})()"
        );
        self.page
            .evaluate(script)
            .await
            .map_err(|e| ScrapeError::Browser(e.to_string()))?;
        Ok(())
    }

    async fn scroll_to_bottom(&self) -> Result<f64, ScrapeError> {
        self.page
            .evaluate("window.scrollTo(0, document.body.scrollHeight)")
            .await
            .map_err(|e| ScrapeError::Browser(e.to_string()))?;
        self.eval::<f64>("document.body.scrollHeight".to_string())
            .await
    }
}
