// src/scraping/page.rs
//! Sources of page markup the orchestrator can read and interact with.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::error::ScrapeError;

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Elements that can act as an expansion control.
const CONTROL_SELECTOR: &str = "button, [role='button'], a";

/// A rendered page as seen from the content side.
#[async_trait]
pub trait JobPage: Send + Sync {
    /// Address of the page at scrape time.
    fn url(&self) -> &str;

    /// Current markup of the page.
    async fn snapshot(&self) -> Result<String, ScrapeError>;

    /// Number of expansion controls whose label matches one of `labels`.
    async fn find_expanders(&self, labels: &[String]) -> Result<usize, ScrapeError>;

    /// Clicks the `index`th expansion control. `false` when the page cannot
    /// be interacted with.
    async fn click_expander(&self, index: usize) -> Result<bool, ScrapeError>;
}

/// Counts controls in `html` whose text or `aria-label` contains a label.
pub fn count_expanders(html: &str, labels: &[String]) -> usize {
    let Ok(selector) = Selector::parse(CONTROL_SELECTOR) else {
        return 0;
    };
    let labels: Vec<String> = labels.iter().map(|l| l.to_lowercase()).collect();
    let document = Html::parse_document(html);

    document
        .select(&selector)
        .filter(|control| {
            let text = control.text().collect::<String>().to_lowercase();
            let aria = control
                .value()
                .attr("aria-label")
                .map(str::to_lowercase)
                .unwrap_or_default();
            labels
                .iter()
                .any(|label| text.contains(label.as_str()) || aria.contains(label.as_str()))
        })
        .count()
}

/// Markup held in memory. Each snapshot observes the next render frame;
/// the last frame stays once reached.
pub struct StaticPage {
    url: String,
    frames: Vec<String>,
    cursor: AtomicUsize,
    clicks: AtomicUsize,
}

impl StaticPage {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self::with_frames(url, vec![html.into()])
    }

    pub fn with_frames(url: impl Into<String>, frames: Vec<String>) -> Self {
        Self {
            url: url.into(),
            frames,
            cursor: AtomicUsize::new(0),
            clicks: AtomicUsize::new(0),
        }
    }

    pub fn clicks(&self) -> usize {
        self.clicks.load(Ordering::SeqCst)
    }

    fn frame(&self, index: usize) -> Result<&str, ScrapeError> {
        let last = self
            .frames
            .len()
            .checked_sub(1)
            .ok_or_else(|| ScrapeError::Page("page has no content".to_string()))?;
        Ok(&self.frames[index.min(last)])
    }
}

#[async_trait]
impl JobPage for StaticPage {
    fn url(&self) -> &str {
        &self.url
    }

    async fn snapshot(&self) -> Result<String, ScrapeError> {
        let index = self.cursor.fetch_add(1, Ordering::SeqCst);
        self.frame(index).map(str::to_string)
    }

    async fn find_expanders(&self, labels: &[String]) -> Result<usize, ScrapeError> {
        let index = self.cursor.load(Ordering::SeqCst);
        Ok(count_expanders(self.frame(index)?, labels))
    }

    async fn click_expander(&self, index: usize) -> Result<bool, ScrapeError> {
        debug!("Clicking expansion control #{}", index);
        self.clicks.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }
}

/// A page fetched over HTTP once and read from memory afterwards.
pub struct HttpPage {
    url: String,
    client: Client,
    html: OnceCell<String>,
}

impl HttpPage {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ScrapeError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ScrapeError::Page(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            url: url.into(),
            client,
            html: OnceCell::new(),
        })
    }

    async fn fetch(&self) -> Result<String, ScrapeError> {
        info!("Fetching job post: {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| ScrapeError::Page(format!("Failed to fetch job post: {}", e)))?;

        if !response.status().is_success() {
            return Err(ScrapeError::Page(format!("HTTP error: {}", response.status())));
        }

        response
            .text()
            .await
            .map_err(|e| ScrapeError::Page(format!("Failed to read response body: {}", e)))
    }
}

#[async_trait]
impl JobPage for HttpPage {
    fn url(&self) -> &str {
        &self.url
    }

    async fn snapshot(&self) -> Result<String, ScrapeError> {
        self.html
            .get_or_try_init(|| self.fetch())
            .await
            .map(String::clone)
    }

    async fn find_expanders(&self, labels: &[String]) -> Result<usize, ScrapeError> {
        let html = self.snapshot().await?;
        Ok(count_expanders(&html, labels))
    }

    async fn click_expander(&self, index: usize) -> Result<bool, ScrapeError> {
        debug!("Expansion control #{} not clickable on a fetched page", index);
        Ok(false)
    }
}
