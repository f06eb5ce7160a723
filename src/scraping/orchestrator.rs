// src/scraping/orchestrator.rs
use std::sync::Arc;
use std::time::Duration;

use scraper::Html;
use tokio::sync::Mutex;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, warn};

use super::extractor::PageExtractor;
use super::page::JobPage;
use super::selectors::Field;
use crate::error::ScrapeError;
use crate::types::job::{JobRecord, UNKNOWN_COMPANY, UNTITLED_JOB};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeTimings {
    /// Wait before the first DOM read.
    pub settle_delay: Duration,
    /// Wait after each expansion click.
    pub click_settle: Duration,
    pub poll_interval: Duration,
    /// Upper bound for one field to appear.
    pub poll_timeout: Duration,
    /// Upper bound for a whole scrape.
    pub scrape_timeout: Duration,
}

impl Default for ScrapeTimings {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(1000),
            click_settle: Duration::from_millis(500),
            poll_interval: Duration::from_millis(250),
            poll_timeout: Duration::from_secs(10),
            scrape_timeout: Duration::from_secs(30),
        }
    }
}

impl ScrapeTimings {
    /// A document that never re-renders: read it once, no waiting.
    pub fn for_static_page(&self) -> Self {
        Self {
            settle_delay: Duration::ZERO,
            click_settle: Duration::ZERO,
            poll_timeout: Duration::ZERO,
            ..self.clone()
        }
    }
}

/// Sequences extraction over a page that may still be rendering.
pub struct ScrapeOrchestrator {
    page: Arc<dyn JobPage>,
    extractor: PageExtractor,
    timings: ScrapeTimings,
    expansion_labels: Vec<String>,
    in_flight: Mutex<()>,
}

impl ScrapeOrchestrator {
    pub fn new(
        page: Arc<dyn JobPage>,
        extractor: PageExtractor,
        timings: ScrapeTimings,
        expansion_labels: Vec<String>,
    ) -> Self {
        Self {
            page,
            extractor,
            timings,
            expansion_labels,
            in_flight: Mutex::new(()),
        }
    }

    pub fn page(&self) -> &Arc<dyn JobPage> {
        &self.page
    }

    /// Runs one scrape. A second call while one is running is rejected
    /// with [`ScrapeError::Busy`].
    pub async fn scrape(&self) -> Result<JobRecord, ScrapeError> {
        let _guard = self.in_flight.try_lock().map_err(|_| {
            warn!("Scrape requested while another is running");
            ScrapeError::Busy
        })?;

        match timeout(self.timings.scrape_timeout, self.run()).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    "Scrape exceeded {:?} on {}",
                    self.timings.scrape_timeout,
                    self.page.url()
                );
                Err(ScrapeError::Timeout)
            }
        }
    }

    async fn run(&self) -> Result<JobRecord, ScrapeError> {
        info!("Scraping {}", self.page.url());
        sleep(self.timings.settle_delay).await;

        self.expand().await?;

        let title = self.field_or(Field::Title, UNTITLED_JOB).await?;
        let company = self.field_or(Field::Company, UNKNOWN_COMPANY).await?;

        self.expand().await?;

        let html = self.page.snapshot().await?;
        let description = self
            .extractor
            .resolve_description(&Html::parse_document(&html))?;

        info!("Scraped job: {} at {}", title, company);
        Ok(JobRecord::new(title, company, description, self.page.url()))
    }

    /// Clicks every matching expansion control, settling after each click.
    async fn expand(&self) -> Result<usize, ScrapeError> {
        let found = self.page.find_expanders(&self.expansion_labels).await?;
        let mut clicked = 0;
        for index in 0..found {
            if self.page.click_expander(index).await? {
                clicked += 1;
                sleep(self.timings.click_settle).await;
            }
        }
        if clicked > 0 {
            debug!("Expanded {} of {} controls", clicked, found);
        }
        Ok(clicked)
    }

    async fn field_or(&self, field: Field, placeholder: &str) -> Result<String, ScrapeError> {
        match self.poll_until_present(field).await {
            Ok(text) => Ok(text),
            Err(ScrapeError::ElementNotFound { .. }) => {
                warn!("No {} found, using '{}'", field, placeholder);
                Ok(placeholder.to_string())
            }
            Err(e) => Err(e),
        }
    }

    /// Re-reads the page until `field` has a non-empty match or the poll
    /// timeout elapses. Always reads at least once.
    pub async fn poll_until_present(&self, field: Field) -> Result<String, ScrapeError> {
        let deadline = Instant::now() + self.timings.poll_timeout;
        loop {
            let html = self.page.snapshot().await?;
            if let Some(text) = self.find_in(&html, field) {
                return Ok(text);
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(ScrapeError::ElementNotFound { field });
            }
            sleep(self.timings.poll_interval.min(deadline - now)).await;
        }
    }

    fn find_in(&self, html: &str, field: Field) -> Option<String> {
        self.extractor
            .find_text(&Html::parse_document(html), field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraping::page::StaticPage;
    use crate::scraping::selectors::{SelectorConfig, SelectorTable};

    const LINK: &str = "https://www.linkedin.com/jobs/view/99";

    fn description_html() -> String {
        format!(
            r#"<div class="description__text"><p>{}</p></div>"#,
            "Design and operate services. ".repeat(4)
        )
    }

    fn orchestrator(page: Arc<dyn JobPage>, timings: ScrapeTimings) -> ScrapeOrchestrator {
        let table = SelectorTable::from_config(&SelectorConfig::default()).unwrap();
        ScrapeOrchestrator::new(
            page,
            PageExtractor::new(Arc::new(table)),
            timings,
            vec!["show more".to_string()],
        )
    }

    #[tokio::test(start_paused = true)]
    async fn title_that_renders_late_is_found_by_polling() {
        let late = format!(
            r#"<h1 class="topcard__title">Platform Engineer</h1><a class="topcard__org-name-link">Acme</a>{}"#,
            description_html()
        );
        let page = Arc::new(StaticPage::with_frames(
            LINK,
            vec![
                "<div>loading</div>".to_string(),
                "<div>loading</div>".to_string(),
                late,
            ],
        ));

        let job = orchestrator(page, ScrapeTimings::default())
            .scrape()
            .await
            .unwrap();

        assert_eq!(job.title, "Platform Engineer");
        assert_eq!(job.company, "Acme");
        assert_eq!(job.link, LINK);
        assert!(job.description.starts_with("Design and operate services."));
    }

    #[tokio::test(start_paused = true)]
    async fn poll_gives_up_after_timeout() {
        let page = Arc::new(StaticPage::new(LINK, "<div>never renders</div>"));
        let timings = ScrapeTimings {
            poll_timeout: Duration::from_secs(2),
            ..ScrapeTimings::default()
        };
        let orchestrator = orchestrator(page, timings);

        let started = Instant::now();
        let err = orchestrator.poll_until_present(Field::Title).await.unwrap_err();

        assert_eq!(err, ScrapeError::ElementNotFound { field: Field::Title });
        assert!(started.elapsed() >= Duration::from_secs(2));
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn missing_title_degrades_but_missing_description_fails() {
        let page = Arc::new(StaticPage::new(LINK, description_html()));
        let job = orchestrator(page, ScrapeTimings::default().for_static_page())
            .scrape()
            .await
            .unwrap();
        assert_eq!(job.title, UNTITLED_JOB);
        assert_eq!(job.company, UNKNOWN_COMPANY);

        let page = Arc::new(StaticPage::new(LINK, r#"<h1 class="topcard__title">X</h1>"#));
        let err = orchestrator(page, ScrapeTimings::default().for_static_page())
            .scrape()
            .await
            .unwrap_err();
        assert_eq!(err, ScrapeError::DescriptionNotFound);
    }

    #[tokio::test(start_paused = true)]
    async fn expansion_controls_are_clicked_before_and_after_header() {
        let html = format!(
            r#"<button>Show more</button><h1 class="topcard__title">X</h1>{}"#,
            description_html()
        );
        let page = Arc::new(StaticPage::new(LINK, html));
        let orchestrator = orchestrator(page.clone(), ScrapeTimings::default());

        orchestrator.scrape().await.unwrap();

        assert_eq!(page.clicks(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn whole_scrape_is_bounded() {
        let page = Arc::new(StaticPage::new(LINK, description_html()));
        let timings = ScrapeTimings {
            scrape_timeout: Duration::from_secs(5),
            ..ScrapeTimings::default()
        };

        let err = orchestrator(page, timings).scrape().await.unwrap_err();

        assert_eq!(err, ScrapeError::Timeout);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_scrape_is_rejected() {
        let page = Arc::new(StaticPage::new(LINK, description_html()));
        let orchestrator = Arc::new(orchestrator(page, ScrapeTimings::default()));

        let first = tokio::spawn({
            let orchestrator = Arc::clone(&orchestrator);
            async move { orchestrator.scrape().await }
        });
        tokio::task::yield_now().await;

        assert_eq!(orchestrator.scrape().await.unwrap_err(), ScrapeError::Busy);
        assert!(first.await.unwrap().is_ok());
    }
}
