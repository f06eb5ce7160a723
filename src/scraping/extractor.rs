// src/scraping/extractor.rs
use std::sync::Arc;

use scraper::Html;
use tracing::{debug, error, info, warn};

use super::flatten::extract_content;
use super::selectors::{Field, SelectorTable};
use super::structured_data::description_from_blocks;
use crate::error::ScrapeError;
use crate::types::job::{JobRecord, UNKNOWN_COMPANY, UNTITLED_JOB};

/// The broad container is only trusted for text longer than this.
pub const MIN_CONTAINER_LEN: usize = 100;

/// Turns one parsed job page into a [`JobRecord`].
#[derive(Debug, Clone)]
pub struct PageExtractor {
    selectors: Arc<SelectorTable>,
    min_container_len: usize,
}

impl PageExtractor {
    pub fn new(selectors: Arc<SelectorTable>) -> Self {
        Self {
            selectors,
            min_container_len: MIN_CONTAINER_LEN,
        }
    }

    pub fn with_min_container_len(mut self, len: usize) -> Self {
        self.min_container_len = len;
        self
    }

    pub fn selectors(&self) -> &SelectorTable {
        &self.selectors
    }

    pub fn extract_html(&self, html: &str, link: &str) -> Result<JobRecord, ScrapeError> {
        self.extract(&Html::parse_document(html), link)
    }

    pub fn extract(&self, document: &Html, link: &str) -> Result<JobRecord, ScrapeError> {
        info!("Starting job info scraping for {}", link);

        let title = self.resolve_title(document);
        let company = self.resolve_company(document);
        let description = self.resolve_description(document)?;

        Ok(JobRecord::new(title, company, description, link))
    }

    /// Text of the first non-empty match for `field`, if any.
    pub fn find_text(&self, document: &Html, field: Field) -> Option<String> {
        self.selectors.chain(field).first_text(document)
    }

    pub fn resolve_title(&self, document: &Html) -> String {
        self.find_text(document, Field::Title).unwrap_or_else(|| {
            warn!("No title matched, using placeholder");
            UNTITLED_JOB.to_string()
        })
    }

    pub fn resolve_company(&self, document: &Html) -> String {
        self.find_text(document, Field::Company).unwrap_or_else(|| {
            warn!("No company matched, using placeholder");
            UNKNOWN_COMPANY.to_string()
        })
    }

    /// Structured data first, then the description selectors, then the
    /// broad container. Missing everywhere is the one fatal outcome.
    pub fn resolve_description(&self, document: &Html) -> Result<String, ScrapeError> {
        if let Some(description) =
            description_from_blocks(document, &self.selectors.structured_data)
        {
            return Ok(description);
        }

        debug!("Attempting to get description from DOM");
        for (pattern, element) in self.selectors.description.first_matches(document) {
            let content = extract_content(element);
            if !content.is_empty() {
                info!("Extracted description via '{}'", pattern);
                return Ok(content);
            }
            debug!("Description candidate '{}' had no visible text", pattern);
        }

        debug!("Trying container fallback");
        for (pattern, element) in self.selectors.container.first_matches(document) {
            let content = extract_content(element);
            let length = content.chars().count();
            if length > self.min_container_len {
                info!("Found description using container '{}'", pattern);
                return Ok(content);
            }
            debug!(
                "Container '{}' too short ({} characters), ignoring",
                pattern, length
            );
        }

        error!("No description found after all attempts");
        Err(ScrapeError::DescriptionNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraping::selectors::SelectorConfig;

    const LINK: &str = "https://www.linkedin.com/jobs/view/4242";

    fn extractor() -> PageExtractor {
        let table = SelectorTable::from_config(&SelectorConfig::default()).unwrap();
        PageExtractor::new(Arc::new(table))
    }

    fn long_text(len: usize) -> String {
        "abcdefghij".repeat(len / 10)
    }

    #[test]
    fn first_title_selector_in_priority_order_wins() {
        let html = r#"
            <h1 class="topcard__title">Lower priority</h1>
            <div data-job-title>  Staff Engineer </div>
            <div class="description__text">Work on things.</div>
        "#;
        let job = extractor().extract_html(html, LINK).unwrap();
        assert_eq!(job.title, "Staff Engineer");
    }

    #[test]
    fn missing_title_and_company_use_placeholders() {
        let html = r#"<div class="description__text">Work on things.</div>"#;
        let job = extractor().extract_html(html, LINK).unwrap();
        assert_eq!(job.title, UNTITLED_JOB);
        assert_eq!(job.company, UNKNOWN_COMPANY);
        assert_eq!(job.link, LINK);
        assert_eq!(job.timestamp, None);
    }

    #[test]
    fn structured_data_skips_dom_selectors() {
        let html = r#"
            <script type="application/ld+json">{"description":"From JSON"}</script>
            <div class="jobs-description">From the DOM</div>
        "#;
        let job = extractor().extract_html(html, LINK).unwrap();
        assert_eq!(job.description, "From JSON");
    }

    #[test]
    fn empty_description_candidate_falls_through() {
        let html = r#"
            <div class="jobs-description"><span style="display:none">only hidden</span></div>
            <div class="description__text"><p>Visible duties</p></div>
        "#;
        let job = extractor().extract_html(html, LINK).unwrap();
        assert_eq!(job.description, "Visible duties");
    }

    #[test]
    fn short_container_is_not_accepted() {
        let html = r#"<div class="jobs-search__job-details">Too short to trust</div>"#;
        let err = extractor().extract_html(html, LINK).unwrap_err();
        assert_eq!(err, ScrapeError::DescriptionNotFound);
    }

    #[test]
    fn long_container_is_accepted() {
        let body = long_text(150);
        let html = format!(r#"<div class="jobs-search__job-details">{}</div>"#, body);
        let job = extractor().extract_html(&html, LINK).unwrap();
        assert_eq!(job.description, body);
    }

    #[test]
    fn no_description_source_fails_extraction() {
        let html = r#"<h1 class="topcard__title">Engineer</h1>"#;
        assert_eq!(
            extractor().extract_html(html, LINK).unwrap_err(),
            ScrapeError::DescriptionNotFound
        );
    }

    #[test]
    fn topcard_page_with_hidden_block() {
        let visible = "We are hiring a backend engineer to build reliable data pipelines and services for customers across Europe and beyond!!!";
        assert_eq!(visible.chars().count(), 120);

        let html = format!(
            r#"<h1 class="topcard__title">Engineer</h1>
               <div class="jobs-search__job-details">
                   {visible}
                   <div style="display:none">duplicate mobile layout text</div>
               </div>"#
        );
        let job = extractor().extract_html(&html, LINK).unwrap();

        assert_eq!(job.title, "Engineer");
        assert_eq!(job.description, visible);
        assert!(!job.description.contains("duplicate"));
    }
}
