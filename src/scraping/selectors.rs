// src/scraping/selectors.rs
//! Selector chains: per field, an ordered list of CSS selectors tried until one matches.

use std::fmt;

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Title,
    Company,
    Description,
    Container,
    StructuredData,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Title => "title",
            Field::Company => "company",
            Field::Description => "description",
            Field::Container => "container",
            Field::StructuredData => "structured-data",
        };
        f.write_str(name)
    }
}

/// Raw selector lists as they appear in configuration. Earlier entries win.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub title: Vec<String>,
    pub company: Vec<String>,
    pub description: Vec<String>,
    pub container: Vec<String>,
    pub structured_data: Vec<String>,
}

fn owned(selectors: &[&str]) -> Vec<String> {
    selectors.iter().map(|s| s.to_string()).collect()
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            title: owned(&[
                "[data-job-title]",
                ".jobs-unified-top-card__job-title",
                ".job-details-jobs-unified-top-card__job-title",
                ".topcard__title",
                "h1.top-card-layout__title",
                ".jobs-search__job-details h2",
                ".jobs-search-results-list__title",
                ".job-view-layout h1",
                ".ember-view [data-test-job-card-title]",
            ]),
            company: owned(&[
                ".jobs-unified-top-card__company-name",
                ".job-details-jobs-unified-top-card__company-name",
                ".topcard__org-name-link",
                ".job-card-container__company-name",
                ".jobs-details-top-card__company-url",
                ".ember-view [data-test-job-card-company-name]",
            ]),
            description: owned(&[
                ".jobs-description",
                ".jobs-description__content",
                ".jobs-description-content__text",
                ".show-more-less-html__markup",
                "#job-details > span",
                ".jobs-box__html-content > span",
                ".description__text",
                "[data-job-description]",
                ".job-view-layout [class*='description']",
            ]),
            container: owned(&[".jobs-search__job-details"]),
            structured_data: owned(&[
                "code[id^='bpr-guid-']",
                "script[type='application/ld+json']",
            ]),
        }
    }
}

/// A compiled, ordered selector list for one field.
#[derive(Debug, Clone)]
pub struct SelectorChain {
    field: Field,
    entries: Vec<(String, Selector)>,
}

impl SelectorChain {
    pub fn parse(field: Field, patterns: &[String]) -> Result<Self, ConfigError> {
        let mut entries = Vec::with_capacity(patterns.len());
        for pattern in patterns {
            if entries.iter().any(|(seen, _)| seen == pattern) {
                continue;
            }
            let selector =
                Selector::parse(pattern).map_err(|e| ConfigError::InvalidSelector {
                    field,
                    selector: pattern.clone(),
                    reason: e.to_string(),
                })?;
            entries.push((pattern.clone(), selector));
        }
        Ok(Self { field, entries })
    }

    pub fn field(&self) -> Field {
        self.field
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The first element of every selector that matches, in chain order.
    pub fn first_matches<'a, 'b>(
        &'a self,
        document: &'b Html,
    ) -> impl Iterator<Item = (&'a str, ElementRef<'b>)> + 'a
    where
        'b: 'a,
    {
        self.entries.iter().filter_map(move |(pattern, selector)| {
            document
                .select(selector)
                .next()
                .map(|element| (pattern.as_str(), element))
        })
    }

    /// Every element matched by every selector, in chain order.
    pub fn all_matches<'a, 'b>(
        &'a self,
        document: &'b Html,
    ) -> impl Iterator<Item = ElementRef<'b>> + 'a
    where
        'b: 'a,
    {
        self.entries
            .iter()
            .flat_map(move |(_, selector)| document.select(selector))
    }

    /// Trimmed text of the first matched element whose text is non-empty.
    pub fn first_text(&self, document: &Html) -> Option<String> {
        self.first_matches(document).find_map(|(pattern, element)| {
            let text = element.text().collect::<String>();
            let text = text.trim();
            if text.is_empty() {
                None
            } else {
                tracing::debug!("Found {} via '{}'", self.field, pattern);
                Some(text.to_string())
            }
        })
    }
}

/// The `field → ordered selectors` table handed to the extractor.
#[derive(Debug, Clone)]
pub struct SelectorTable {
    pub title: SelectorChain,
    pub company: SelectorChain,
    pub description: SelectorChain,
    pub container: SelectorChain,
    pub structured_data: SelectorChain,
}

impl SelectorTable {
    pub fn from_config(config: &SelectorConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            title: SelectorChain::parse(Field::Title, &config.title)?,
            company: SelectorChain::parse(Field::Company, &config.company)?,
            description: SelectorChain::parse(Field::Description, &config.description)?,
            container: SelectorChain::parse(Field::Container, &config.container)?,
            structured_data: SelectorChain::parse(
                Field::StructuredData,
                &config.structured_data,
            )?,
        })
    }

    pub fn chain(&self, field: Field) -> &SelectorChain {
        match field {
            Field::Title => &self.title,
            Field::Company => &self.company,
            Field::Description => &self.description,
            Field::Container => &self.container,
            Field::StructuredData => &self.structured_data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(patterns: &[&str]) -> SelectorChain {
        SelectorChain::parse(Field::Title, &owned(patterns)).unwrap()
    }

    #[test]
    fn default_table_compiles() {
        let table = SelectorTable::from_config(&SelectorConfig::default()).unwrap();
        assert!(!table.title.is_empty());
        assert_eq!(table.container.len(), 1);
    }

    #[test]
    fn invalid_selector_names_field_and_pattern() {
        let mut config = SelectorConfig::default();
        config.company.push("div[[".to_string());

        match SelectorTable::from_config(&config) {
            Err(ConfigError::InvalidSelector { field, selector, .. }) => {
                assert_eq!(field, Field::Company);
                assert_eq!(selector, "div[[");
            }
            other => panic!("expected invalid selector, got {:?}", other),
        }
    }

    #[test]
    fn duplicate_patterns_are_dropped() {
        assert_eq!(chain(&[".a", ".b", ".a"]).len(), 2);
    }

    #[test]
    fn earlier_selector_wins_even_when_later_also_matches() {
        let html = Html::parse_document(
            r#"<h2 class="late">Later</h2><h1 class="early">  Earlier  </h1>"#,
        );
        assert_eq!(
            chain(&[".early", ".late"]).first_text(&html).as_deref(),
            Some("Earlier")
        );
    }

    #[test]
    fn empty_match_falls_through_to_next_selector() {
        let html = Html::parse_document(r#"<h1 class="a">   </h1><h2 class="b">Backend</h2>"#);
        assert_eq!(chain(&[".a", ".b"]).first_text(&html).as_deref(), Some("Backend"));
    }

    #[test]
    fn no_match_yields_none() {
        let html = Html::parse_document("<p>nothing here</p>");
        assert_eq!(chain(&[".missing"]).first_text(&html), None);
    }
}
