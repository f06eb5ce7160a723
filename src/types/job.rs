// src/types/job.rs
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ScrapeError;

pub const UNTITLED_JOB: &str = "Untitled Job";
pub const UNKNOWN_COMPANY: &str = "Unknown Company";

/// Shortest description the popup accepts as a real posting.
pub const MIN_DESCRIPTION_LEN: usize = 50;

/// One scraped job posting.
///
/// `timestamp` stays `None` until the popup persists the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub title: String,
    pub company: String,
    pub description: String,
    pub link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

/// Body of the delivery POST: the record without its capture time.
#[derive(Debug, Serialize)]
pub struct DeliveryPayload<'a> {
    pub title: &'a str,
    pub company: &'a str,
    pub description: &'a str,
    pub link: &'a str,
}

impl JobRecord {
    pub fn new(
        title: impl Into<String>,
        company: impl Into<String>,
        description: impl Into<String>,
        link: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            company: company.into(),
            description: description.into(),
            link: link.into(),
            timestamp: None,
        }
    }

    /// Copy of the record carrying its capture time.
    pub fn captured_at(&self, now: DateTime<Utc>) -> Self {
        Self {
            timestamp: Some(now.timestamp_millis()),
            ..self.clone()
        }
    }

    pub fn captured_time(&self) -> Option<DateTime<Utc>> {
        self.timestamp
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
    }

    pub fn payload(&self) -> DeliveryPayload<'_> {
        DeliveryPayload {
            title: &self.title,
            company: &self.company,
            description: &self.description,
            link: &self.link,
        }
    }

    /// Checks the record before it may be persisted.
    pub fn validate(&self, min_description_len: usize) -> Result<(), ScrapeError> {
        if self.title.trim().is_empty() {
            return Err(ScrapeError::InvalidRecord("missing title".to_string()));
        }

        let length = self.description.chars().count();
        if length < min_description_len {
            return Err(ScrapeError::InvalidRecord(format!(
                "description has {} characters, expected at least {}",
                length, min_description_len
            )));
        }

        Ok(())
    }
}
