// src/error.rs
use std::path::PathBuf;

use thiserror::Error;

use crate::scraping::selectors::Field;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid {field} selector '{selector}': {reason}")]
    InvalidSelector {
        field: Field,
        selector: String,
        reason: String,
    },

    #[error("invalid endpoint URL '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScrapeError {
    #[error("no element matched the {field} selectors")]
    ElementNotFound { field: Field },

    #[error("Could not find job description. Please try refreshing the page or selecting a specific job posting.")]
    DescriptionNotFound,

    #[error("structured data did not parse: {0}")]
    ParseFailure(String),

    #[error("Scraping timed out")]
    Timeout,

    #[error("a scrape is already running on this page")]
    Busy,

    #[error("Invalid job data received: {0}")]
    InvalidRecord(String),

    #[error("page unavailable: {0}")]
    Page(String),
}

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {endpoint} failed: {source}")]
    Request {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to send data to {endpoint} (HTTP {status})")]
    Status {
        endpoint: String,
        status: reqwest::StatusCode,
    },

    #[error("All endpoints failed. Last error: {last_error}")]
    AllEndpointsFailed {
        last_error: String,
        attempts: Vec<String>,
    },

    #[error("no delivery endpoints configured")]
    NoEndpoints,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    #[error("content agent is not injected in this tab")]
    NotInjected,

    #[error("content agent channel closed")]
    ChannelClosed,

    #[error("content agent did not answer in time")]
    Timeout,

    #[error("{0}")]
    Remote(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("storage document is corrupt: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum PopupError {
    #[error("Please navigate to a LinkedIn job posting (current page: {0})")]
    NavigationMismatch(String),

    #[error("no saved job to send")]
    NothingSaved,

    #[error(transparent)]
    Scrape(#[from] ScrapeError),

    #[error(transparent)]
    Relay(#[from] RelayError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}
