// src/core/config_manager.rs
//! Configuration: built-in defaults, an optional YAML file with per-environment
//! sections, then environment variable overrides.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;
use url::Url;

use super::service_client::DEFAULT_ENDPOINTS;
use crate::error::ConfigError;
use crate::scraping::extractor::MIN_CONTAINER_LEN;
use crate::scraping::orchestrator::ScrapeTimings;
use crate::scraping::selectors::{SelectorConfig, SelectorTable};
use crate::types::job::MIN_DESCRIPTION_LEN;

pub const DEFAULT_CONFIG_FILE: &str = "job-relay.yaml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timings {
    pub settle_delay_ms: u64,
    pub click_settle_ms: u64,
    pub poll_interval_ms: u64,
    pub poll_timeout_ms: u64,
    pub scrape_timeout_ms: u64,
    pub inject_settle_ms: u64,
    pub ping_timeout_ms: u64,
    pub http_timeout_secs: u64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            settle_delay_ms: 1000,
            click_settle_ms: 500,
            poll_interval_ms: 250,
            poll_timeout_ms: 10_000,
            scrape_timeout_ms: 30_000,
            inject_settle_ms: 2000,
            ping_timeout_ms: 1000,
            http_timeout_secs: 30,
        }
    }
}

impl Timings {
    pub fn scrape(&self) -> ScrapeTimings {
        ScrapeTimings {
            settle_delay: Duration::from_millis(self.settle_delay_ms),
            click_settle: Duration::from_millis(self.click_settle_ms),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            poll_timeout: Duration::from_millis(self.poll_timeout_ms),
            scrape_timeout: Duration::from_millis(self.scrape_timeout_ms),
        }
    }

    pub fn scrape_timeout(&self) -> Duration {
        Duration::from_millis(self.scrape_timeout_ms)
    }

    pub fn inject_settle(&self) -> Duration {
        Duration::from_millis(self.inject_settle_ms)
    }

    pub fn ping_timeout(&self) -> Duration {
        Duration::from_millis(self.ping_timeout_ms)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub selectors: SelectorConfig,
    /// Delivery endpoints in priority order.
    pub endpoints: Vec<String>,
    pub expansion_labels: Vec<String>,
    pub min_description_len: usize,
    pub min_container_len: usize,
    pub timings: Timings,
    pub store_path: PathBuf,
    pub log_path: PathBuf,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            selectors: SelectorConfig::default(),
            endpoints: DEFAULT_ENDPOINTS.iter().map(|e| e.to_string()).collect(),
            expansion_labels: vec!["show more".to_string(), "see more".to_string()],
            min_description_len: MIN_DESCRIPTION_LEN,
            min_container_len: MIN_CONTAINER_LEN,
            timings: Timings::default(),
            store_path: PathBuf::from(".job-relay/storage.json"),
            log_path: PathBuf::from("/tmp/job-relay.log"),
        }
    }
}

impl RelayConfig {
    pub fn selector_table(&self) -> Result<SelectorTable, ConfigError> {
        SelectorTable::from_config(&self.selectors)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.selector_table()?;
        for endpoint in &self.endpoints {
            let url = Url::parse(endpoint).map_err(|e| ConfigError::InvalidEndpoint {
                endpoint: endpoint.clone(),
                reason: e.to_string(),
            })?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(ConfigError::InvalidEndpoint {
                    endpoint: endpoint.clone(),
                    reason: format!("unsupported scheme '{}'", url.scheme()),
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    local: Option<RelayConfig>,
    #[serde(default)]
    production: Option<RelayConfig>,
}

pub struct ConfigManager;

impl ConfigManager {
    /// Load configuration for the current environment. `path` defaults to
    /// `job-relay.yaml` in the working directory; a missing default file
    /// means built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<RelayConfig, ConfigError> {
        let environment = Self::get_environment();
        info!("Loading configuration for environment: {}", environment);

        let mut config = match path {
            Some(path) => Self::load_from_file(path, &environment)?,
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::load_from_file(&default_path, &environment)?
                } else {
                    RelayConfig::default()
                }
            }
        };

        Self::apply_overrides(&mut config, |key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn get_environment() -> String {
        std::env::var("JOB_RELAY_ENV")
            .or_else(|_| std::env::var("ENVIRONMENT"))
            .unwrap_or_else(|_| "local".to_string())
    }

    fn load_from_file(path: &Path, environment: &str) -> Result<RelayConfig, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Read configuration from {}", path.display());
        Self::from_yaml(&content, environment)
    }

    /// Pick the section for `environment`; a missing section means defaults.
    pub fn from_yaml(content: &str, environment: &str) -> Result<RelayConfig, ConfigError> {
        let file: ConfigFile = serde_yaml::from_str(content)?;
        let section = match environment {
            "production" => file.production,
            _ => file.local,
        };
        Ok(section.unwrap_or_default())
    }

    /// `JOB_RELAY_ENDPOINTS` (comma separated) and `JOB_RELAY_STORE`.
    pub fn apply_overrides(config: &mut RelayConfig, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(endpoints) = lookup("JOB_RELAY_ENDPOINTS") {
            let endpoints: Vec<String> = endpoints
                .split(',')
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(str::to_string)
                .collect();
            if !endpoints.is_empty() {
                info!("Using {} endpoints from environment", endpoints.len());
                config.endpoints = endpoints;
            }
        }
        if let Some(store) = lookup("JOB_RELAY_STORE").filter(|s| !s.trim().is_empty()) {
            config.store_path = PathBuf::from(store);
        }
    }
}
