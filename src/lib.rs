// src/lib.rs
//! Captures LinkedIn job postings from a page, keeps the last one in a local
//! slot and relays it to the Jobs AI service.

pub mod cli;
pub mod core;
pub mod error;
pub mod popup;
pub mod relay;
pub mod scraping;
pub mod types;

pub use crate::core::{ConfigManager, DeliveryClient, JobStore, RelayConfig};
pub use error::{ConfigError, DeliveryError, PopupError, RelayError, ScrapeError, StoreError};
pub use popup::{PopupController, PopupView};
pub use relay::{BackgroundService, Tab};
pub use scraping::{PageExtractor, ScrapeOrchestrator};
pub use types::{ContentResponse, DeliveryReceipt, JobRecord};
