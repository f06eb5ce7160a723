// src/scraping/mod.rs
pub mod extractor;
pub mod flatten;
pub mod orchestrator;
pub mod page;
pub mod selectors;
pub mod structured_data;

pub use extractor::PageExtractor;
pub use orchestrator::{ScrapeOrchestrator, ScrapeTimings};
pub use page::{HttpPage, JobPage, StaticPage};
pub use selectors::{Field, SelectorConfig, SelectorTable};
