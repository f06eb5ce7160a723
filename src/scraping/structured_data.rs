// src/scraping/structured_data.rs
//! Job descriptions embedded as JSON in the page (API payloads and JSON-LD).

use scraper::{ElementRef, Html};
use serde_json::Value;
use tracing::{debug, info};

use super::selectors::SelectorChain;
use crate::error::ScrapeError;

/// Field path used by the site's own API payloads.
const API_DESCRIPTION_PATH: &str = "/data/description/text";

/// Scans every structured-data block in chain order and returns the first
/// description found. Blocks that do not parse are skipped.
pub fn description_from_blocks(document: &Html, blocks: &SelectorChain) -> Option<String> {
    for block in blocks.all_matches(document) {
        let Some(payload) = block_payload(block) else {
            continue;
        };

        match parse_block(&payload) {
            Ok(value) => {
                if let Some(description) = description_in(&value) {
                    info!("Found description in structured data");
                    return Some(description);
                }
            }
            Err(e) => {
                debug!("Skipping structured-data block: {}", e);
            }
        }
    }
    None
}

fn parse_block(payload: &str) -> Result<Value, ScrapeError> {
    serde_json::from_str(payload).map_err(|e| ScrapeError::ParseFailure(e.to_string()))
}

/// Raw JSON text of a block. `code` payloads arrive wrapped in an HTML
/// comment with entity-escaped quotes.
fn block_payload(block: ElementRef<'_>) -> Option<String> {
    let text = block.text().collect::<String>();
    if !text.trim().is_empty() {
        return Some(text);
    }

    let inner = block.inner_html();
    let inner = inner.trim();
    let inner = inner
        .strip_prefix("<!--")
        .and_then(|rest| rest.strip_suffix("-->"))
        .unwrap_or(inner)
        .trim();

    if inner.is_empty() {
        None
    } else {
        Some(decode_entities(inner))
    }
}

fn description_in(value: &Value) -> Option<String> {
    match value {
        Value::Array(items) => items.iter().find_map(description_in),
        Value::Object(map) => value
            .pointer(API_DESCRIPTION_PATH)
            .and_then(Value::as_str)
            .or_else(|| map.get("description").and_then(Value::as_str))
            .filter(|text| !text.trim().is_empty())
            .map(str::to_string)
            .or_else(|| map.get("@graph").and_then(description_in)),
        _ => None,
    }
}

/// Decodes every HTML character reference (named, decimal and hex) by
/// letting the HTML parser read the payload as text.
fn decode_entities(raw: &str) -> String {
    Html::parse_fragment(raw).root_element().text().collect()
}
