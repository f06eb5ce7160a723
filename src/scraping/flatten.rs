// src/scraping/flatten.rs
//! Subtree flattening: visible text of an element, with line breaks and bullets kept.

use std::sync::LazyLock;

use regex::Regex;
use scraper::node::{Element, Node};
use scraper::ElementRef;

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
static INDENTED_NEWLINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s+").expect("valid regex"));
static EXCESS_NEWLINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

/// Tags whose text is never page content.
const SKIPPED_TAGS: [&str; 4] = ["script", "style", "template", "noscript"];

/// Flattens the visible text under `element`.
///
/// Hidden subtrees are skipped whole. `br`, `p` and `div` emit a break and
/// `li` a bullet; [`clean_text`] then folds the breaks into spaces.
/// A hidden `element` itself yields an empty string.
pub fn extract_content(element: ElementRef<'_>) -> String {
    if is_hidden(element.value()) {
        return String::new();
    }

    let mut parts = Vec::new();
    collect_parts(element, &mut parts);
    clean_text(&parts.join(" "))
}

fn collect_parts(element: ElementRef<'_>, parts: &mut Vec<String>) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let text = text.trim();
                if !text.is_empty() {
                    parts.push(text.to_string());
                }
            }
            Node::Element(el) => {
                if is_hidden(el) || SKIPPED_TAGS.contains(&el.name()) {
                    continue;
                }
                match el.name() {
                    "br" | "p" | "div" => parts.push("\n".to_string()),
                    "li" => parts.push("\n• ".to_string()),
                    _ => {}
                }
                if let Some(child_element) = ElementRef::wrap(child) {
                    collect_parts(child_element, parts);
                }
            }
            _ => {}
        }
    }
}

/// Whether the element hides itself and its subtree.
pub fn is_hidden(element: &Element) -> bool {
    if element.attr("hidden").is_some() {
        return true;
    }
    element.attr("style").is_some_and(style_hides)
}

fn style_hides(style: &str) -> bool {
    style
        .split(';')
        .filter_map(|declaration| declaration.split_once(':'))
        .any(|(property, value)| {
            let property = property.trim().to_ascii_lowercase();
            let value = value
                .trim()
                .trim_end_matches("!important")
                .trim()
                .to_ascii_lowercase();
            match property.as_str() {
                "display" => value == "none",
                "visibility" => value == "hidden" || value == "collapse",
                _ => false,
            }
        })
}

/// Collapses every whitespace run, line breaks included, to one space and
/// trims the ends.
pub fn clean_text(text: &str) -> String {
    let text = WHITESPACE.replace_all(text, " ");
    let text = INDENTED_NEWLINE.replace_all(&text, "\n");
    let text = EXCESS_NEWLINES.replace_all(&text, "\n\n");
    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    fn flatten(html: &str) -> String {
        let document = Html::parse_fragment(html);
        let selector = Selector::parse("#root").unwrap();
        let root = document.select(&selector).next().expect("fixture has #root");
        extract_content(root)
    }

    #[test]
    fn inline_display_none_is_excluded() {
        let text = flatten(r#"<div id="root">visible<span style="display:none">hidden</span></div>"#);
        assert!(text.contains("visible"));
        assert!(!text.contains("hidden"));
    }

    #[test]
    fn visibility_hidden_and_hidden_attribute_are_excluded() {
        let text = flatten(
            r#"<div id="root">
                <p style="visibility: hidden !important">ghost</p>
                <p hidden>attr</p>
                <p>shown</p>
            </div>"#,
        );
        assert_eq!(text, "shown");
    }

    #[test]
    fn hidden_subtree_is_skipped_entirely() {
        let text = flatten(
            r#"<div id="root"><section style="DISPLAY: NONE"><p>deep <b>nested</b></p></section>kept</div>"#,
        );
        assert_eq!(text, "kept");
    }

    #[test]
    fn hidden_root_yields_nothing() {
        assert_eq!(flatten(r#"<div id="root" style="display:none">secret</div>"#), "");
    }

    #[test]
    fn paragraphs_and_list_items_flatten_to_one_line() {
        let text = flatten(
            r#"<div id="root"><p>About the role</p><ul><li>Rust</li><li>Tokio</li></ul></div>"#,
        );
        assert_eq!(text, "About the role • Rust • Tokio");
    }

    #[test]
    fn scripts_and_styles_are_not_text() {
        let text = flatten(
            r#"<div id="root"><style>.x{}</style><script>var a = 1;</script>Body</div>"#,
        );
        assert_eq!(text, "Body");
    }

    #[test]
    fn clean_text_folds_line_breaks_into_spaces() {
        assert_eq!(clean_text("  a \t  b\n\n\n\n  c  "), "a b c");
        assert_eq!(clean_text("a\n\n\nb"), "a b");
    }

    #[test]
    fn breaks_count_as_one_space_toward_length() {
        let text = flatten(r#"<div id="root"><p>ab</p><br><p>cd</p></div>"#);
        assert_eq!(text, "ab cd");
        assert_eq!(text.chars().count(), 5);
    }
}
