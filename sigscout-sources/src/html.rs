//! HTML parsing helpers shared by the scraping adapters
//!
//! Thin wrappers over the `scraper` crate that return owned text, so
//! parsed documents never live across an await point. Callers pass
//! precompiled selectors and class patterns; the fixed ones live here.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use regex::Regex;
use scraper::{node::Node, ElementRef, Html, Selector};

static HEADING_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1, h2, h3, h4, strong, b").unwrap());

static TABLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("table").unwrap());

static ROW_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());

static CELL_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td, th").unwrap());

static ANCHOR_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").unwrap());

static BODY_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("body").unwrap());

static DATE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2}[-/]\d{1,2}[-/]\d{2,4})").unwrap());

/// One advisory-like block extracted from a page
#[derive(Debug, Clone)]
pub struct Section {
    /// First heading/strong text inside the block, if any
    pub title: Option<String>,
    /// Full block text, whitespace-normalized
    pub text: String,
}

/// Normalize whitespace in text
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn element_text(el: ElementRef) -> String {
    normalize_whitespace(&el.text().collect::<Vec<_>>().join(" "))
}

fn heading_text(el: ElementRef) -> Option<String> {
    el.select(&HEADING_SELECTOR)
        .next()
        .map(element_text)
        .filter(|t| !t.is_empty())
}

/// Extract blocks matching `selector` whose class attribute matches
/// `class_pattern`.
pub fn class_filtered_sections(
    html: &str,
    selector: &Selector,
    class_pattern: &Regex,
) -> Vec<Section> {
    let document = Html::parse_document(html);

    document
        .select(selector)
        .filter(|el| {
            el.value()
                .attr("class")
                .is_some_and(|class| class_pattern.is_match(class))
        })
        .map(|el| Section {
            title: heading_text(el),
            text: element_text(el),
        })
        .collect()
}

/// Extract data rows (header skipped) from tables whose class matches
/// `class_pattern`. Each row is its cells' text joined with spaces.
pub fn class_filtered_table_rows(html: &str, class_pattern: &Regex) -> Vec<String> {
    let document = Html::parse_document(html);

    let mut rows = Vec::new();
    for table in document.select(&TABLE_SELECTOR) {
        if !table
            .value()
            .attr("class")
            .is_some_and(|class| class_pattern.is_match(class))
        {
            continue;
        }
        for row in table.select(&ROW_SELECTOR).skip(1) {
            let cells: Vec<String> = row.select(&CELL_SELECTOR).map(element_text).collect();
            if cells.len() >= 2 {
                rows.push(cells.join(" "));
            }
        }
    }
    rows
}

/// Links to PDF documents: (href, link text)
pub fn pdf_links(html: &str) -> Vec<(String, String)> {
    let document = Html::parse_document(html);

    document
        .select(&ANCHOR_SELECTOR)
        .filter_map(|el| {
            let href = el.value().attr("href")?;
            if !href.to_lowercase().ends_with(".pdf") {
                return None;
            }
            let text = element_text(el);
            if text.is_empty() {
                return None;
            }
            Some((href.to_string(), text))
        })
        .collect()
}

/// Text of up to `limit` distinct parent elements containing `keyword`
pub fn keyword_mentions(html: &str, keyword: &str, limit: usize) -> Vec<String> {
    let document = Html::parse_document(html);
    let keyword_lower = keyword.to_lowercase();
    let mut mentions: Vec<String> = Vec::new();

    for node in document.tree.root().descendants() {
        if mentions.len() >= limit {
            break;
        }
        if let Node::Text(text_node) = node.value() {
            if !text_node.to_lowercase().contains(&keyword_lower) {
                continue;
            }
            let Some(parent) = node.parent().and_then(ElementRef::wrap) else {
                continue;
            };
            let text = element_text(parent);
            if !text.is_empty() && !mentions.contains(&text) {
                mentions.push(text);
            }
        }
    }
    mentions
}

/// Whole-page body text, skipping script/style/noscript subtrees
pub fn page_text(html: &str) -> String {
    let document = Html::parse_document(html);

    let Some(body) = document.select(&BODY_SELECTOR).next() else {
        return String::new();
    };

    let mut parts = Vec::new();
    for node in body.descendants() {
        if let Node::Text(text_node) = node.value() {
            let in_excluded = node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .map(|el| matches!(el.name(), "script" | "style" | "noscript"))
                    .unwrap_or(false)
            });
            if !in_excluded {
                let trimmed = text_node.trim();
                if !trimmed.is_empty() {
                    parts.push(trimmed.to_string());
                }
            }
        }
    }
    normalize_whitespace(&parts.join(" "))
}

/// Pull a dd-mm-yyyy style date out of advisory text
pub fn extract_date(text: &str) -> Option<DateTime<Utc>> {
    let raw = DATE_REGEX.find(text)?.as_str();

    for format in ["%d-%m-%Y", "%d/%m/%Y", "%d-%m-%y", "%d/%m/%y"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            let naive = date.and_hms_opt(0, 0, 0)?;
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    None
}
