//! Extractor for the ranked listing markup.
//!
//! Each item is a `div.item` holding a `span.title`, a `span.rating_num` and a
//! `p` whose text lines carry the director and the release year.

use scraper::{ElementRef, Html, Selector};

use super::RecordExtractor;
use crate::record::{RawRecord, UNKNOWN};

/// Separator between the primary title and its foreign-language variant.
const TITLE_SEPARATOR: char = '/';

/// Score text used when an item has no rating.
const MISSING_SCORE: &str = "0.0";

/// Stateless extractor for listing pages.
#[derive(Clone)]
pub struct ListingExtractor {
    selectors: ListingSelectors,
}

impl Default for ListingExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ListingExtractor {
    pub fn new() -> Self {
        Self {
            selectors: ListingSelectors::new(),
        }
    }

    fn extract_item(&self, item: ElementRef<'_>) -> RawRecord {
        let title = item
            .select(&self.selectors.title)
            .next()
            .map(element_text)
            .map(|text| primary_title(&text))
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| UNKNOWN.to_string());

        let score_text = item
            .select(&self.selectors.score)
            .next()
            .map(element_text)
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| MISSING_SCORE.to_string());

        let info_text = item
            .select(&self.selectors.info)
            .next()
            .map(element_lines)
            .unwrap_or_default();

        RawRecord {
            title,
            score_text,
            info_text,
        }
    }
}

impl RecordExtractor for ListingExtractor {
    fn extract(&self, content: &str) -> Vec<RawRecord> {
        if content.trim().is_empty() {
            return Vec::new();
        }

        let document = Html::parse_document(content);
        document
            .select(&self.selectors.item)
            .map(|item| self.extract_item(item))
            .collect()
    }
}

#[derive(Clone)]
struct ListingSelectors {
    item: Selector,
    title: Selector,
    score: Selector,
    info: Selector,
}

impl ListingSelectors {
    fn new() -> Self {
        Self {
            item: Selector::parse("div.item").expect("item selector"),
            title: Selector::parse("span.title").expect("title selector"),
            score: Selector::parse("span.rating_num").expect("score selector"),
            info: Selector::parse("p").expect("info selector"),
        }
    }
}

/// Concatenated, trimmed text of an element.
fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Text nodes of an element, one trimmed non-empty node per line.
fn element_lines(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::lines)
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Title text before the first separator.
fn primary_title(title: &str) -> String {
    title
        .split(TITLE_SEPARATOR)
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}
