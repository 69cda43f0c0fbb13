//! Record enrichment and the CPU-bound transform pool.
//!
//! Enrichment derives the director, the release year and a year-weighted
//! score from a raw record. Bad input never fails: unparseable pieces fall
//! back to [`UNKNOWN`] or to a zero score.

use once_cell::sync::Lazy;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use regex_lite::Regex;

use super::HarvestError;
use crate::record::{EnrichedRecord, RawRecord, UNKNOWN};

/// Marker preceding the director's name in the info text.
pub const DIRECTOR_MARKER: &str = "导演:";

/// Accepted release years, inclusive.
pub const MIN_YEAR: u32 = 1900;
pub const MAX_YEAR: u32 = 2025;

/// Year assumed for weighting when the record has none.
pub const DEFAULT_WEIGHT_YEAR: u32 = 2000;

/// Reference year of the weighting rule.
pub const WEIGHT_REFERENCE_YEAR: u32 = 2026;

// regex-lite classes are ASCII-only: a year glued to CJK text ("1994年") is
// still a standalone token.
static YEAR_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{4})\b").unwrap());

/// Enrich one raw record.
pub fn enrich(raw: &RawRecord) -> EnrichedRecord {
    let (director, year) = parse_info(&raw.info_text);
    let score = parse_score(&raw.score_text);
    let weighted_score = match score {
        Some(score) => weighted_score(score, &year),
        None => 0.0,
    };

    EnrichedRecord {
        title: raw.title.clone(),
        score: score.unwrap_or(0.0),
        year,
        director,
        weighted_score,
    }
}

/// Scan info lines for the director and the release year.
///
/// Only the first 4-digit token of a line is a year candidate. Scanning stops
/// at the line whose candidate is in range; a director marker on a later line
/// is not seen.
fn parse_info(info: &str) -> (String, String) {
    let mut director = UNKNOWN.to_string();
    let mut year = UNKNOWN.to_string();

    for line in info.lines().map(str::trim) {
        if let Some((_, rest)) = line.split_once(DIRECTOR_MARKER) {
            director = rest
                .split_whitespace()
                .next()
                .unwrap_or(UNKNOWN)
                .to_string();
        }

        if let Some(found) = find_year(line) {
            year = found;
            break;
        }
    }

    (director, year)
}

fn find_year(line: &str) -> Option<String> {
    let token = YEAR_TOKEN.captures(line)?.get(1)?.as_str();
    let value = token.parse::<u32>().ok()?;
    (MIN_YEAR..=MAX_YEAR)
        .contains(&value)
        .then(|| token.to_string())
}

/// Parsed score, or `None` when the text is not a finite non-negative number.
fn parse_score(text: &str) -> Option<f64> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|score| score.is_finite() && *score >= 0.0)
        .map(f64::abs)
}

/// `score * (1 + (2026 - year) / 100)`, rounded to two decimals.
///
/// Older titles get a linearly larger multiplier. A year that is not a
/// four-digit numeral weighs as 2000. A product that overflows yields 0.
pub fn weighted_score(score: f64, year: &str) -> f64 {
    let year_num = if year.len() == 4 && year.bytes().all(|b| b.is_ascii_digit()) {
        year.parse::<u32>().unwrap_or(DEFAULT_WEIGHT_YEAR)
    } else {
        DEFAULT_WEIGHT_YEAR
    };
    let multiplier = 1.0 + (WEIGHT_REFERENCE_YEAR as f64 - year_num as f64) / 100.0;
    let weighted = round2(score * multiplier);
    if weighted.is_finite() && weighted > 0.0 {
        weighted
    } else {
        0.0
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Fixed-width pool for enrichment.
///
/// Each task reads one immutable record and shares nothing with the others.
pub struct TransformPool {
    pool: ThreadPool,
}

impl TransformPool {
    pub fn new(width: usize) -> Result<Self, HarvestError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(width.max(1))
            .thread_name(|idx| format!("harvest-transform-{idx}"))
            .build()
            .map_err(|e| HarvestError::TransformPool(e.to_string()))?;
        Ok(Self { pool })
    }

    pub fn width(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Enrich every record. Output order matches input order.
    pub fn run(&self, records: &[RawRecord]) -> Vec<EnrichedRecord> {
        self.pool
            .install(|| records.par_iter().map(enrich).collect())
    }
}
