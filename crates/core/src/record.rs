//! Harvested record types.

use serde::{Deserialize, Serialize};

/// Sentinel used for any text field that could not be extracted or parsed.
pub const UNKNOWN: &str = "unknown";

/// One harvested item before enrichment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    pub title: String,
    /// Unvalidated numeric text.
    pub score_text: String,
    /// Free text carrying the year and director, one fact group per line.
    pub info_text: String,
}

impl RawRecord {
    pub fn new(
        title: impl Into<String>,
        score_text: impl Into<String>,
        info_text: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            score_text: score_text.into(),
            info_text: info_text.into(),
        }
    }
}

/// One item after enrichment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedRecord {
    pub title: String,
    /// Parsed score, 0.0 when the source text was not a usable number.
    pub score: f64,
    /// Four-digit year or [`UNKNOWN`].
    pub year: String,
    /// Director or [`UNKNOWN`].
    pub director: String,
    /// Year-weighted score rounded to two decimals; always finite and >= 0.
    pub weighted_score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enriched_record_serialization() {
        let record = EnrichedRecord {
            title: "Test".to_string(),
            score: 8.5,
            year: "2000".to_string(),
            director: UNKNOWN.to_string(),
            weighted_score: 10.71,
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["title"], "Test");
        assert_eq!(json["year"], "2000");
        assert_eq!(json["director"], "unknown");
        assert_eq!(json["weighted_score"], 10.71);
    }
}
