//! Ranking of enriched records.

use crate::record::EnrichedRecord;

/// Records ordered by weighted score, descending.
///
/// The sort is stable: records with equal weighted scores keep their input
/// order.
pub fn rank(records: &[EnrichedRecord]) -> Vec<EnrichedRecord> {
    let mut ranked = records.to_vec();
    ranked.sort_by(|a, b| b.weighted_score.total_cmp(&a.weighted_score));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str, weighted_score: f64) -> EnrichedRecord {
        EnrichedRecord {
            title: title.to_string(),
            score: weighted_score,
            year: "2000".to_string(),
            director: "d".to_string(),
            weighted_score,
        }
    }

    fn titles(records: &[EnrichedRecord]) -> Vec<&str> {
        records.iter().map(|r| r.title.as_str()).collect()
    }

    #[test]
    fn test_rank_descending_with_stable_ties() {
        let input = vec![record("A", 10.0), record("B", 10.0), record("C", 9.0)];
        assert_eq!(titles(&rank(&input)), vec!["A", "B", "C"]);

        let input = vec![record("C", 9.0), record("B", 10.0), record("A", 10.0)];
        assert_eq!(titles(&rank(&input)), vec!["B", "A", "C"]);
    }

    #[test]
    fn test_rank_leaves_input_untouched() {
        let input = vec![record("low", 1.0), record("high", 5.0)];
        let ranked = rank(&input);
        assert_eq!(titles(&input), vec!["low", "high"]);
        assert_eq!(titles(&ranked), vec!["high", "low"]);
    }

    #[test]
    fn test_rank_zero_scores_sink() {
        let input = vec![
            record("zero-1", 0.0),
            record("mid", 7.5),
            record("zero-2", 0.0),
            record("top", 12.8),
        ];
        assert_eq!(
            titles(&rank(&input)),
            vec!["top", "mid", "zero-1", "zero-2"]
        );
    }

    #[test]
    fn test_rank_empty() {
        assert!(rank(&[]).is_empty());
    }
}
