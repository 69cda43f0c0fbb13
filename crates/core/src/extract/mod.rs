//! Record extraction from raw page content.
//!
//! Extraction never fails: missing pieces degrade to sentinel values and a
//! page without items yields an empty list.

mod listing;

pub use listing::ListingExtractor;

use crate::record::RawRecord;

/// Turns one page of content into raw records.
pub trait RecordExtractor: Send + Sync {
    /// Extract every item on the page. Pure and deterministic.
    fn extract(&self, content: &str) -> Vec<RawRecord>;
}
