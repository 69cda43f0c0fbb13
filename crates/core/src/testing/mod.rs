//! Testing utilities and mock implementations.
//!
//! This module provides a scripted page source and a failure-injecting store,
//! allowing full harvest runs without network access or a real database
//! failure.
//!
//! # Example
//!
//! ```rust,ignore
//! use harvester_core::testing::{FaultyStore, MockPageSource};
//!
//! let source = MockPageSource::new();
//! source.set_listing(10, 25, 25).await;
//!
//! let store = FaultyStore::fail_on_item_insert(3);
//!
//! // Build a Harvester from the two...
//! ```

mod faulty_store;
mod mock_page_source;

pub use faulty_store::FaultyStore;
pub use mock_page_source::MockPageSource;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::record::{EnrichedRecord, RawRecord};

    /// Listing page markup with `count` items titled `"{prefix}-{i}"`.
    ///
    /// Item `i` scores `5.0 + (i % 5)`, was released in `1980 + (i % 40)` and
    /// is directed by `"Director{i}"`.
    pub fn listing_page(prefix: &str, count: usize) -> String {
        let items: String = (0..count)
            .map(|i| {
                format!(
                    r##"<li><div class="item"><div class="info">
<div class="hd"><a href="#"><span class="title">{prefix}-{i}</span><span class="title">&nbsp;/&nbsp;Alt {i}</span></a></div>
<div class="bd"><p class="">
导演: Director{i}&nbsp;&nbsp;&nbsp;主演: Someone<br>
{year}&nbsp;/&nbsp;美国&nbsp;/&nbsp;剧情
</p>
<div class="star"><span class="rating_num">{score:.1}</span></div>
</div></div></div></li>
"##,
                    prefix = prefix,
                    i = i,
                    year = 1980 + (i % 40),
                    score = 5.0 + (i % 5) as f64,
                )
            })
            .collect();

        format!(
            "<html><body><ol class=\"grid_view\">\n{}</ol></body></html>",
            items
        )
    }

    /// Create a raw record with a director and year line.
    pub fn raw_record(title: &str, score_text: &str, year: &str) -> RawRecord {
        RawRecord::new(
            title,
            score_text,
            format!("导演: Director\n{} / 美国 / 剧情", year),
        )
    }

    /// Create an enriched record whose weighted score equals its score.
    pub fn enriched(title: &str, score: f64, year: &str) -> EnrichedRecord {
        EnrichedRecord {
            title: title.to_string(),
            score,
            year: year.to_string(),
            director: "Director".to_string(),
            weighted_score: score,
        }
    }

}
