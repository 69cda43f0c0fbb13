//! Types for harvest runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::Config;
use crate::record::EnrichedRecord;
use crate::source::PageRequest;

/// Upper bound on either worker pool width.
pub const MAX_CONCURRENCY: usize = 1024;

/// Parameters of a single harvest run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestParams {
    /// How many raw records to keep after the fetch phase.
    pub target_count: usize,
    /// Items per page, fixed by the remote listing.
    pub page_size: u32,
    /// Hard ceiling on page requests.
    pub max_total_pages: u32,
    /// Concurrent page fetches.
    pub fetch_concurrency: usize,
    /// Transform pool width.
    pub transform_concurrency: usize,
}

impl HarvestParams {
    /// Run parameters from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            target_count: config.harvest.target_count,
            page_size: config.source.page_size,
            max_total_pages: config.source.max_total_pages,
            fetch_concurrency: config.harvest.fetch_concurrency,
            transform_concurrency: config
                .harvest
                .transform_concurrency
                .unwrap_or_else(available_compute_units),
        }
    }

    pub fn validate(&self) -> Result<(), HarvestError> {
        if self.page_size == 0 {
            return Err(HarvestError::InvalidParams(
                "page_size must be greater than 0".to_string(),
            ));
        }
        if self.max_total_pages == 0 {
            return Err(HarvestError::InvalidParams(
                "max_total_pages must be greater than 0".to_string(),
            ));
        }
        if !offsets_fit(self.page_size, self.max_total_pages) {
            return Err(HarvestError::InvalidParams(format!(
                "page_size {} over {} pages overflows the page offset",
                self.page_size, self.max_total_pages
            )));
        }
        if self.fetch_concurrency == 0 || self.fetch_concurrency > MAX_CONCURRENCY {
            return Err(HarvestError::InvalidParams(format!(
                "fetch_concurrency must be between 1 and {}",
                MAX_CONCURRENCY
            )));
        }
        if self.transform_concurrency == 0 || self.transform_concurrency > MAX_CONCURRENCY {
            return Err(HarvestError::InvalidParams(format!(
                "transform_concurrency must be between 1 and {}",
                MAX_CONCURRENCY
            )));
        }
        Ok(())
    }

    /// Pages to request for this run.
    pub fn page_plan(&self) -> Vec<PageRequest> {
        plan_pages(self.target_count, self.page_size, self.max_total_pages)
    }
}

/// Number of compute units, falling back to 1 when unknown.
pub fn available_compute_units() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Whether every page offset below `max_total_pages` fits the paging parameter.
pub fn offsets_fit(page_size: u32, max_total_pages: u32) -> bool {
    max_total_pages
        .saturating_sub(1)
        .checked_mul(page_size)
        .is_some()
}

/// `min(ceil(target_count / page_size), max_total_pages)` pages, starting at 0.
///
/// Pages whose offset would overflow are left out.
pub fn plan_pages(target_count: usize, page_size: u32, max_total_pages: u32) -> Vec<PageRequest> {
    if page_size == 0 {
        return Vec::new();
    }
    let needed = target_count.div_ceil(page_size as usize);
    let pages = needed.min(max_total_pages as usize) as u32;
    (0..pages)
        .map_while(|index| {
            index
                .checked_mul(page_size)
                .map(|_| PageRequest::new(index, page_size))
        })
        .collect()
}

/// Outcome of a harvest run.
///
/// A persistence failure does not discard the ranked records: `inserted` is 0
/// and `persist_error` names the cause.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    /// Enriched records ranked by weighted score, descending.
    pub records: Vec<EnrichedRecord>,
    /// Raw records retained after the cap.
    pub collected: usize,
    pub pages_requested: usize,
    pub pages_failed: usize,
    /// Pages not fetched because the cap was already reached.
    pub pages_skipped: usize,
    /// Records committed to storage.
    pub inserted: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persist_error: Option<String>,
    pub duration_ms: u64,
}

impl HarvestReport {
    pub fn persisted(&self) -> bool {
        self.persist_error.is_none()
    }

    /// The first `count` ranked records.
    pub fn top(&self, count: usize) -> &[EnrichedRecord] {
        &self.records[..count.min(self.records.len())]
    }
}

/// Errors that abort a harvest run.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Invalid harvest parameters: {0}")]
    InvalidParams(String),

    #[error("Failed to build transform pool: {0}")]
    TransformPool(String),

    #[error("Harvest worker failed: {0}")]
    Worker(String),
}
