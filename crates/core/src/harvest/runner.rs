//! Harvest run orchestration.
//!
//! A run goes through four phases:
//! - Collect: concurrent fetch + extract, capped at the target count
//! - Transform: enrichment on a dedicated CPU pool
//! - Rank: stable sort by weighted score
//! - Persist: one all-or-nothing unit of work

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::collector::Collector;
use super::rank::rank;
use super::transform::TransformPool;
use super::types::{HarvestError, HarvestParams, HarvestReport};
use crate::extract::RecordExtractor;
use crate::metrics::{PERSIST_FAILURES, RECORDS_COLLECTED, RECORDS_PERSISTED, RUNS, RUN_DURATION};
use crate::record::{EnrichedRecord, RawRecord};
use crate::source::PageSource;
use crate::store::{persist, ItemStore, PersistError};

/// Ranked records handed back from the blocking persist task.
type Persisted = (Vec<EnrichedRecord>, Result<usize, PersistError>);

/// Runs the harvest pipeline against one source and one store.
///
/// Holds no per-run state; concurrent runs are independent.
pub struct Harvester {
    source: Arc<dyn PageSource>,
    extractor: Arc<dyn RecordExtractor>,
    store: Arc<dyn ItemStore>,
}

impl Harvester {
    pub fn new(
        source: Arc<dyn PageSource>,
        extractor: Arc<dyn RecordExtractor>,
        store: Arc<dyn ItemStore>,
    ) -> Self {
        Self {
            source,
            extractor,
            store,
        }
    }

    pub fn store(&self) -> &Arc<dyn ItemStore> {
        &self.store
    }

    /// Execute one run.
    ///
    /// Fails only on invalid parameters or a broken worker. A persistence
    /// failure is reported in [`HarvestReport::persist_error`] with the
    /// ranked records still attached.
    pub async fn run(&self, params: &HarvestParams) -> Result<HarvestReport, HarvestError> {
        let result = self.execute(params).await;
        match &result {
            Ok(report) if report.persisted() => RUNS.with_label_values(&["persisted"]).inc(),
            Ok(_) => RUNS.with_label_values(&["persist_failed"]).inc(),
            Err(_) => RUNS.with_label_values(&["error"]).inc(),
        }
        result
    }

    async fn execute(&self, params: &HarvestParams) -> Result<HarvestReport, HarvestError> {
        params.validate()?;

        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let start = Instant::now();
        let pages = params.page_plan();

        info!(
            run_id = %run_id,
            target = params.target_count,
            pages = pages.len(),
            fetch_concurrency = params.fetch_concurrency,
            transform_concurrency = params.transform_concurrency,
            "Starting harvest"
        );

        let phase = Instant::now();
        let collector = Collector::new(
            Arc::clone(&self.source),
            Arc::clone(&self.extractor),
            params.fetch_concurrency,
        );
        let summary = collector.collect(&pages, params.target_count).await;
        RUN_DURATION
            .with_label_values(&["collect"])
            .observe(phase.elapsed().as_secs_f64());
        RECORDS_COLLECTED.inc_by(summary.records.len() as u64);

        info!(
            run_id = %run_id,
            records = summary.records.len(),
            pages_failed = summary.pages_failed,
            pages_skipped = summary.pages_skipped,
            "Collection complete"
        );

        let collected = summary.records.len();
        let phase = Instant::now();
        let enriched = transform(summary.records, params.transform_concurrency).await?;
        RUN_DURATION
            .with_label_values(&["transform"])
            .observe(phase.elapsed().as_secs_f64());
        debug!(run_id = %run_id, records = enriched.len(), "Transform complete");

        let ranked = rank(&enriched);

        let phase = Instant::now();
        let (records, persisted) = self.persist(ranked).await?;
        RUN_DURATION
            .with_label_values(&["persist"])
            .observe(phase.elapsed().as_secs_f64());

        let (inserted, persist_error) = match persisted {
            Ok(inserted) => {
                RECORDS_PERSISTED.inc_by(inserted as u64);
                (inserted, None)
            }
            Err(e) => {
                PERSIST_FAILURES.inc();
                warn!(run_id = %run_id, error = %e, "Persistence failed, batch rolled back");
                (0, Some(e.to_string()))
            }
        };

        let report = HarvestReport {
            run_id,
            started_at,
            records,
            collected,
            pages_requested: summary.pages_requested,
            pages_failed: summary.pages_failed,
            pages_skipped: summary.pages_skipped,
            inserted,
            persist_error,
            duration_ms: start.elapsed().as_millis() as u64,
        };

        info!(
            run_id = %run_id,
            records = report.records.len(),
            inserted = report.inserted,
            duration_ms = report.duration_ms,
            "Harvest complete"
        );

        Ok(report)
    }

    /// Persist on a blocking thread, handing the records back.
    async fn persist(&self, records: Vec<EnrichedRecord>) -> Result<Persisted, HarvestError> {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || {
            let result = persist(store.as_ref(), &records);
            (records, result)
        })
        .await
        .map_err(|e| HarvestError::Worker(e.to_string()))
    }
}

/// Enrich on a fresh pool of `width` threads, off the async runtime.
async fn transform(
    records: Vec<RawRecord>,
    width: usize,
) -> Result<Vec<EnrichedRecord>, HarvestError> {
    tokio::task::spawn_blocking(move || {
        let pool = TransformPool::new(width)?;
        Ok(pool.run(&records))
    })
    .await
    .map_err(|e| HarvestError::Worker(e.to_string()))?
}
