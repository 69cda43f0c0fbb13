//! Bounded concurrent collection of raw records.
//!
//! Pages are fetched by a fixed-width pool of workers. Each worker merges its
//! records into a shared [`CollectorState`]; the append, the cap check and the
//! truncation happen under one lock, so the collection never ends up larger
//! than the target.

use std::sync::{Arc, Mutex, MutexGuard};

use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use super::types::MAX_CONCURRENCY;
use crate::extract::RecordExtractor;
use crate::metrics::PAGE_FETCHES;
use crate::record::RawRecord;
use crate::source::{PageRequest, PageSource};

/// Result of one merge into the shared collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Collection size after the merge.
    pub count: usize,
    /// Records from this merge that were kept.
    pub accepted: usize,
    /// Whether the collection is at the target.
    pub cap_reached: bool,
}

/// Per-run shared collection with an early-stop cap.
///
/// The lock is private; [`CollectorState::try_merge`] is the only way to add
/// records.
#[derive(Debug)]
pub struct CollectorState {
    target: usize,
    collected: Mutex<Vec<RawRecord>>,
}

impl CollectorState {
    pub fn new(target: usize) -> Self {
        Self {
            target,
            collected: Mutex::new(Vec::new()),
        }
    }

    pub fn target(&self) -> usize {
        self.target
    }

    fn lock(&self) -> MutexGuard<'_, Vec<RawRecord>> {
        // A panicking merger cannot leave the Vec half-written, so a poisoned
        // lock still guards a valid collection.
        self.collected
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Append `records`, then truncate to the target if it was reached.
    ///
    /// Once the cap is reached later merges are discarded.
    pub fn try_merge(&self, records: Vec<RawRecord>) -> MergeOutcome {
        let mut collected = self.lock();
        let before = collected.len();

        if before >= self.target {
            return MergeOutcome {
                count: before,
                accepted: 0,
                cap_reached: true,
            };
        }

        collected.extend(records);
        if collected.len() >= self.target {
            collected.truncate(self.target);
        }

        MergeOutcome {
            count: collected.len(),
            accepted: collected.len() - before,
            cap_reached: collected.len() >= self.target,
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_capped(&self) -> bool {
        self.len() >= self.target
    }

    /// Take the collected records, leaving the state empty.
    pub fn take(&self) -> Vec<RawRecord> {
        std::mem::take(&mut *self.lock())
    }
}

/// What happened to one dispatched page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PageOutcome {
    Fetched,
    Failed,
    Skipped,
}

/// Summary of the fetch phase.
#[derive(Debug, Clone, Default)]
pub struct CollectSummary {
    /// Records retained after the cap, in merge order.
    pub records: Vec<RawRecord>,
    pub pages_requested: usize,
    pub pages_failed: usize,
    pub pages_skipped: usize,
}

/// Drives concurrent fetch + extract over a page plan.
pub struct Collector {
    source: Arc<dyn PageSource>,
    extractor: Arc<dyn RecordExtractor>,
    concurrency: usize,
}

impl Collector {
    pub fn new(
        source: Arc<dyn PageSource>,
        extractor: Arc<dyn RecordExtractor>,
        concurrency: usize,
    ) -> Self {
        Self {
            source,
            extractor,
            concurrency: concurrency.clamp(1, MAX_CONCURRENCY),
        }
    }

    /// Fetch every page in `pages`, keeping at most `target` records.
    ///
    /// Failed pages contribute nothing. Workers still waiting for a slot when
    /// the cap is reached skip their fetch; fetches already in flight finish
    /// and their records are discarded.
    pub async fn collect(&self, pages: &[PageRequest], target: usize) -> CollectSummary {
        let state = Arc::new(CollectorState::new(target));
        let slots = Arc::new(Semaphore::new(self.concurrency));

        debug!(
            source = self.source.name(),
            pages = pages.len(),
            target = target,
            concurrency = self.concurrency,
            "Starting collection"
        );

        let mut workers = Vec::with_capacity(pages.len());
        for &page in pages {
            let state = Arc::clone(&state);
            let slots = Arc::clone(&slots);
            let source = Arc::clone(&self.source);
            let extractor = Arc::clone(&self.extractor);

            workers.push(tokio::spawn(async move {
                let Ok(_slot) = slots.acquire_owned().await else {
                    return PageOutcome::Skipped;
                };
                if state.is_capped() {
                    return PageOutcome::Skipped;
                }

                match source.fetch(page).await {
                    Ok(content) => {
                        let records = extractor.extract(&content);
                        let yielded = records.len();
                        let merge = state.try_merge(records);
                        debug!(
                            page = page.index,
                            offset = page.offset,
                            records = yielded,
                            accepted = merge.accepted,
                            collected = merge.count,
                            "Page merged"
                        );
                        if merge.cap_reached {
                            debug!(page = page.index, "Target count reached");
                        }
                        PageOutcome::Fetched
                    }
                    Err(e) => {
                        warn!(page = page.index, offset = page.offset, error = %e, "Page fetch failed");
                        PageOutcome::Failed
                    }
                }
            }));
        }

        let mut summary = CollectSummary {
            pages_requested: pages.len(),
            ..CollectSummary::default()
        };

        for joined in join_all(workers).await {
            let outcome = joined.unwrap_or_else(|e| {
                warn!(error = %e, "Page worker did not complete");
                PageOutcome::Failed
            });
            match outcome {
                PageOutcome::Fetched => PAGE_FETCHES.with_label_values(&["ok"]).inc(),
                PageOutcome::Failed => {
                    summary.pages_failed += 1;
                    PAGE_FETCHES.with_label_values(&["failed"]).inc();
                }
                PageOutcome::Skipped => {
                    summary.pages_skipped += 1;
                    PAGE_FETCHES.with_label_values(&["skipped"]).inc();
                }
            }
        }

        summary.records = state.take();
        summary
    }
}
