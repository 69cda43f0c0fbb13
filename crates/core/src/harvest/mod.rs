//! The bounded-concurrency harvest pipeline.
//!
//! [`Harvester::run`] fetches listing pages concurrently until the target
//! count is reached, enriches the capped set on a CPU pool, ranks it by
//! weighted score and persists it in a single unit of work.

mod collector;
mod rank;
mod runner;
mod transform;
mod types;

pub use collector::{CollectSummary, Collector, CollectorState, MergeOutcome};
pub use rank::rank;
pub use runner::Harvester;
pub use transform::{enrich, weighted_score, TransformPool};
pub use types::{
    available_compute_units, offsets_fit, plan_pages, HarvestError, HarvestParams,
    HarvestReport, MAX_CONCURRENCY,
};
