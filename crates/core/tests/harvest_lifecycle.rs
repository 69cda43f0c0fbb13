//! Harvest lifecycle integration tests.
//!
//! These tests drive the pipeline with a scripted page source:
//! - Cap invariant under varied completion orders
//! - Fetch concurrency bound and early stop
//! - Failed pages and failed persistence
//! - End-to-end runs against a file-backed store

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use harvester_core::{
    harvest::{plan_pages, Collector, HarvestParams},
    store::StoreStats,
    testing::{FaultyStore, MockPageSource},
    Harvester, ItemStore, ListingExtractor, SqliteItemStore,
};

/// Ten pages of 25 records each, delayed by a seed-dependent permutation of
/// 0..10 ms.
async fn shuffled_source(seed: u64) -> Arc<MockPageSource> {
    let source = Arc::new(MockPageSource::new());
    source.set_listing(10, 25, 25).await;

    let mut delays: Vec<u64> = (0..10).collect();
    let mut state = seed;
    for i in (1..delays.len()).rev() {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        let j = (state >> 33) as usize % (i + 1);
        delays.swap(i, j);
    }
    for (index, delay) in delays.into_iter().enumerate() {
        source
            .set_delay(index as u32 * 25, Duration::from_millis(delay))
            .await;
    }
    source
}

fn collector(source: Arc<MockPageSource>, concurrency: usize) -> Collector {
    Collector::new(source, Arc::new(ListingExtractor::new()), concurrency)
}

fn params(target_count: usize, fetch_concurrency: usize) -> HarvestParams {
    HarvestParams {
        target_count,
        page_size: 25,
        max_total_pages: 10,
        fetch_concurrency,
        transform_concurrency: 4,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_cap_holds_for_any_completion_order() {
    let pages = plan_pages(250, 25, 10);
    assert_eq!(pages.len(), 10);

    for seed in 0..16 {
        let source = shuffled_source(seed).await;
        let summary = collector(source, 10).collect(&pages, 100).await;

        assert_eq!(summary.records.len(), 100, "seed {}", seed);
        assert_eq!(summary.pages_requested, 10);
        assert_eq!(summary.pages_failed, 0);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_cap_above_total_keeps_everything() {
    let pages = plan_pages(250, 25, 10);
    let source = shuffled_source(7).await;

    let summary = collector(source, 10).collect(&pages, 400).await;

    assert_eq!(summary.records.len(), 250);
    assert_eq!(summary.pages_skipped, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_fetch_concurrency_is_bounded() {
    let source = Arc::new(MockPageSource::new());
    source.set_listing(10, 25, 25).await;
    for index in 0..10 {
        source
            .set_delay(index * 25, Duration::from_millis(20))
            .await;
    }

    let pages = plan_pages(250, 25, 10);
    let summary = collector(source.clone(), 3).collect(&pages, 250).await;

    assert_eq!(summary.records.len(), 250);
    assert!(source.max_in_flight() <= 3);
    assert!(source.max_in_flight() >= 1);
    assert_eq!(source.fetch_count().await, 10);
}

#[tokio::test]
async fn test_waiting_workers_skip_once_capped() {
    let source = Arc::new(MockPageSource::new());
    source.set_listing(10, 25, 25).await;

    let pages = plan_pages(250, 25, 10);
    let summary = collector(source.clone(), 1).collect(&pages, 25).await;

    assert_eq!(summary.records.len(), 25);
    assert_eq!(summary.pages_skipped, 9);
    assert_eq!(source.fetch_count().await, 1);
}

#[tokio::test]
async fn test_failed_pages_lower_the_count() {
    let source = Arc::new(MockPageSource::new());
    source.set_listing(4, 25, 25).await;
    source.set_failure(50, "connection reset").await;

    let store = Arc::new(SqliteItemStore::in_memory().unwrap());
    let harvester = Harvester::new(source, Arc::new(ListingExtractor::new()), store.clone());

    let report = harvester.run(&params(100, 10)).await.unwrap();

    assert_eq!(report.pages_requested, 4);
    assert_eq!(report.pages_failed, 1);
    assert_eq!(report.collected, 75);
    assert_eq!(report.inserted, 75);
    assert!(report.records.iter().all(|r| !r.title.starts_with("p2-")));
    assert_eq!(store.stats().unwrap(), StoreStats { items: 75, scores: 75 });
}

#[tokio::test]
async fn test_all_pages_failing_yields_empty_run() {
    let source = Arc::new(MockPageSource::new());
    let store = Arc::new(SqliteItemStore::in_memory().unwrap());
    let harvester = Harvester::new(source, Arc::new(ListingExtractor::new()), store);

    let report = harvester.run(&params(100, 10)).await.unwrap();

    assert_eq!(report.pages_failed, 4);
    assert!(report.records.is_empty());
    assert_eq!(report.inserted, 0);
    assert!(report.persisted());
}

#[tokio::test]
async fn test_persist_failure_rolls_back_whole_batch() {
    let source = Arc::new(MockPageSource::new());
    source.set_listing(4, 25, 25).await;
    let store = Arc::new(FaultyStore::fail_on_item_insert(3));
    let harvester = Harvester::new(source, Arc::new(ListingExtractor::new()), store.clone());

    let report = harvester.run(&params(100, 10)).await.unwrap();

    assert_eq!(report.records.len(), 100);
    assert_eq!(report.inserted, 0);
    assert!(report.persist_error.is_some());
    assert_eq!(store.inner().stats().unwrap(), StoreStats::default());
}

#[tokio::test]
async fn test_run_against_file_store() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("harvest.db");

    let source = Arc::new(MockPageSource::new());
    source.set_listing(10, 25, 25).await;
    let store = Arc::new(SqliteItemStore::new(&db_path).expect("Failed to create store"));
    let harvester = Harvester::new(
        source,
        Arc::new(ListingExtractor::new()),
        Arc::clone(&store) as Arc<dyn ItemStore>,
    );

    let first = harvester.run(&params(100, 10)).await.unwrap();
    let second = harvester.run(&params(30, 10)).await.unwrap();
    assert_ne!(first.run_id, second.run_id);

    let stats = store.stats().unwrap();
    assert_eq!(stats.items, 130);
    assert_eq!(stats.scores, 130);

    let top = store.list_items(5).unwrap();
    assert_eq!(top.len(), 5);
    assert_eq!(top[0].weighted_score, first.records[0].weighted_score);
    assert!(top
        .windows(2)
        .all(|w| w[0].weighted_score >= w[1].weighted_score));
}
