//! Common test utilities for API testing with mocks.
//!
//! This module provides a test fixture that creates an in-process server
//! with a scripted page source injected, enabling full harvest runs
//! without network access.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use harvester_core::{
    config::{DatabaseConfig, HarvestConfig, ServerConfig, SourceConfig},
    testing::{FaultyStore, MockPageSource},
    Config, Harvester, ItemStore, ListingExtractor, SqliteItemStore,
};

/// Re-export fixtures for test convenience
pub use harvester_core::testing::fixtures;

/// Test fixture for API testing with mock dependencies.
///
/// Provides an in-process server with a controllable page source. The
/// source serves `TestConfig::pages` listing pages of 25 records each.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_harvest() {
///     let fixture = TestFixture::new().await;
///
///     let response = fixture.post("/api/v1/harvest", json!({ "target_count": 50 })).await;
///
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock page source - script pages, failures and delays
    pub source: Arc<MockPageSource>,
    /// The store behind the router
    pub store: Arc<dyn ItemStore>,
    /// Temporary directory for the test database
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// Configuration for test fixture.
#[derive(Debug, Clone)]
pub struct TestConfig {
    /// Listing pages served by the mock source
    pub pages: u32,
    /// Fail the N-th item insert
    pub fail_item_insert: Option<usize>,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            pages: 10,
            fail_item_insert: None,
        }
    }
}

impl TestFixture {
    /// Create a new test fixture with default mocks.
    pub async fn new() -> Self {
        Self::with_config(TestConfig::default()).await
    }

    /// Create a test fixture with custom configuration.
    pub async fn with_config(test_config: TestConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");

        // Create config
        let config = Config {
            server: ServerConfig {
                host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                port: 0, // Not used for in-process testing
            },
            database: DatabaseConfig {
                path: db_path.clone(),
            },
            source: SourceConfig::default(),
            harvest: HarvestConfig {
                transform_concurrency: Some(2),
                ..Default::default()
            },
        };

        // Create mock source
        let source = Arc::new(MockPageSource::new());
        source
            .set_listing(test_config.pages, config.source.page_size, 25)
            .await;

        // Create store
        let store: Arc<dyn ItemStore> = match test_config.fail_item_insert {
            Some(n) => Arc::new(FaultyStore::fail_on_item_insert(n)),
            None => Arc::new(SqliteItemStore::new(&db_path).expect("Failed to create store")),
        };

        let harvester = Harvester::new(
            Arc::clone(&source) as Arc<dyn harvester_core::PageSource>,
            Arc::new(ListingExtractor::new()),
            Arc::clone(&store),
        );

        // Create app state with mocks
        let state = Arc::new(harvester_server::state::AppState::new(config, harvester));

        // Create router
        let router = harvester_server::api::create_router(state);

        Self {
            router,
            source,
            store,
            temp_dir,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request("DELETE", path, None).await
    }

    /// Send a GET request and return the raw body text.
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        (status, String::from_utf8_lossy(&body_bytes).to_string())
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}
