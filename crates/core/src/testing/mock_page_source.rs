//! Mock page source for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use super::fixtures;
use crate::source::{FetchError, PageRequest, PageSource};

/// Scripted reply for one offset.
#[derive(Debug, Clone)]
enum MockReply {
    Content(String),
    ConnectionFailed(String),
    Status(u16),
    Timeout,
}

/// Mock implementation of the PageSource trait.
///
/// Provides controllable behavior for testing:
/// - Script content or a failure per page offset
/// - Delay individual pages to force completion orders
/// - Track requested offsets and peak concurrency
///
/// Offsets without a script fail with HTTP 404.
///
/// # Example
///
/// ```rust,ignore
/// use harvester_core::testing::MockPageSource;
///
/// let source = MockPageSource::new();
/// source.set_listing(4, 25, 25).await;
/// source.set_failure(50, "connection reset").await;
///
/// // Run a harvest...
///
/// assert_eq!(source.fetch_count().await, 4);
/// assert!(source.max_in_flight() <= 10);
/// ```
#[derive(Debug, Default)]
pub struct MockPageSource {
    /// Scripted replies by offset.
    replies: Arc<RwLock<HashMap<u32, MockReply>>>,
    /// Simulated latency by offset.
    delays: Arc<RwLock<HashMap<u32, Duration>>>,
    /// Offsets in the order their fetches started.
    requested: Arc<RwLock<Vec<u32>>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl MockPageSource {
    /// Create a new mock page source with nothing scripted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `content` for `offset`.
    pub async fn set_page(&self, offset: u32, content: impl Into<String>) {
        self.replies
            .write()
            .await
            .insert(offset, MockReply::Content(content.into()));
    }

    /// Serve `pages` listing pages of `records_per_page` items each, at
    /// offsets `0, page_size, 2 * page_size, ...`.
    pub async fn set_listing(&self, pages: u32, page_size: u32, records_per_page: usize) {
        let mut replies = self.replies.write().await;
        for index in 0..pages {
            let offset = index * page_size;
            let content = fixtures::listing_page(&format!("p{}", index), records_per_page);
            replies.insert(offset, MockReply::Content(content));
        }
    }

    /// Fail `offset` with a connection error.
    pub async fn set_failure(&self, offset: u32, message: impl Into<String>) {
        self.replies
            .write()
            .await
            .insert(offset, MockReply::ConnectionFailed(message.into()));
    }

    /// Fail `offset` with a non-success HTTP status.
    pub async fn set_status(&self, offset: u32, status: u16) {
        self.replies
            .write()
            .await
            .insert(offset, MockReply::Status(status));
    }

    /// Fail `offset` with a timeout.
    pub async fn set_timeout(&self, offset: u32) {
        self.replies.write().await.insert(offset, MockReply::Timeout);
    }

    /// Delay the reply for `offset`.
    pub async fn set_delay(&self, offset: u32, delay: Duration) {
        self.delays.write().await.insert(offset, delay);
    }

    /// Offsets requested so far, in start order.
    pub async fn requested_offsets(&self) -> Vec<u32> {
        self.requested.read().await.clone()
    }

    /// Get the number of fetches started.
    pub async fn fetch_count(&self) -> usize {
        self.requested.read().await.len()
    }

    /// Clear recorded requests and the concurrency peak.
    pub async fn clear_requests(&self) {
        self.requested.write().await.clear();
        self.max_in_flight.store(0, Ordering::SeqCst);
    }

    /// Highest number of fetches observed running at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

/// Decrements the in-flight counter when a fetch ends, however it ends.
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl PageSource for MockPageSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch(&self, page: PageRequest) -> Result<String, FetchError> {
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = InFlight(&self.in_flight);
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);

        self.requested.write().await.push(page.offset);

        let delay = self.delays.read().await.get(&page.offset).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let reply = self.replies.read().await.get(&page.offset).cloned();
        match reply {
            Some(MockReply::Content(content)) => Ok(content),
            Some(MockReply::ConnectionFailed(message)) => Err(FetchError::ConnectionFailed {
                page: page.index,
                message,
            }),
            Some(MockReply::Status(status)) => Err(FetchError::Status {
                page: page.index,
                status,
            }),
            Some(MockReply::Timeout) => Err(FetchError::Timeout { page: page.index }),
            None => Err(FetchError::Status {
                page: page.index,
                status: 404,
            }),
        }
    }
}
