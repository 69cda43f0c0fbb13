//! Types for fetching listing pages.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One page of the remote listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageRequest {
    /// Zero-based page number.
    pub index: u32,
    /// Paging parameter passed to the remote source (`index * page_size`).
    pub offset: u32,
}

impl PageRequest {
    pub fn new(index: u32, page_size: u32) -> Self {
        Self {
            index,
            offset: index.saturating_mul(page_size),
        }
    }
}

/// Errors that can occur while fetching a page.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Page {page}: request timed out")]
    Timeout { page: u32 },

    #[error("Page {page}: connection failed: {message}")]
    ConnectionFailed { page: u32, message: String },

    #[error("Page {page}: HTTP {status}")]
    Status { page: u32, status: u16 },

    #[error("Page {page}: failed to read body: {message}")]
    Body { page: u32, message: String },
}

impl FetchError {
    /// Index of the page that failed.
    pub fn page(&self) -> u32 {
        match self {
            FetchError::Timeout { page }
            | FetchError::ConnectionFailed { page, .. }
            | FetchError::Status { page, .. }
            | FetchError::Body { page, .. } => *page,
        }
    }
}

/// Trait for listing page backends.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Source name for logging.
    fn name(&self) -> &str;

    /// Fetch the raw content of one page.
    async fn fetch(&self, page: PageRequest) -> Result<String, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_offset() {
        assert_eq!(PageRequest::new(0, 25).offset, 0);
        assert_eq!(PageRequest::new(3, 25).offset, 75);
        assert_eq!(PageRequest::new(3, 25).index, 3);
    }

    #[test]
    fn test_fetch_error_carries_page() {
        let err = FetchError::Status {
            page: 4,
            status: 503,
        };
        assert_eq!(err.page(), 4);
        assert_eq!(err.to_string(), "Page 4: HTTP 503");

        let err = FetchError::Timeout { page: 7 };
        assert_eq!(err.page(), 7);
    }
}
