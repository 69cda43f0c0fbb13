//! HTTP listing backend.

use async_trait::async_trait;
use reqwest::{Client, Request};
use std::time::Duration;
use tracing::debug;

use crate::config::SourceConfig;

use super::{FetchError, PageRequest, PageSource};

/// Fetches listing pages over HTTP with a bounded per-request timeout.
pub struct HttpPageSource {
    client: Client,
    config: SourceConfig,
}

impl HttpPageSource {
    /// Create a new HttpPageSource with the given configuration.
    pub fn new(config: SourceConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self { client, config })
    }

    /// Build the request for one page: `{base_url}?start={offset}&filter=`.
    fn build_request(&self, page: PageRequest) -> Result<Request, reqwest::Error> {
        self.client
            .get(&self.config.base_url)
            .query(&[("start", page.offset.to_string()), ("filter", String::new())])
            .build()
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch(&self, page: PageRequest) -> Result<String, FetchError> {
        let request = self
            .build_request(page)
            .map_err(|e| FetchError::ConnectionFailed {
                page: page.index,
                message: e.to_string(),
            })?;

        debug!(page = page.index, url = %request.url(), "Fetching page");

        let response = self.client.execute(request).await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout { page: page.index }
            } else {
                FetchError::ConnectionFailed {
                    page: page.index,
                    message: e.to_string(),
                }
            }
        })?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                page: page.index,
                status: response.status().as_u16(),
            });
        }

        response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout { page: page.index }
            } else {
                FetchError::Body {
                    page: page.index,
                    message: e.to_string(),
                }
            }
        })
    }
}
