//! Tool transport for Scoutline.
//!
//! [`HttpToolBackend`] implements `scoutline_core::ToolBackend` over HTTP:
//! Brave Search or SearXNG for `web_search`, a plain GET rendered to text
//! for `read_url`, and the DuckDuckGo Instant Answer API for
//! `instant_answer`.

mod fetch;
mod instant_answer;
mod search;

use async_trait::async_trait;
use scoutline_config::SearchConfig;
use scoutline_core::error::ToolError;
use scoutline_core::tool::{SearchEngine, SearchResult, ToolBackend};
use serde_json::Value;
use std::future::Future;
use std::time::Duration;

/// HTTP-backed implementation of every tool.
pub struct HttpToolBackend {
    client: reqwest::Client,
    config: SearchConfig,
}

impl HttpToolBackend {
    pub fn new(config: SearchConfig) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("scoutline/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self { client, config }
    }

    /// Run one tool request under the configured `timeout_secs`.
    async fn with_deadline<T>(
        &self,
        request: impl Future<Output = Result<T, ToolError>>,
    ) -> Result<T, ToolError> {
        let timeout_secs = self.config.timeout_secs;
        tokio::time::timeout(Duration::from_secs(timeout_secs), request)
            .await
            .map_err(|_| ToolError::Timeout { timeout_secs })?
    }
}

#[async_trait]
impl ToolBackend for HttpToolBackend {
    async fn web_search(
        &self,
        query: &str,
        engine: SearchEngine,
        on_result: &(dyn for<'r> Fn(&'r SearchResult) + Send + Sync),
    ) -> Result<Vec<SearchResult>, ToolError> {
        let results = match engine {
            SearchEngine::Brave => {
                self.with_deadline(search::brave(
                    &self.client,
                    self.config.brave_api_key.as_deref(),
                    query,
                    self.config.max_results,
                ))
                .await?
            }
            SearchEngine::Searxng => {
                self.with_deadline(search::searxng(
                    &self.client,
                    &self.config.searxng_url,
                    query,
                    self.config.max_results,
                ))
                .await?
            }
        };

        for result in &results {
            on_result(result);
        }

        Ok(results)
    }

    async fn read_url(&self, url: &str) -> Result<String, ToolError> {
        self.with_deadline(fetch::fetch_text(&self.client, url)).await
    }

    async fn instant_answer(&self, query: &str) -> Result<Value, ToolError> {
        self.with_deadline(instant_answer::lookup(&self.client, query))
            .await
    }
}

fn request_error(e: reqwest::Error) -> ToolError {
    ToolError::Network(e.to_string())
}
