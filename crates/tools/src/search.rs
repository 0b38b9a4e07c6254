//! Web search against Brave Search or a SearXNG instance.

use scoutline_core::error::ToolError;
use scoutline_core::tool::SearchResult;
use serde::Deserialize;
use tracing::{debug, warn};

const BRAVE_ENDPOINT: &str = "https://api.search.brave.com/res/v1/web/search";

pub(crate) async fn brave(
    client: &reqwest::Client,
    api_key: Option<&str>,
    query: &str,
    max_results: usize,
) -> Result<Vec<SearchResult>, ToolError> {
    let api_key = api_key.ok_or_else(|| {
        ToolError::ExecutionFailed("Brave Search needs an API key (BRAVE_API_KEY)".into())
    })?;

    debug!(query, "Brave search");

    let response = client
        .get(BRAVE_ENDPOINT)
        .header("X-Subscription-Token", api_key)
        .header("Accept", "application/json")
        .query(&[
            ("q", query),
            ("count", &max_results.to_string()),
            ("text_decorations", "false"),
        ])
        .send()
        .await
        .map_err(crate::request_error)?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        warn!(%status, "Brave Search API error");
        return Err(ToolError::ExecutionFailed(format!(
            "Brave Search API error: {status} - {body}"
        )));
    }

    let parsed: BraveSearchResponse = response.json().await.map_err(|e| {
        ToolError::ExecutionFailed(format!("Failed to parse Brave Search response: {e}"))
    })?;

    Ok(parsed.into_results(max_results))
}

pub(crate) async fn searxng(
    client: &reqwest::Client,
    base_url: &str,
    query: &str,
    max_results: usize,
) -> Result<Vec<SearchResult>, ToolError> {
    let url = format!("{}/search", base_url.trim_end_matches('/'));
    debug!(query, %url, "SearXNG search");

    let response = client
        .get(&url)
        .header("Accept", "application/json")
        .query(&[("q", query), ("format", "json")])
        .send()
        .await
        .map_err(crate::request_error)?;

    if !response.status().is_success() {
        let status = response.status();
        warn!(%status, "SearXNG error");
        return Err(ToolError::ExecutionFailed(format!("SearXNG error: {status}")));
    }

    let parsed: SearxngResponse = response.json().await.map_err(|e| {
        ToolError::ExecutionFailed(format!("Failed to parse SearXNG response: {e}"))
    })?;

    Ok(parsed.into_results(max_results))
}

/// Brave Search API response structures
#[derive(Debug, Deserialize)]
struct BraveSearchResponse {
    web: Option<BraveWebResults>,
}

#[derive(Debug, Deserialize)]
struct BraveWebResults {
    results: Vec<BraveWebResult>,
}

#[derive(Debug, Deserialize)]
struct BraveWebResult {
    title: String,
    url: String,
    description: Option<String>,
}

impl BraveSearchResponse {
    fn into_results(self, max_results: usize) -> Vec<SearchResult> {
        self.web
            .map(|web| {
                web.results
                    .into_iter()
                    .take(max_results)
                    .map(|r| SearchResult {
                        title: r.title,
                        url: r.url,
                        snippet: r.description.unwrap_or_default(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct SearxngResponse {
    #[serde(default)]
    results: Vec<SearxngResult>,
}

#[derive(Debug, Deserialize)]
struct SearxngResult {
    #[serde(default)]
    title: String,
    url: String,
    #[serde(default)]
    content: String,
}

impl SearxngResponse {
    fn into_results(self, max_results: usize) -> Vec<SearchResult> {
        self.results
            .into_iter()
            .take(max_results)
            .map(|r| SearchResult {
                title: r.title,
                url: r.url,
                snippet: r.content,
            })
            .collect()
    }
}
