//! Page fetching for `read_url`: download, then reduce HTML to plain text.

use scoutline_core::error::ToolError;
use tracing::debug;

/// Maximum response size (5 MB).
const MAX_CONTENT_SIZE: usize = 5 * 1024 * 1024;

/// Wrap width for HTML rendering.
const TEXT_WIDTH: usize = 100;

pub(crate) async fn fetch_text(client: &reqwest::Client, url: &str) -> Result<String, ToolError> {
    debug!(url, "Fetching page");

    let response = client
        .get(url)
        .send()
        .await
        .map_err(crate::request_error)?;

    if !response.status().is_success() {
        return Err(ToolError::ExecutionFailed(format!(
            "HTTP error: {}",
            response.status()
        )));
    }

    if let Some(len) = response.content_length()
        && len > MAX_CONTENT_SIZE as u64
    {
        return Err(ToolError::ExecutionFailed(format!(
            "Content too large: {len} bytes (max {MAX_CONTENT_SIZE} bytes)"
        )));
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("text/html")
        .to_string();

    let bytes = response
        .bytes()
        .await
        .map_err(|e| ToolError::Network(e.to_string()))?;

    if bytes.len() > MAX_CONTENT_SIZE {
        return Err(ToolError::ExecutionFailed(format!(
            "Content too large: {} bytes (max {MAX_CONTENT_SIZE} bytes)",
            bytes.len()
        )));
    }

    let body = String::from_utf8_lossy(&bytes);
    Ok(to_text(&body, &content_type))
}

/// Render HTML bodies as text; pass everything else through.
pub(crate) fn to_text(body: &str, content_type: &str) -> String {
    if content_type.contains("text/html") || content_type.contains("application/xhtml") {
        html2text::from_read(body.as_bytes(), TEXT_WIDTH).unwrap_or_else(|_| body.to_string())
    } else {
        body.to_string()
    }
}
