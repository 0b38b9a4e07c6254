//! DuckDuckGo Instant Answer lookups.

use scoutline_core::error::ToolError;
use serde_json::{Map, Value};

const ENDPOINT: &str = "https://api.duckduckgo.com/";

/// Fields passed back to the model.
const KEPT_FIELDS: [&str; 8] = [
    "Heading",
    "AbstractText",
    "AbstractSource",
    "AbstractURL",
    "Answer",
    "AnswerType",
    "Definition",
    "DefinitionURL",
];

pub(crate) async fn lookup(client: &reqwest::Client, query: &str) -> Result<Value, ToolError> {
    tracing::debug!(query, "Instant answer lookup");

    let response = client
        .get(ENDPOINT)
        .query(&[
            ("q", query),
            ("format", "json"),
            ("no_html", "1"),
            ("skip_disambig", "1"),
        ])
        .send()
        .await
        .map_err(crate::request_error)?;

    if !response.status().is_success() {
        return Err(ToolError::ExecutionFailed(format!(
            "Instant answer API error: {}",
            response.status()
        )));
    }

    let raw: Value = response.json().await.map_err(|e| {
        ToolError::ExecutionFailed(format!("Failed to parse instant answer: {e}"))
    })?;

    Ok(condense(&raw))
}

/// Keep the non-empty answer fields plus up to five related topics.
pub(crate) fn condense(raw: &Value) -> Value {
    let mut out = Map::new();

    for key in KEPT_FIELDS {
        if let Some(v) = raw.get(key).filter(|v| v.as_str().is_some_and(|s| !s.is_empty())) {
            out.insert(key.to_string(), v.clone());
        }
    }

    let related: Vec<Value> = raw
        .get("RelatedTopics")
        .and_then(Value::as_array)
        .map(|topics| {
            topics
                .iter()
                .filter_map(|t| {
                    let text = t.get("Text")?.as_str()?;
                    let url = t.get("FirstURL").and_then(Value::as_str).unwrap_or_default();
                    Some(serde_json::json!({ "text": text, "url": url }))
                })
                .take(5)
                .collect()
        })
        .unwrap_or_default();

    if !related.is_empty() {
        out.insert("RelatedTopics".into(), Value::Array(related));
    }

    Value::Object(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn condense_drops_empty_and_presentation_fields() {
        let raw = json!({
            "Heading": "Rust (programming language)",
            "AbstractText": "Rust is a general-purpose programming language.",
            "Answer": "",
            "Image": "/i/rust.png",
            "RelatedTopics": [
                {"Text": "Cargo - package manager", "FirstURL": "https://duckduckgo.com/Cargo"},
                {"Name": "Category", "Topics": []}
            ]
        });
        let out = condense(&raw);
        assert_eq!(out["Heading"], "Rust (programming language)");
        assert!(out.get("Answer").is_none());
        assert!(out.get("Image").is_none());
        assert_eq!(out["RelatedTopics"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn condense_of_empty_payload_is_empty_object() {
        assert_eq!(condense(&json!({})), json!({}));
    }
}
