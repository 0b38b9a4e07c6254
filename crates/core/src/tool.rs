//! Tool-call domain types: what the model may ask the orchestrator to do.
//!
//! The model requests a tool by replying with a JSON object
//! `{"tool": "<name>", "arguments": {...}}`. That raw request is a
//! [`ToolCall`]; once its arguments pass the per-tool schema it becomes a
//! typed [`ToolInvocation`], which is what actually gets dispatched to a
//! [`ToolBackend`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ToolError;

/// Default number of characters returned by one `read_url` call.
pub const DEFAULT_READ_LENGTH: usize = 1122;

/// The tools the model can call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    WebSearch,
    ReadUrl,
    InstantAnswer,
}

impl ToolKind {
    pub const ALL: [ToolKind; 3] = [
        ToolKind::WebSearch,
        ToolKind::ReadUrl,
        ToolKind::InstantAnswer,
    ];

    /// The name used on the wire.
    pub fn wire_name(&self) -> &'static str {
        match self {
            ToolKind::WebSearch => "web_search",
            ToolKind::ReadUrl => "read_url",
            ToolKind::InstantAnswer => "instant_answer",
        }
    }

    /// The name shown to people in notices.
    pub fn display_name(&self) -> &'static str {
        match self {
            ToolKind::WebSearch => "Web search",
            ToolKind::ReadUrl => "Read URL",
            ToolKind::InstantAnswer => "Instant answer",
        }
    }
}

impl std::fmt::Display for ToolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl std::str::FromStr for ToolKind {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolKind::ALL
            .into_iter()
            .find(|k| k.wire_name() == s)
            .ok_or_else(|| ToolError::UnknownTool(s.to_string()))
    }
}

/// A raw tool request as emitted by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub tool: ToolKind,
    pub arguments: Map<String, Value>,
}

/// Canonical form of `(tool, arguments)`, comparable by value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ToolCallSignature(String);

impl ToolCallSignature {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ToolCall {
    pub fn new(tool: ToolKind, arguments: Value) -> Self {
        let arguments = match arguments {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self { tool, arguments }
    }

    /// Parse a JSON object of the `{"tool", "arguments"}` shape.
    ///
    /// Fails for unknown tool names and for `arguments` that are not an object.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Canonical signature: object keys sorted at every depth.
    pub fn signature(&self) -> ToolCallSignature {
        let mut out = String::from(self.tool.wire_name());
        out.push(':');
        write_canonical(&Value::Object(self.arguments.clone()), &mut out);
        ToolCallSignature(out)
    }

    /// Check the arguments against the tool's schema.
    pub fn validate(&self) -> Result<ToolInvocation, ToolError> {
        let invalid = |reason: &str| ToolError::InvalidArguments {
            tool: self.tool.wire_name().to_string(),
            reason: reason.to_string(),
        };

        match self.tool {
            ToolKind::WebSearch => {
                let query = non_empty_str(&self.arguments, "query")
                    .ok_or_else(|| invalid("query must be a non-empty string"))?;
                Ok(ToolInvocation::WebSearch { query })
            }
            ToolKind::InstantAnswer => {
                let query = non_empty_str(&self.arguments, "query")
                    .ok_or_else(|| invalid("query must be a non-empty string"))?;
                Ok(ToolInvocation::InstantAnswer { query })
            }
            ToolKind::ReadUrl => {
                let url = self
                    .arguments
                    .get("url")
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .filter(|u| is_http_url(u))
                    .ok_or_else(|| invalid("url must start with http:// or https://"))?;

                let start = match self.arguments.get("start") {
                    None | Some(Value::Null) => 0,
                    Some(v) => v
                        .as_u64()
                        .ok_or_else(|| invalid("start must be an integer >= 0"))?
                        as usize,
                };

                let length = match self.arguments.get("length") {
                    None | Some(Value::Null) => DEFAULT_READ_LENGTH,
                    Some(v) => v
                        .as_u64()
                        .filter(|n| *n > 0)
                        .ok_or_else(|| invalid("length must be an integer > 0"))?
                        as usize,
                };

                Ok(ToolInvocation::ReadUrl {
                    url: url.to_string(),
                    start,
                    length,
                })
            }
        }
    }
}

fn non_empty_str(args: &Map<String, Value>, key: &str) -> Option<String> {
    args.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(&map[key], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

/// A validated tool request, one variant per tool with its typed arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolInvocation {
    WebSearch { query: String },
    ReadUrl {
        url: String,
        start: usize,
        length: usize,
    },
    InstantAnswer { query: String },
}

impl ToolInvocation {
    pub fn kind(&self) -> ToolKind {
        match self {
            ToolInvocation::WebSearch { .. } => ToolKind::WebSearch,
            ToolInvocation::ReadUrl { .. } => ToolKind::ReadUrl,
            ToolInvocation::InstantAnswer { .. } => ToolKind::InstantAnswer,
        }
    }
}

/// One entry of the tool-call audit log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallHistoryEntry {
    pub tool: ToolKind,
    pub args: Map<String, Value>,
    pub timestamp: DateTime<Utc>,
}

/// A single web search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// Which search engine a backend should query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchEngine {
    #[default]
    Brave,
    Searxng,
}

impl std::str::FromStr for SearchEngine {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "brave" => Ok(SearchEngine::Brave),
            "searxng" | "searx" => Ok(SearchEngine::Searxng),
            other => Err(format!("unknown search engine: {other}")),
        }
    }
}

/// A window of characters cut out of a fetched page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadSlice {
    pub text: String,
    /// True iff `start + length` is short of the page length.
    pub has_more: bool,
}

impl ReadSlice {
    /// Cut `length` characters starting at character `start`.
    ///
    /// Offsets count `char`s rather than bytes so a slice never splits a
    /// UTF-8 sequence.
    pub fn cut(content: &str, start: usize, length: usize) -> Self {
        let total = content.chars().count();
        let text: String = content.chars().skip(start).take(length).collect();
        Self {
            text,
            has_more: start.saturating_add(length) < total,
        }
    }
}

/// The tool transport: the external capabilities behind each tool.
#[async_trait]
pub trait ToolBackend: Send + Sync {
    /// Search the web. `on_result` is invoked once per result as it becomes
    /// available, before the full list is returned.
    async fn web_search(
        &self,
        query: &str,
        engine: SearchEngine,
        on_result: &(dyn for<'r> Fn(&'r SearchResult) + Send + Sync),
    ) -> Result<Vec<SearchResult>, ToolError>;

    /// Fetch a page and return its readable text.
    async fn read_url(&self, url: &str) -> Result<String, ToolError>;

    /// Look up an instant answer.
    async fn instant_answer(&self, query: &str) -> Result<Value, ToolError>;
}
