//! Response classification: what did the model just say?
//!
//! A reply is one of:
//! - a tool call: the reply contains a `{"tool": ..., "arguments": {...}}` object
//! - a reasoning response: with chain-of-thought on, `Thinking:` / `Answer:` segments
//! - plain text: everything else
//!
//! The classifier runs on every streamed snapshot and once more on the final
//! text. It never fails: malformed input degrades to a weaker classification.
//!
//! Tool-call extraction is deliberately lenient. It takes the span from the
//! first `{` to the last `}` and tries to parse it, so a call wrapped in prose
//! or markdown fences is still found. Prose that itself contains braces can
//! defeat it; the reply then falls through to text handling.

use scoutline_core::settings::Settings;
use scoutline_core::tool::ToolCall;
use tracing::debug;

const THINKING_MARKER: &str = "Thinking:";
const ANSWER_MARKER: &str = "Answer:";

/// Shown in place of the answer while the model is still thinking.
pub const THINKING_PLACEHOLDER: &str = "Thinking…";

/// How far a reasoning response got.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReasoningStage {
    /// Both segments are present, or only an answer.
    Complete,
    /// The reply opened with `Thinking:` and no answer has appeared yet.
    Thinking,
    /// `Thinking:` appears mid-text and the segments could not be split.
    Malformed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReasoningResponse {
    pub thinking: String,
    pub answer: String,
    pub stage: ReasoningStage,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    ToolCall(ToolCall),
    Reasoning(ReasoningResponse),
    PlainText(String),
}

/// Stateful classifier. The only state is the last completed thinking and
/// answer, used to carry the previous answer through a thinking-only stream.
#[derive(Debug, Default)]
pub struct ResponseClassifier {
    last_thinking: String,
    last_answer: String,
}

impl ResponseClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn classify(&mut self, text: &str, cot_enabled: bool) -> Classification {
        if let Some(call) = extract_tool_call(text) {
            return Classification::ToolCall(call);
        }

        if !cot_enabled {
            return Classification::PlainText(text.to_string());
        }

        let thinking_at = text.find(THINKING_MARKER);
        let answer_at = text.find(ANSWER_MARKER);

        match (thinking_at, answer_at) {
            (Some(t), Some(a)) if a > t => {
                let thinking = text[t + THINKING_MARKER.len()..a].trim().to_string();
                let answer = text[a + ANSWER_MARKER.len()..].trim().to_string();
                self.last_thinking = thinking.clone();
                self.last_answer = answer.clone();
                Classification::Reasoning(ReasoningResponse {
                    thinking,
                    answer,
                    stage: ReasoningStage::Complete,
                })
            }
            (Some(t), None) if text.trim_start().starts_with(THINKING_MARKER) => {
                let thinking = text[t + THINKING_MARKER.len()..].trim().to_string();
                self.last_thinking = thinking.clone();
                Classification::Reasoning(ReasoningResponse {
                    thinking,
                    answer: self.last_answer.clone(),
                    stage: ReasoningStage::Thinking,
                })
            }
            (Some(t), _) => {
                debug!("Malformed Thinking/Answer markers");
                Classification::Reasoning(ReasoningResponse {
                    thinking: text[t + THINKING_MARKER.len()..].trim().to_string(),
                    answer: String::new(),
                    stage: ReasoningStage::Malformed,
                })
            }
            (None, Some(a)) => {
                let answer = text[a + ANSWER_MARKER.len()..].trim().to_string();
                self.last_answer = answer.clone();
                Classification::Reasoning(ReasoningResponse {
                    thinking: String::new(),
                    answer,
                    stage: ReasoningStage::Complete,
                })
            }
            (None, None) => Classification::PlainText(text.to_string()),
        }
    }

    /// Last seen `(thinking, answer)`.
    pub fn snapshot(&self) -> (&str, &str) {
        (&self.last_thinking, &self.last_answer)
    }

    /// Forget the carried-over snapshots.
    pub fn reset(&mut self) {
        self.last_thinking.clear();
        self.last_answer.clear();
    }
}

/// Find a tool call anywhere in `text` using the greedy first-`{`-to-last-`}` span.
pub fn extract_tool_call(text: &str) -> Option<ToolCall> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }

    match ToolCall::from_json(&text[start..=end]) {
        Ok(call) => Some(call),
        Err(e) => {
            debug!(error = %e, "Reply contains braces but no valid tool call");
            None
        }
    }
}

/// Render a classification for display under the given settings.
pub fn format_display(classification: &Classification, settings: Settings) -> String {
    match classification {
        Classification::ToolCall(call) => format!("{}…", call.tool.display_name()),
        Classification::PlainText(text) => text.clone(),
        Classification::Reasoning(r) if !settings.enable_cot => r.answer.clone(),
        Classification::Reasoning(r) if settings.show_thinking => match r.stage {
            ReasoningStage::Thinking => format!("{THINKING_MARKER} {}", r.thinking),
            ReasoningStage::Malformed => r.thinking.clone(),
            ReasoningStage::Complete if r.thinking.is_empty() => r.answer.clone(),
            ReasoningStage::Complete => format!("{}\n\n{}", r.thinking, r.answer),
        },
        Classification::Reasoning(r) => {
            if r.answer.is_empty() {
                THINKING_PLACEHOLDER.to_string()
            } else {
                r.answer.clone()
            }
        }
    }
}
