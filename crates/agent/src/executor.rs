//! Tool execution: audit, validate, guard, dispatch, and record the result.
//!
//! Each tool's result becomes exactly one assistant turn whose content is a
//! pure function of the tool's output and arguments.

use chrono::Utc;
use scoutline_core::error::ToolError;
use scoutline_core::event::DomainEvent;
use scoutline_core::message::Role;
use scoutline_core::tool::{
    ReadSlice, SearchResult, ToolCall, ToolCallHistoryEntry, ToolInvocation, ToolKind,
};
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tracing::{debug, warn};

use crate::loop_guard::Verdict;
use crate::session::{ReadKey, Session};

/// What became of one tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOutcome {
    /// The tool ran and its result was appended.
    Executed(ToolKind),
    /// The tool ran and failed; the failure was appended.
    Failed {
        tool: ToolKind,
        message: String,
    },
    /// The arguments did not validate; nothing ran.
    Invalid(ToolKind),
    /// The loop guard refused the call; nothing ran.
    LoopDetected {
        tool: ToolKind,
        repeats: u32,
    },
}

impl ToolOutcome {
    /// Whether the model should be given the chance to react.
    pub fn allows_continuation(&self) -> bool {
        matches!(self, ToolOutcome::Executed(_) | ToolOutcome::Failed { .. })
    }
}

pub fn invalid_arguments_notice(tool: ToolKind) -> String {
    format!("Error: Invalid {} argument(s).", tool.wire_name())
}

pub fn loop_notice(tool: ToolKind, repeats: u32) -> String {
    format!(
        "Error: Tool call loop detected: {} was requested {repeats} times in a row with the same arguments. Stopping.",
        tool.wire_name()
    )
}

pub fn failure_notice(tool: ToolKind, error: &ToolError) -> String {
    format!("{} failed: {error}", tool.display_name())
}

/// `Search results for "{query}" ({n}):` followed by a numbered list.
pub fn format_search_results(query: &str, results: &[SearchResult]) -> String {
    let list = results
        .iter()
        .enumerate()
        .map(|(i, r)| format!("{}. {} ({}) - {}", i + 1, r.title, r.url, r.snippet))
        .collect::<Vec<_>>()
        .join("\n");
    format!("Search results for \"{query}\" ({}):\n{list}", results.len())
}

pub fn format_read_result(url: &str, slice: &ReadSlice) -> String {
    let ellipsis = if slice.has_more { "…" } else { "" };
    format!("Read content from {url}:\n{}{ellipsis}", slice.text)
}

pub fn format_instant_answer(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

impl Session {
    /// Run one tool call without any continuation.
    pub async fn execute_tool_call(&mut self, call: ToolCall) -> ToolOutcome {
        let tool = call.tool;
        self.audit_log.push(ToolCallHistoryEntry {
            tool,
            args: call.arguments.clone(),
            timestamp: Utc::now(),
        });

        let invocation = match call.validate() {
            Ok(invocation) => invocation,
            Err(e) => {
                debug!(tool = %tool, error = %e, "Tool arguments rejected");
                self.notify(&invalid_arguments_notice(tool));
                return ToolOutcome::Invalid(tool);
            }
        };

        if let Verdict::Abort { repeats } = self.loop_guard.check(call.signature()) {
            warn!(tool = %tool, repeats, "Tool call loop detected");
            self.event_bus.publish(DomainEvent::LoopDetected {
                tool,
                repeats,
                timestamp: Utc::now(),
            });
            self.notify(&loop_notice(tool, repeats));
            return ToolOutcome::LoopDetected { tool, repeats };
        }

        let started = Instant::now();
        let result = self.dispatch(invocation).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        self.event_bus.publish(DomainEvent::ToolExecuted {
            tool,
            success: result.is_ok(),
            duration_ms,
            timestamp: Utc::now(),
        });

        match result {
            Ok(turn) => {
                self.conversation.push_assistant(turn);
                ToolOutcome::Executed(tool)
            }
            Err(e) => {
                warn!(tool = %tool, error = %e, "Tool execution failed");
                self.notify(&failure_notice(tool, &e));
                ToolOutcome::Failed {
                    tool,
                    message: e.to_string(),
                }
            }
        }
    }

    /// Call the backend and render the result turn. The spinner is cleared
    /// on every path.
    async fn dispatch(&mut self, invocation: ToolInvocation) -> Result<String, ToolError> {
        match invocation {
            ToolInvocation::WebSearch { query } => {
                self.ui.show_spinner(&format!("Searching for \"{query}\"…"));
                let ui = Arc::clone(&self.ui);
                let seen = AtomicUsize::new(0);
                let on_result = move |r: &SearchResult| {
                    let index = seen.fetch_add(1, Ordering::Relaxed) + 1;
                    ui.add_search_result(index, r, false);
                };
                let result = self.backend.web_search(&query, self.engine, &on_result).await;
                self.ui.hide_spinner();

                let results = result?;
                let turn = format_search_results(&query, &results);
                self.last_search_results = results;
                self.searched_this_exchange = true;
                Ok(turn)
            }
            ToolInvocation::ReadUrl { url, start, length } => {
                self.ui.show_spinner(&format!("Reading {url}…"));
                let result = self.backend.read_url(&url).await;
                self.ui.hide_spinner();

                let content = result?;
                let slice = ReadSlice::cut(&content, start, length);
                self.ui.add_read_result(&url, &slice.text, slice.has_more);
                self.collect_snippet(slice.text.clone());

                let turn = format_read_result(&url, &slice);
                self.read_cache.insert(ReadKey { url, start, length }, slice);
                Ok(turn)
            }
            ToolInvocation::InstantAnswer { query } => {
                self.ui.show_spinner(&format!("Looking up \"{query}\"…"));
                let result = self.backend.instant_answer(&query).await;
                self.ui.hide_spinner();

                let turn = format_instant_answer(&result?);
                self.ui.add_message(Role::Assistant, &turn);
                Ok(turn)
            }
        }
    }

    /// Add read text to the snippet buffer, offering a summary when the
    /// buffer stops being empty.
    pub(crate) fn collect_snippet(&mut self, text: String) {
        if self.snippets.is_empty() {
            self.ui.add_summarize_button();
        }
        self.snippets.push(text);
    }
}
