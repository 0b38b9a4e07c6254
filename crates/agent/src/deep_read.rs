//! Deep read: model-guided reading of one source, chunk by chunk, and the
//! search-result suggestion flow built on top of it.

use regex_lite::Regex;
use scoutline_core::tool::{ReadSlice, ToolCall, ToolKind};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::executor::ToolOutcome;
use crate::prompt;
use crate::session::{ReadKey, Session};
use crate::summarizer::SummaryOutcome;

/// Why a deep read stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// `deep_read_max_chunks` chunks were read.
    ChunkCap,
    /// `deep_read_max_chars` characters were read.
    CharCap,
    /// The document has nothing after the last chunk.
    EndOfContent,
    /// The model said no more is needed.
    NotNeeded,
    /// The judgment request failed; treated as no more needed.
    JudgmentFailed,
    /// A chunk could not be fetched.
    FetchFailed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeepReadReport {
    /// Chunks actually read, in document order.
    pub chunks: Vec<String>,
    pub stop: StopReason,
}

/// Result of reading the suggested search results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoReadReport {
    pub reads: Vec<(String, DeepReadReport)>,
    pub summary: SummaryOutcome,
}

/// Whether the first word of a yes/no reply is "yes", ignoring punctuation and case.
pub fn is_affirmative(reply: &str) -> bool {
    reply
        .split(|c: char| !c.is_alphanumeric())
        .find(|word| !word.is_empty())
        .is_some_and(|word| word.eq_ignore_ascii_case("yes"))
}

/// Pull 1-based result numbers out of a free-form reply. Numbers outside
/// `1..=available` and repeats are dropped.
pub fn parse_indices(reply: &str, available: usize) -> Vec<usize> {
    let Ok(number) = Regex::new(r"\d+") else {
        return Vec::new();
    };

    let mut indices = Vec::new();
    for m in number.find_iter(reply) {
        let Ok(index) = m.as_str().parse::<usize>() else {
            continue;
        };
        if (1..=available).contains(&index) && !indices.contains(&index) {
            indices.push(index);
        }
    }
    indices
}

impl Session {
    /// Read `url` in fixed-size chunks for as long as the model wants more.
    pub async fn deep_read(&mut self, url: &str) -> DeepReadReport {
        let url = url.trim().to_string();
        let size = self.limits.deep_read_chunk_size.max(1);
        let question = self.current_question();
        let mut chunks: Vec<String> = Vec::new();
        let mut chars = 0usize;

        info!(url = %url, chunk_size = size, "Deep read started");

        let stop = loop {
            let start = chunks.len() * size;
            self.ui.show_status(&format!("Reading {url}, part {}…", chunks.len() + 1));

            let Some(slice) = self.read_chunk(&url, start, size).await else {
                break StopReason::FetchFailed;
            };

            chars += slice.text.chars().count();
            chunks.push(slice.text);

            if chunks.len() >= self.limits.deep_read_max_chunks {
                break StopReason::ChunkCap;
            }
            if chars >= self.limits.deep_read_max_chars {
                break StopReason::CharCap;
            }
            if !slice.has_more {
                break StopReason::EndOfContent;
            }

            let request = prompt::more_content_request(
                question.as_deref(),
                &url,
                chunks.len(),
                chunks.last().map(String::as_str).unwrap_or_default(),
            );
            match self.side_request(prompt::JUDGE_SYSTEM, request, None).await {
                Ok(reply) if is_affirmative(&reply) => continue,
                Ok(reply) => {
                    debug!(url = %url, reply = %reply.trim(), "No more content needed");
                    break StopReason::NotNeeded;
                }
                Err(e) => {
                    warn!(url = %url, error = %e, "Deep read judgment failed");
                    break StopReason::JudgmentFailed;
                }
            }
        };
        self.ui.clear_status();

        info!(url = %url, chunks = chunks.len(), stop = ?stop, "Deep read finished");
        DeepReadReport { chunks, stop }
    }

    /// One chunk, from the read cache or through the executor without continuation.
    async fn read_chunk(&mut self, url: &str, start: usize, length: usize) -> Option<ReadSlice> {
        let key = ReadKey {
            url: url.to_string(),
            start,
            length,
        };

        if let Some(cached) = self.read_cache.get(&key).cloned() {
            debug!(url, start, "Deep read cache hit");
            self.ui.add_read_result(url, &cached.text, cached.has_more);
            self.collect_snippet(cached.text.clone());
            return Some(cached);
        }

        let call = ToolCall::new(
            ToolKind::ReadUrl,
            json!({ "url": url, "start": start, "length": length }),
        );
        match self.execute_tool_call(call).await {
            ToolOutcome::Executed(_) => self.read_cache.get(&key).cloned(),
            _ => None,
        }
    }

    /// Ask the model which of the last search results are worth reading, then
    /// read and summarize them.
    pub async fn suggest_results_to_read(&mut self) -> Option<AutoReadReport> {
        if self.last_search_results.is_empty() {
            debug!("No search results to suggest from");
            return None;
        }

        let question = self.current_question();
        let request = prompt::suggest_request(question.as_deref(), &self.last_search_results);
        self.ui.show_status("Choosing results to read…");
        let reply = self.side_request(prompt::SUGGEST_SYSTEM, request, None).await;
        self.ui.clear_status();

        match reply {
            Ok(reply) => self.auto_read_and_summarize_from_suggestion(&reply).await,
            Err(e) => {
                warn!(error = %e, "Read suggestion failed");
                None
            }
        }
    }

    /// Highlight and deep-read the results named in `reply`, then summarize
    /// everything read. A call while one is already running does nothing.
    pub async fn auto_read_and_summarize_from_suggestion(
        &mut self,
        reply: &str,
    ) -> Option<AutoReadReport> {
        if self.auto_read_in_flight {
            debug!("Auto-read already running");
            return None;
        }

        let indices = parse_indices(reply, self.last_search_results.len());
        if indices.is_empty() {
            debug!(reply = %reply.trim(), "No results suggested");
            return None;
        }

        self.auto_read_in_flight = true;

        let mut urls = Vec::with_capacity(indices.len());
        for index in indices {
            let result = &self.last_search_results[index - 1];
            self.ui.add_search_result(index, result, true);
            urls.push(result.url.clone());
        }
        info!(count = urls.len(), "Reading suggested results");

        let mut reads = Vec::with_capacity(urls.len());
        for url in urls {
            let report = self.deep_read(&url).await;
            reads.push((url, report));
        }
        let summary = self.summarize_snippets().await;

        self.auto_read_in_flight = false;
        Some(AutoReadReport { reads, summary })
    }
}
