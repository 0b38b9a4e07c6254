//! Batch summarizer: folds the snippet buffer into one bounded summary.
//!
//! Snippets are packed greedily into batches under a character budget and
//! each batch is summarized on its own, one after another. When the joined
//! batch summaries are still over budget they become the input of the next
//! round. The buffer is only cleared once a round produces a final result or
//! fails for good.

use chrono::Utc;
use scoutline_core::event::DomainEvent;
use tracing::{debug, info, warn};

use crate::prompt;
use crate::session::Session;

/// How a summary request ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryOutcome {
    /// Nothing was waiting to be summarized.
    Empty,
    Summarized {
        text: String,
        rounds: u32,
        batches: usize,
    },
    Failed(String),
}

/// Group `items` in order so that each group's total length stays within
/// `budget` characters. An item longer than `budget` gets a group of its own.
pub fn pack_batches(items: &[String], budget: usize) -> Vec<Vec<String>> {
    let mut batches: Vec<Vec<String>> = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut current_len = 0;

    for item in items {
        let len = item.chars().count();
        if !current.is_empty() && current_len + len > budget {
            batches.push(std::mem::take(&mut current));
            current_len = 0;
        }
        current.push(item.clone());
        current_len += len;
    }

    if !current.is_empty() {
        batches.push(current);
    }
    batches
}

pub fn round_cap_notice(rounds: u32) -> String {
    format!("Error: Could not condense the collected content after {rounds} rounds.")
}

impl Session {
    /// Summarize and clear the snippet buffer.
    pub async fn summarize_snippets(&mut self) -> SummaryOutcome {
        if self.snippets.is_empty() {
            return SummaryOutcome::Empty;
        }

        let question = self.current_question();
        let budget = self.limits.summary_budget_chars;
        let max_rounds = self.limits.max_summary_rounds.max(1);
        let mut items = self.snippets.clone();
        let mut rounds = 0u32;
        let mut total_batches = 0usize;

        info!(snippets = items.len(), budget, "Summarizing collected content");

        let outcome = loop {
            rounds += 1;
            let batches = pack_batches(&items, budget);
            let count = batches.len();
            let mut summaries = Vec::with_capacity(count);
            let mut failure = None;

            for (i, batch) in batches.iter().enumerate() {
                if count > 1 || rounds > 1 {
                    self.ui.show_status(&format!(
                        "Summarizing batch {} of {count} (round {rounds})…",
                        i + 1
                    ));
                } else {
                    self.ui.show_status("Summarizing…");
                }

                let request = prompt::summarize_request(question.as_deref(), &batch.join("\n\n"));
                let timeout = Some(self.limits.summary_timeout_secs);
                match self.side_request(prompt::SUMMARIZER_SYSTEM, request, timeout).await {
                    Ok(summary) => summaries.push(summary.trim().to_string()),
                    Err(e) => {
                        failure = Some(e.to_string());
                        break;
                    }
                }
            }
            self.ui.clear_status();
            total_batches += summaries.len();

            if let Some(message) = failure {
                warn!(round = rounds, error = %message, "Summary request failed");
                self.notify(&format!("Summary failed: {message}"));
                break SummaryOutcome::Failed(message);
            }

            let joined = summaries.join("\n\n");
            let joined_len = joined.chars().count();
            if items.len() == 1 || joined_len <= budget {
                self.notify(&format!("Summary:\n{joined}"));
                break SummaryOutcome::Summarized {
                    text: joined,
                    rounds,
                    batches: total_batches,
                };
            }

            if rounds >= max_rounds {
                let notice = round_cap_notice(rounds);
                warn!(rounds, joined_len, "Summary did not fit the budget");
                self.notify(&notice);
                break SummaryOutcome::Failed(notice);
            }

            debug!(round = rounds, joined_len, "Summaries over budget, condensing again");
            items = summaries;
        };

        self.snippets.clear();
        self.event_bus.publish(DomainEvent::SummaryProduced {
            rounds,
            batches: total_batches,
            success: matches!(outcome, SummaryOutcome::Summarized { .. }),
            timestamp: Utc::now(),
        });
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use scoutline_config::OrchestratorConfig;
    use scoutline_core::error::ProviderError;
    use scoutline_core::message::Role;
    use scoutline_core::settings::Settings;
    use std::sync::Arc;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn session(
        provider: Arc<SequentialMockProvider>,
        ui: Arc<RecordingUi>,
        budget: usize,
    ) -> Session {
        let mut s = Session::new(provider, Arc::new(MockBackend::new()), ui, "mock-model")
            .with_limits(OrchestratorConfig {
                summary_budget_chars: budget,
                ..OrchestratorConfig::default()
            });
        s.initialize(Settings {
            streaming: false,
            ..Settings::default()
        });
        s
    }

    #[test]
    fn packing_preserves_order_and_budget() {
        let items = strings(&["aaaa", "bbbb", "cccc", "dd"]);
        let batches = pack_batches(&items, 10);
        assert_eq!(
            batches,
            vec![strings(&["aaaa", "bbbb"]), strings(&["cccc", "dd"])]
        );
    }

    #[test]
    fn oversized_item_gets_its_own_batch() {
        let items = strings(&["ab", "0123456789abc", "cd"]);
        let batches = pack_batches(&items, 5);
        assert_eq!(
            batches,
            vec![strings(&["ab"]), strings(&["0123456789abc"]), strings(&["cd"])]
        );
    }

    #[test]
    fn packing_counts_chars_not_bytes() {
        let items = strings(&["ééé", "ééé"]);
        assert_eq!(pack_batches(&items, 6).len(), 1);
    }

    #[tokio::test]
    async fn empty_buffer_is_a_no_op() {
        let provider = Arc::new(SequentialMockProvider::texts(&[]));
        let ui = Arc::new(RecordingUi::new());
        let mut s = session(provider.clone(), ui.clone(), 100);

        assert_eq!(s.summarize_snippets().await, SummaryOutcome::Empty);
        assert_eq!(provider.call_count(), 0);
        assert!(ui.events().is_empty());
    }

    #[tokio::test]
    async fn single_snippet_takes_one_call() {
        let provider = Arc::new(SequentialMockProvider::texts(&["Short version."]));
        let ui = Arc::new(RecordingUi::new());
        let mut s = session(provider.clone(), ui.clone(), 100);
        s.snippets.push("A long page about tokio.".into());

        let outcome = s.summarize_snippets().await;
        assert_eq!(
            outcome,
            SummaryOutcome::Summarized {
                text: "Short version.".into(),
                rounds: 1,
                batches: 1,
            }
        );
        assert_eq!(provider.call_count(), 1);
        assert!(s.pending_snippets().is_empty());
        assert_eq!(s.conversation().last().content, "Summary:\nShort version.");
        assert_eq!(ui.messages(Role::Assistant), vec!["Summary:\nShort version."]);
    }

    #[tokio::test]
    async fn summary_requests_stay_out_of_the_conversation() {
        let provider = Arc::new(SequentialMockProvider::texts(&["s"]));
        let mut s = session(provider.clone(), Arc::new(RecordingUi::new()), 100);
        s.conversation.push_user("what is tokio?");
        s.snippets.push("page".into());

        s.summarize_snippets().await;
        let request = &provider.requests()[0];
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].content, prompt::SUMMARIZER_SYSTEM);
        assert!(request.messages[1].content.contains("\"what is tokio?\""));
        assert_eq!(request.timeout_secs, Some(120));
    }

    #[tokio::test]
    async fn over_budget_summaries_recurse() {
        // Round 1: three 10-char snippets, one per batch.
        // Round 2: three 6-char summaries pack as [2, 1] and fit.
        let provider = Arc::new(SequentialMockProvider::texts(&[
            "sum--1", "sum--2", "sum--3", "AB", "C",
        ]));
        let ui = Arc::new(RecordingUi::new());
        let mut s = session(provider.clone(), ui.clone(), 15);
        s.snippets = strings(&["0123456789", "abcdefghij", "klmnopqrst"]);

        let outcome = s.summarize_snippets().await;
        assert_eq!(
            outcome,
            SummaryOutcome::Summarized {
                text: "AB\n\nC".into(),
                rounds: 2,
                batches: 5,
            }
        );
        assert_eq!(provider.call_count(), 5);
        assert!(s.pending_snippets().is_empty());

        let second_round = &provider.requests()[3];
        assert!(second_round.messages[1].content.contains("sum--1\n\nsum--2"));
        assert!(
            ui.events()
                .contains(&UiEvent::Status("Summarizing batch 1 of 2 (round 2)…".into()))
        );
    }

    #[tokio::test]
    async fn round_cap_gives_up() {
        let provider = Arc::new(SequentialMockProvider::texts(&["0123456789", "abcdefghij"]));
        let ui = Arc::new(RecordingUi::new());
        let mut s = session(provider.clone(), ui, 15).with_limits(OrchestratorConfig {
            summary_budget_chars: 15,
            max_summary_rounds: 1,
            ..OrchestratorConfig::default()
        });
        s.snippets = strings(&["0123456789", "abcdefghij"]);

        let outcome = s.summarize_snippets().await;
        assert_eq!(outcome, SummaryOutcome::Failed(round_cap_notice(1)));
        assert_eq!(
            s.conversation().last().content,
            "Error: Could not condense the collected content after 1 rounds."
        );
        assert!(s.pending_snippets().is_empty());
    }

    #[tokio::test]
    async fn model_failure_clears_buffer() {
        let provider = Arc::new(SequentialMockProvider::new(vec![Err(ProviderError::Timeout(
            "summary took too long".into(),
        ))]));
        let ui = Arc::new(RecordingUi::new());
        let mut s = session(provider, ui.clone(), 100);
        s.snippets.push("text".into());

        let outcome = s.summarize_snippets().await;
        assert!(matches!(outcome, SummaryOutcome::Failed(_)));
        assert!(s.conversation().last().content.starts_with("Summary failed: "));
        assert!(s.pending_snippets().is_empty());
        assert_eq!(ui.events().last(), Some(&UiEvent::Message(
            Role::Assistant,
            s.conversation().last().content.clone()
        )));
    }

    #[tokio::test]
    async fn summary_event_is_published() {
        let provider = Arc::new(SequentialMockProvider::texts(&["done"]));
        let mut s = session(provider, Arc::new(RecordingUi::new()), 100);
        let mut rx = s.event_bus.subscribe();
        s.snippets.push("text".into());

        s.summarize_snippets().await;

        let mut summary_events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let DomainEvent::SummaryProduced { rounds, batches, success, .. } = event.as_ref() {
                summary_events.push((*rounds, *batches, *success));
            }
        }
        assert_eq!(summary_events, vec![(1, 1, true)]);
    }
}
