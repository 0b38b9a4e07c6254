//! The UI collaborator: everything the orchestrator shows to a person.
//!
//! Rendering is not the orchestrator's business; it only calls into this
//! trait. Front-ends (the terminal UI, tests) implement it. Actions that a
//! rendered element can trigger, such as "read more" on a search result or
//! the summarize button, are routed by the front-end back into the session.

use crate::message::Role;
use crate::tool::SearchResult;

/// Opaque handle to an assistant message created for streaming updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageHandle(pub u64);

pub trait Ui: Send + Sync {
    fn show_spinner(&self, text: &str);

    fn hide_spinner(&self);

    fn show_status(&self, text: &str);

    fn clear_status(&self);

    fn add_message(&self, role: Role, text: &str);

    /// Render a search result. `index` is its 1-based position in the
    /// result list; `highlighted` marks results suggested for deep reading.
    fn add_search_result(&self, index: usize, result: &SearchResult, highlighted: bool);

    fn add_read_result(&self, url: &str, snippet: &str, has_more: bool);

    /// Offer the person a way to summarize the collected read snippets.
    fn add_summarize_button(&self);

    fn create_empty_message(&self) -> MessageHandle;

    fn update_message_content(&self, handle: MessageHandle, text: &str);

    fn user_input(&self) -> String;

    fn clear_user_input(&self);
}

/// A UI that discards everything. Useful for headless runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullUi;

impl Ui for NullUi {
    fn show_spinner(&self, _text: &str) {}
    fn hide_spinner(&self) {}
    fn show_status(&self, _text: &str) {}
    fn clear_status(&self) {}
    fn add_message(&self, _role: Role, _text: &str) {}
    fn add_search_result(&self, _index: usize, _result: &SearchResult, _highlighted: bool) {}
    fn add_read_result(&self, _url: &str, _snippet: &str, _has_more: bool) {}
    fn add_summarize_button(&self) {}
    fn create_empty_message(&self) -> MessageHandle {
        MessageHandle(0)
    }
    fn update_message_content(&self, _handle: MessageHandle, _text: &str) {}
    fn user_input(&self) -> String {
        String::new()
    }
    fn clear_user_input(&self) {}
}
