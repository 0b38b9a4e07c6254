//! Terminal rendering of a session.
//!
//! Streamed replies arrive as growing snapshots; only the new suffix is
//! printed. When a snapshot is not an extension of what is already on
//! screen (the display switched from a placeholder to the answer, say) the
//! line is printed again from the start.

use scoutline_core::message::Role;
use scoutline_core::tool::SearchResult;
use scoutline_core::ui::{MessageHandle, Ui};
use std::io::Write;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

const CLEAR_LINE: &str = "\r\x1b[2K";

#[derive(Default)]
pub struct TerminalUi {
    input: Mutex<String>,
    next_handle: AtomicU64,
    /// The streamed message currently on screen and what was printed of it.
    open_stream: Mutex<Option<(MessageHandle, String)>>,
}

impl TerminalUi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a line for the next `send_message`.
    pub fn set_input(&self, text: &str) {
        if let Ok(mut input) = self.input.lock() {
            *input = text.to_string();
        }
    }

    /// End the streamed message on screen, if any.
    pub fn finish_stream(&self) {
        let Ok(mut open) = self.open_stream.lock() else {
            return;
        };
        if open.take().is_some() {
            println!();
            println!();
        }
    }

    fn print_block(prefix: &str, text: &str) {
        for line in text.lines() {
            println!("  {prefix}{line}");
        }
        println!();
    }
}

/// What to print to bring `shown` up to `next`.
fn stream_delta<'a>(shown: &str, next: &'a str) -> Option<&'a str> {
    next.strip_prefix(shown)
}

impl Ui for TerminalUi {
    fn show_spinner(&self, text: &str) {
        self.finish_stream();
        eprint!("{CLEAR_LINE}  {text}");
        let _ = std::io::stderr().flush();
    }

    fn hide_spinner(&self) {
        eprint!("{CLEAR_LINE}");
        let _ = std::io::stderr().flush();
    }

    fn show_status(&self, text: &str) {
        self.show_spinner(text);
    }

    fn clear_status(&self) {
        self.hide_spinner();
    }

    fn add_message(&self, role: Role, text: &str) {
        self.finish_stream();
        match role {
            Role::Assistant => Self::print_block("Assistant > ", text),
            Role::User => {}
            Role::System => Self::print_block("[system] ", text),
        }
    }

    fn add_search_result(&self, index: usize, result: &SearchResult, highlighted: bool) {
        self.finish_stream();
        let marker = if highlighted { "*" } else { " " };
        println!("  {marker}[{index}] {}", result.title);
        println!("       {}", result.url);
        if highlighted {
            println!();
        }
    }

    fn add_read_result(&self, url: &str, snippet: &str, has_more: bool) {
        self.finish_stream();
        let more = if has_more { ", more available" } else { "" };
        println!("  Read {url} ({} chars{more})", snippet.chars().count());
    }

    fn add_summarize_button(&self) {
        self.finish_stream();
        println!("  (type /summarize to condense what has been read)");
    }

    fn create_empty_message(&self) -> MessageHandle {
        self.finish_stream();
        let handle = MessageHandle(self.next_handle.fetch_add(1, Ordering::SeqCst));
        if let Ok(mut open) = self.open_stream.lock() {
            *open = Some((handle, String::new()));
        }
        print!("  Assistant > ");
        let _ = std::io::stdout().flush();
        handle
    }

    fn update_message_content(&self, handle: MessageHandle, text: &str) {
        let Ok(mut open) = self.open_stream.lock() else {
            return;
        };
        let Some((current, shown)) = open.as_mut() else {
            return;
        };
        if *current != handle || shown.as_str() == text {
            return;
        }

        match stream_delta(shown, text) {
            Some(delta) => print!("{delta}"),
            None => print!("{CLEAR_LINE}  Assistant > {text}"),
        }
        *shown = text.to_string();
        let _ = std::io::stdout().flush();
    }

    fn user_input(&self) -> String {
        self.input.lock().map(|i| i.clone()).unwrap_or_default()
    }

    fn clear_user_input(&self) {
        if let Ok(mut input) = self.input.lock() {
            input.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_is_the_new_suffix() {
        assert_eq!(stream_delta("Hel", "Hello"), Some("lo"));
        assert_eq!(stream_delta("", "Hi"), Some("Hi"));
        assert_eq!(stream_delta("Thinking…", "42"), None);
    }

    #[test]
    fn input_round_trip() {
        let ui = TerminalUi::new();
        ui.set_input("what is tokio?");
        assert_eq!(ui.user_input(), "what is tokio?");
        ui.clear_user_input();
        assert!(ui.user_input().is_empty());
    }

    #[test]
    fn stale_handles_are_ignored() {
        let ui = TerminalUi::new();
        let first = ui.create_empty_message();
        let second = ui.create_empty_message();
        ui.update_message_content(first, "old");
        ui.update_message_content(second, "new");

        let open = ui.open_stream.lock().unwrap();
        assert_eq!(open.as_ref().map(|(h, s)| (*h, s.as_str())), Some((second, "new")));
    }
}
