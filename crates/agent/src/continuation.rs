//! Continuation controller: after a tool ran, should the model go again?

use scoutline_core::message::Conversation;

use crate::classifier::extract_tool_call;

pub const CHAIN_REFUSED: &str = "Warning: The model requested another tool call without reasoning over the previous result. Stopping here.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Continuation {
    /// Send the conversation back to the model with no new user turn.
    Resubmit,
    /// The newest turn is itself a tool call; stop instead of chaining.
    RefuseChained,
}

/// Decide from the newest turn of `conversation`.
pub fn decide(conversation: &Conversation) -> Continuation {
    if extract_tool_call(&conversation.last().content).is_some() {
        Continuation::RefuseChained
    } else {
        Continuation::Resubmit
    }
}
