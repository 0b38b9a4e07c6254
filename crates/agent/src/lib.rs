//! The orchestration core of Scoutline.
//!
//! A [`Session`] mediates between a person (through [`Ui`]), a model
//! (through [`Provider`]) and the retrieval tools (through [`ToolBackend`]).
//! Each user exchange follows an **Ask → Act → Continue** cycle:
//!
//! 1. **Ask** the model with the whole conversation
//! 2. **Classify** the reply as a tool call, a `Thinking:`/`Answer:` reply or plain text
//! 3. **Act** on a tool call: validate, guard against loops, execute, append the result
//! 4. **Continue** by resubmitting the conversation, unless the newest turn is
//!    itself a tool call
//!
//! Read content accumulates in a snippet buffer that [`Session::summarize_snippets`]
//! folds into one bounded summary, and [`Session::deep_read`] keeps reading a
//! single source while the model says more is needed.
//!
//! [`Ui`]: scoutline_core::Ui
//! [`Provider`]: scoutline_core::Provider
//! [`ToolBackend`]: scoutline_core::ToolBackend

pub mod classifier;
pub mod continuation;
pub mod deep_read;
pub mod executor;
pub mod loop_guard;
pub mod prompt;
pub mod session;
pub mod summarizer;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use classifier::{
    Classification, ReasoningResponse, ReasoningStage, ResponseClassifier, extract_tool_call,
};
pub use continuation::Continuation;
pub use deep_read::{AutoReadReport, DeepReadReport, StopReason};
pub use executor::ToolOutcome;
pub use loop_guard::{LoopGuard, Verdict};
pub use session::{ExchangeOutcome, Session};
pub use summarizer::{SummaryOutcome, pack_batches};
