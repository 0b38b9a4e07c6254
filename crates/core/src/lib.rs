//! # Scoutline Core
//!
//! Domain types, traits, and error definitions for the Scoutline research
//! assistant. This crate defines the model every other crate builds on.
//!
//! ## Seams
//!
//! The orchestrator talks to three collaborators, each defined as a trait here:
//! - [`Provider`]: the LLM transport
//! - [`ToolBackend`]: web search, page fetch, instant answers
//! - [`Ui`]: whatever renders the session to a person
//!
//! Implementations live in their respective crates, and tests substitute
//! scripted stand-ins.

pub mod error;
pub mod event;
pub mod message;
pub mod provider;
pub mod settings;
pub mod tool;
pub mod ui;

// Re-export key types at crate root for ergonomics
pub use error::{ProviderError, ToolError};
pub use event::{DomainEvent, EventBus};
pub use message::{Conversation, ConversationId, Role, Turn};
pub use provider::{Provider, ProviderRequest, ProviderResponse, StreamChunk, Usage};
pub use settings::{Settings, SettingsUpdate};
pub use tool::{
    ReadSlice, SearchEngine, SearchResult, ToolBackend, ToolCall, ToolCallHistoryEntry,
    ToolCallSignature, ToolInvocation, ToolKind, DEFAULT_READ_LENGTH,
};
pub use ui::{MessageHandle, NullUi, Ui};
