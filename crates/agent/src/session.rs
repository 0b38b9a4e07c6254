//! The session: owner of all orchestration state for one conversation.
//!
//! An exchange runs as a loop:
//!
//! 1. **Append** the user turn
//! 2. **Ask the model** (streamed or not) and append its raw reply
//! 3. **Classify** the reply
//! 4. **If a tool call**: validate, guard, execute, append the result, then
//!    let the continuation controller decide whether to go back to step 2
//! 5. **Otherwise**: display the answer and stop
//!
//! Nothing here runs concurrently. Every step awaits the previous one, and
//! `&mut self` on every entry point keeps a second exchange from starting
//! while one is in flight.

use chrono::Utc;
use scoutline_config::OrchestratorConfig;
use scoutline_core::error::ProviderError;
use scoutline_core::event::{DomainEvent, EventBus};
use scoutline_core::message::{Conversation, Role};
use scoutline_core::provider::{Provider, ProviderRequest, Usage};
use scoutline_core::settings::{Settings, SettingsUpdate};
use scoutline_core::tool::{
    ReadSlice, SearchEngine, SearchResult, ToolBackend, ToolCall, ToolCallHistoryEntry, ToolKind,
};
use scoutline_core::ui::{MessageHandle, Ui};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::classifier::{Classification, ResponseClassifier, THINKING_PLACEHOLDER, format_display};
use crate::continuation::{self, CHAIN_REFUSED, Continuation};
use crate::executor::ToolOutcome;
use crate::loop_guard::LoopGuard;
use crate::prompt;

pub const ROUND_LIMIT_NOTICE: &str =
    "I've reached the maximum number of tool rounds for this message. Please refine the request.";

/// Cache key for one `read_url` window.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReadKey {
    pub url: String,
    pub start: usize,
    pub length: usize,
}

/// How a user exchange ended.
#[derive(Debug, Clone, PartialEq)]
pub enum ExchangeOutcome {
    /// The model answered; the displayed text.
    Answered(String),
    /// There was no input to send.
    Idle,
    /// The model call failed.
    Failed(String),
    /// The model requested a tool with invalid arguments.
    InvalidToolCall(ToolKind),
    /// The loop guard stopped the exchange.
    LoopDetected(ToolKind),
    /// The model chained tool calls without reasoning in between.
    ChainRefused,
    /// `max_tool_rounds` was used up.
    RoundLimit,
}

/// A model reply as received.
pub(crate) struct Reply {
    pub text: String,
    /// The streaming message the reply was rendered into, if streamed.
    pub handle: Option<MessageHandle>,
    pub usage: Option<Usage>,
    pub model: String,
}

/// One conversation with the model, its tools and its UI.
pub struct Session {
    pub(crate) provider: Arc<dyn Provider>,
    pub(crate) backend: Arc<dyn ToolBackend>,
    pub(crate) ui: Arc<dyn Ui>,
    pub(crate) event_bus: Arc<EventBus>,

    pub(crate) model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    pub(crate) engine: SearchEngine,
    pub(crate) limits: OrchestratorConfig,

    settings: Settings,
    pub(crate) conversation: Conversation,
    classifier: ResponseClassifier,
    pub(crate) loop_guard: LoopGuard,

    /// Every tool call ever requested, valid or not.
    pub(crate) audit_log: Vec<ToolCallHistoryEntry>,
    /// Text read since the last summary.
    pub(crate) snippets: Vec<String>,
    pub(crate) read_cache: HashMap<ReadKey, ReadSlice>,
    pub(crate) last_search_results: Vec<SearchResult>,
    pub(crate) searched_this_exchange: bool,
    pub(crate) auto_read_in_flight: bool,
    total_tokens: u64,
}

impl Session {
    /// Create a session with default settings and limits.
    pub fn new(
        provider: Arc<dyn Provider>,
        backend: Arc<dyn ToolBackend>,
        ui: Arc<dyn Ui>,
        model: impl Into<String>,
    ) -> Self {
        let settings = Settings::default();
        let limits = OrchestratorConfig::default();
        Self {
            provider,
            backend,
            ui,
            event_bus: Arc::new(EventBus::default()),
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
            engine: SearchEngine::default(),
            loop_guard: LoopGuard::new(limits.loop_threshold),
            limits,
            conversation: Conversation::new(prompt::system_prompt(settings.enable_cot)),
            settings,
            classifier: ResponseClassifier::new(),
            audit_log: Vec::new(),
            snippets: Vec::new(),
            read_cache: HashMap::new(),
            last_search_results: Vec::new(),
            searched_this_exchange: false,
            auto_read_in_flight: false,
            total_tokens: 0,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the default max tokens per model reply.
    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    pub fn with_limits(mut self, limits: OrchestratorConfig) -> Self {
        self.loop_guard = LoopGuard::new(limits.loop_threshold);
        self.limits = limits;
        self
    }

    pub fn with_search_engine(mut self, engine: SearchEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = event_bus;
        self
    }

    /// Start over with `settings`.
    pub fn initialize(&mut self, settings: Settings) {
        self.settings = settings;
        self.reset_conversation();
    }

    /// Replace the settings snapshot. A change to `enable_cot` reaches the
    /// system turn on the next reset.
    pub fn update_settings(&mut self, update: SettingsUpdate) {
        self.settings = self.settings.apply(update);
        debug!(settings = ?self.settings, "Settings updated");
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn total_token_count(&self) -> u64 {
        self.total_tokens
    }

    pub fn tool_call_audit_log(&self) -> &[ToolCallHistoryEntry] {
        &self.audit_log
    }

    /// Snippets waiting to be summarized.
    pub fn pending_snippets(&self) -> &[String] {
        &self.snippets
    }

    pub fn last_search_results(&self) -> &[SearchResult] {
        &self.last_search_results
    }

    /// Fresh conversation. The audit log and the read cache survive.
    pub fn reset_conversation(&mut self) {
        self.conversation = Conversation::new(prompt::system_prompt(self.settings.enable_cot));
        self.classifier.reset();
        self.loop_guard.reset();
        self.snippets.clear();
        self.last_search_results.clear();
        self.searched_this_exchange = false;
        self.total_tokens = 0;
        info!(conversation_id = %self.conversation.id, "Conversation reset");
    }

    /// Send whatever the person typed.
    pub async fn send_message(&mut self) -> ExchangeOutcome {
        let input = self.ui.user_input();
        let input = input.trim();
        if input.is_empty() {
            return ExchangeOutcome::Idle;
        }
        let input = input.to_string();
        self.ui.clear_user_input();
        self.submit(&input).await
    }

    /// Run one user exchange for `text`.
    pub async fn submit(&mut self, text: &str) -> ExchangeOutcome {
        info!(
            conversation_id = %self.conversation.id,
            turns = self.conversation.len(),
            "Processing user message"
        );

        self.ui.add_message(Role::User, text);
        self.conversation.push_user(text);
        self.searched_this_exchange = false;

        let outcome = self.run_model_loop().await;

        if self.limits.auto_suggest_reads && self.searched_this_exchange {
            self.suggest_results_to_read().await;
        }

        outcome
    }

    /// Execute a tool call, then let the model continue over the result.
    pub async fn handle_tool_call(&mut self, call: ToolCall) -> ToolOutcome {
        let outcome = self.execute_tool_call(call).await;
        if outcome.allows_continuation() {
            match continuation::decide(&self.conversation) {
                Continuation::Resubmit => {
                    self.run_model_loop().await;
                }
                Continuation::RefuseChained => self.refuse_chained(),
            }
        }
        outcome
    }

    /// Ask the model, act on tool calls, and repeat until it answers.
    pub(crate) async fn run_model_loop(&mut self) -> ExchangeOutcome {
        let mut rounds = 0u32;

        loop {
            let reply = match self.request_reply().await {
                Ok(reply) => reply,
                Err(e) => {
                    warn!(error = %e, "Model call failed");
                    let notice = format!("Error: {e}");
                    self.notify(&notice);
                    return ExchangeOutcome::Failed(e.to_string());
                }
            };

            self.conversation.push_assistant(&reply.text);
            self.record_usage(reply.usage, &reply.model).await;
            let classification = self.classifier.classify(&reply.text, self.settings.enable_cot);

            let call = match classification {
                Classification::ToolCall(call) => call,
                other => {
                    let display = format_display(&other, self.settings);
                    match reply.handle {
                        Some(handle) => self.ui.update_message_content(handle, &display),
                        None => self.ui.add_message(Role::Assistant, &display),
                    }
                    return ExchangeOutcome::Answered(display);
                }
            };

            if rounds >= self.limits.max_tool_rounds {
                warn!(rounds, "Tool round limit reached");
                self.notify(ROUND_LIMIT_NOTICE);
                return ExchangeOutcome::RoundLimit;
            }
            rounds += 1;
            debug!(round = rounds, tool = %call.tool, "Model requested a tool");

            match self.execute_tool_call(call).await {
                ToolOutcome::Invalid(tool) => return ExchangeOutcome::InvalidToolCall(tool),
                ToolOutcome::LoopDetected { tool, .. } => {
                    return ExchangeOutcome::LoopDetected(tool);
                }
                ToolOutcome::Executed(_) | ToolOutcome::Failed { .. } => {}
            }

            match continuation::decide(&self.conversation) {
                Continuation::Resubmit => continue,
                Continuation::RefuseChained => {
                    self.refuse_chained();
                    return ExchangeOutcome::ChainRefused;
                }
            }
        }
    }

    fn refuse_chained(&mut self) {
        warn!("Refusing chained tool call");
        self.notify(CHAIN_REFUSED);
    }

    /// Append an assistant notice and show it.
    pub(crate) fn notify(&mut self, text: &str) {
        self.conversation.push_assistant(text);
        self.ui.add_message(Role::Assistant, text);
    }

    /// Send the conversation to the model, streaming when enabled.
    async fn request_reply(&mut self) -> Result<Reply, ProviderError> {
        let request = ProviderRequest {
            model: self.model.clone(),
            messages: self.conversation.turns().to_vec(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stream: self.settings.streaming,
            timeout_secs: None,
        };

        if !self.settings.streaming {
            self.ui.show_spinner(THINKING_PLACEHOLDER);
            let result = self.provider.complete(request).await;
            self.ui.hide_spinner();
            let response = result?;
            return Ok(Reply {
                text: response.content,
                handle: None,
                usage: response.usage,
                model: response.model,
            });
        }

        let mut rx = self.provider.stream(request).await?;
        let handle = self.ui.create_empty_message();
        let mut text = String::new();
        let mut usage = None;

        while let Some(chunk) = rx.recv().await {
            let chunk = chunk?;
            if let Some(delta) = chunk.content.filter(|d| !d.is_empty()) {
                text.push_str(&delta);
                let partial = self.classifier.classify(&text, self.settings.enable_cot);
                self.ui
                    .update_message_content(handle, &format_display(&partial, self.settings));
            }
            if chunk.usage.is_some() {
                usage = chunk.usage;
            }
            if chunk.done {
                break;
            }
        }

        Ok(Reply {
            text,
            handle: Some(handle),
            usage,
            model: self.model.clone(),
        })
    }

    /// Count tokens for a main-conversation reply already appended to the
    /// conversation: reported usage, else the provider's count, else a
    /// length estimate.
    async fn record_usage(&mut self, usage: Option<Usage>, model: &str) {
        let tokens = match usage {
            Some(u) => u.total_tokens as u64,
            None => match self
                .provider
                .count_tokens(&self.model, self.conversation.turns())
                .await
            {
                Ok(Some(n)) => n as u64,
                Ok(None) => self.conversation.estimated_tokens() as u64,
                Err(e) => {
                    debug!(error = %e, "Token count unavailable");
                    self.conversation.estimated_tokens() as u64
                }
            },
        };
        self.add_tokens(tokens, model);
    }

    pub(crate) fn add_tokens(&mut self, tokens: u64, model: &str) {
        self.total_tokens += tokens;
        self.event_bus.publish(DomainEvent::ResponseGenerated {
            conversation_id: self.conversation.id.to_string(),
            model: model.to_string(),
            tokens_used: u32::try_from(tokens).unwrap_or(u32::MAX),
            timestamp: Utc::now(),
        });
    }

    /// A one-off, non-streamed request outside the conversation.
    pub(crate) async fn side_request(
        &mut self,
        system: &str,
        user: String,
        timeout_secs: Option<u64>,
    ) -> Result<String, ProviderError> {
        let mut request = ProviderRequest::new(
            self.model.clone(),
            vec![
                scoutline_core::message::Turn::system(system),
                scoutline_core::message::Turn::user(user),
            ],
        );
        request.temperature = 0.2;
        request.max_tokens = self.max_tokens;
        request.timeout_secs = timeout_secs;

        let response = self.provider.complete(request).await?;
        if let Some(usage) = response.usage {
            self.add_tokens(usage.total_tokens as u64, &response.model);
        }
        Ok(response.content)
    }

    /// The newest user question, if any.
    pub(crate) fn current_question(&self) -> Option<String> {
        self.conversation.last_user().map(|t| t.content.clone())
    }
}
