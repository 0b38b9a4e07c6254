//! Shared test helpers: a scripted provider, a recording UI and a canned tool backend.

use async_trait::async_trait;
use scoutline_core::error::{ProviderError, ToolError};
use scoutline_core::message::Role;
use scoutline_core::provider::{
    Provider, ProviderRequest, ProviderResponse, StreamChunk, Usage,
};
use scoutline_core::tool::{SearchEngine, SearchResult, ToolBackend};
use scoutline_core::ui::{MessageHandle, Ui};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// A mock provider that returns a sequence of scripted replies.
///
/// Each call to `complete` returns the next reply in the queue.
/// Panics if more calls are made than replies provided.
pub struct SequentialMockProvider {
    replies: Mutex<Vec<Result<String, ProviderError>>>,
    call_count: Mutex<usize>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl SequentialMockProvider {
    pub fn new(replies: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            replies: Mutex::new(replies),
            call_count: Mutex::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Create a provider from successful reply texts.
    pub fn texts(replies: &[&str]) -> Self {
        Self::new(replies.iter().map(|r| Ok(r.to_string())).collect())
    }

    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    /// Every request seen so far, in order.
    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut count = self.call_count.lock().unwrap();
        let replies = self.replies.lock().unwrap();

        if *count >= replies.len() {
            panic!(
                "SequentialMockProvider: no more responses (call #{}, have {})",
                *count,
                replies.len()
            );
        }

        let reply = replies[*count].clone();
        *count += 1;
        self.requests.lock().unwrap().push(request);

        reply.map(|content| ProviderResponse {
            content,
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
            model: "mock-model".into(),
        })
    }
}

/// A mock provider that streams each scripted reply in the given chunks and
/// never reports usage.
pub struct ChunkedMockProvider {
    replies: Mutex<Vec<Vec<String>>>,
}

impl ChunkedMockProvider {
    pub fn new(replies: Vec<Vec<&str>>) -> Self {
        let replies = replies
            .into_iter()
            .rev()
            .map(|chunks| chunks.into_iter().map(String::from).collect())
            .collect();
        Self {
            replies: Mutex::new(replies),
        }
    }

    fn next_reply(&self) -> Vec<String> {
        self.replies
            .lock()
            .unwrap()
            .pop()
            .expect("ChunkedMockProvider: no more responses")
    }
}

#[async_trait]
impl Provider for ChunkedMockProvider {
    fn name(&self) -> &str {
        "chunked_mock"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        Ok(ProviderResponse {
            content: self.next_reply().concat(),
            usage: None,
            model: "mock-model".into(),
        })
    }

    async fn stream(
        &self,
        _request: ProviderRequest,
    ) -> Result<tokio::sync::mpsc::Receiver<Result<StreamChunk, ProviderError>>, ProviderError>
    {
        let chunks = self.next_reply();
        let (tx, rx) = tokio::sync::mpsc::channel(chunks.len() + 1);
        for content in chunks {
            let _ = tx
                .send(Ok(StreamChunk {
                    content: Some(content),
                    done: false,
                    usage: None,
                }))
                .await;
        }
        let _ = tx
            .send(Ok(StreamChunk {
                content: None,
                done: true,
                usage: None,
            }))
            .await;
        Ok(rx)
    }
}

/// Everything the session asked the UI to do.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    Spinner(String),
    SpinnerHidden,
    Status(String),
    StatusCleared,
    Message(Role, String),
    SearchResult {
        index: usize,
        url: String,
        highlighted: bool,
    },
    ReadResult {
        url: String,
        snippet: String,
        has_more: bool,
    },
    SummarizeButton,
    NewMessage(u64),
    Update(u64, String),
    InputCleared,
}

#[derive(Default)]
pub struct RecordingUi {
    events: Mutex<Vec<UiEvent>>,
    input: Mutex<String>,
    next_handle: AtomicU64,
}

impl RecordingUi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_input(&self, text: &str) {
        *self.input.lock().unwrap() = text.to_string();
    }

    pub fn events(&self) -> Vec<UiEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Texts of all `add_message` calls for the given role.
    pub fn messages(&self, role: Role) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                UiEvent::Message(r, text) if r == role => Some(text),
                _ => None,
            })
            .collect()
    }

    fn record(&self, event: UiEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl Ui for RecordingUi {
    fn show_spinner(&self, text: &str) {
        self.record(UiEvent::Spinner(text.into()));
    }
    fn hide_spinner(&self) {
        self.record(UiEvent::SpinnerHidden);
    }
    fn show_status(&self, text: &str) {
        self.record(UiEvent::Status(text.into()));
    }
    fn clear_status(&self) {
        self.record(UiEvent::StatusCleared);
    }
    fn add_message(&self, role: Role, text: &str) {
        self.record(UiEvent::Message(role, text.into()));
    }
    fn add_search_result(&self, index: usize, result: &SearchResult, highlighted: bool) {
        self.record(UiEvent::SearchResult {
            index,
            url: result.url.clone(),
            highlighted,
        });
    }
    fn add_read_result(&self, url: &str, snippet: &str, has_more: bool) {
        self.record(UiEvent::ReadResult {
            url: url.into(),
            snippet: snippet.into(),
            has_more,
        });
    }
    fn add_summarize_button(&self) {
        self.record(UiEvent::SummarizeButton);
    }
    fn create_empty_message(&self) -> MessageHandle {
        let id = self.next_handle.fetch_add(1, Ordering::SeqCst);
        self.record(UiEvent::NewMessage(id));
        MessageHandle(id)
    }
    fn update_message_content(&self, handle: MessageHandle, text: &str) {
        self.record(UiEvent::Update(handle.0, text.into()));
    }
    fn user_input(&self) -> String {
        self.input.lock().unwrap().clone()
    }
    fn clear_user_input(&self) {
        self.input.lock().unwrap().clear();
        self.record(UiEvent::InputCleared);
    }
}

/// Canned tool backend that counts calls.
#[derive(Default)]
pub struct MockBackend {
    pub pages: HashMap<String, String>,
    pub results: Vec<SearchResult>,
    pub answer: Value,
    pub fail_with: Option<String>,
    search_calls: AtomicUsize,
    read_calls: AtomicUsize,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, content: impl Into<String>) -> Self {
        self.pages.insert(url.to_string(), content.into());
        self
    }

    pub fn with_results(mut self, results: Vec<SearchResult>) -> Self {
        self.results = results;
        self
    }

    pub fn failing(mut self, message: &str) -> Self {
        self.fail_with = Some(message.to_string());
        self
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn read_calls(&self) -> usize {
        self.read_calls.load(Ordering::SeqCst)
    }

    fn check_failure(&self) -> Result<(), ToolError> {
        match &self.fail_with {
            Some(message) => Err(ToolError::ExecutionFailed(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ToolBackend for MockBackend {
    async fn web_search(
        &self,
        _query: &str,
        _engine: SearchEngine,
        on_result: &(dyn for<'r> Fn(&'r SearchResult) + Send + Sync),
    ) -> Result<Vec<SearchResult>, ToolError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        for r in &self.results {
            on_result(r);
        }
        Ok(self.results.clone())
    }

    async fn read_url(&self, url: &str) -> Result<String, ToolError> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| ToolError::ExecutionFailed(format!("HTTP error: 404 Not Found ({url})")))
    }

    async fn instant_answer(&self, _query: &str) -> Result<Value, ToolError> {
        self.check_failure()?;
        Ok(self.answer.clone())
    }
}

/// Shorthand for a search result.
pub fn result(n: usize) -> SearchResult {
    SearchResult {
        title: format!("Result {n}"),
        url: format!("https://site{n}.example/page"),
        snippet: format!("Snippet {n}"),
    }
}
