//! Scripted collaborator fakes shared by unit and integration tests.
//!
//! [`ScriptedText`] and [`ScriptedImage`] pop pre-queued replies in FIFO
//! order and record every prompt they were given. An unqueued call panics —
//! a test that triggers more generation calls than it scripted is a test
//! bug, not a runtime condition.

use std::collections::VecDeque;

use async_trait::async_trait;
use chorus_llm::{GenerateRequest, ImageProvider, ProviderResult, TextProvider};
use parking_lot::Mutex;
use serde_json::Value;

/// Scripted [`TextProvider`].
#[derive(Default)]
pub struct ScriptedText {
    text_replies: Mutex<VecDeque<ProviderResult<String>>>,
    structured_replies: Mutex<VecDeque<ProviderResult<Value>>>,
    requests: Mutex<Vec<GenerateRequest>>,
}

impl ScriptedText {
    /// A provider with nothing queued.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply for the next `generate` call.
    pub fn queue_text(&self, reply: ProviderResult<String>) {
        self.text_replies.lock().push_back(reply);
    }

    /// Queue a reply for the next `generate_structured` call.
    pub fn queue_structured(&self, reply: ProviderResult<Value>) {
        self.structured_replies.lock().push_back(reply);
    }

    /// Every request seen so far, in call order.
    #[must_use]
    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.requests.lock().clone()
    }

    /// All prompts seen so far, concatenated (for containment asserts).
    #[must_use]
    pub fn prompt_log(&self) -> String {
        self.requests
            .lock()
            .iter()
            .map(|r| r.prompt.as_str())
            .collect::<Vec<_>>()
            .join("\n---\n")
    }

    /// Number of generation calls (plain + structured) made so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl TextProvider for ScriptedText {
    async fn generate(&self, request: GenerateRequest) -> ProviderResult<String> {
        self.requests.lock().push(request);
        self.text_replies
            .lock()
            .pop_front()
            .expect("unqueued generate call")
    }

    async fn generate_structured(
        &self,
        request: GenerateRequest,
        _schema: Value,
    ) -> ProviderResult<Value> {
        self.requests.lock().push(request);
        self.structured_replies
            .lock()
            .pop_front()
            .expect("unqueued generate_structured call")
    }
}

/// Scripted [`ImageProvider`].
#[derive(Default)]
pub struct ScriptedImage {
    replies: Mutex<VecDeque<ProviderResult<String>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedImage {
    /// A provider with nothing queued.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply for the next `generate_image` call.
    pub fn queue(&self, reply: ProviderResult<String>) {
        self.replies.lock().push_back(reply);
    }

    /// All prompts seen so far.
    #[must_use]
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    /// Number of image calls made so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.prompts.lock().len()
    }
}

#[async_trait]
impl ImageProvider for ScriptedImage {
    async fn generate_image(&self, prompt: &str) -> ProviderResult<String> {
        self.prompts.lock().push(prompt.to_owned());
        self.replies
            .lock()
            .pop_front()
            .expect("unqueued generate_image call")
    }
}
