//! Mock LLM provider for offline runs and tests.
//!
//! Echo mode answers with the first line of the prompt's `Context:` block,
//! which keeps the answer grounded in what was retrieved without a model.

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use inquiry_core::{AppError, AppResult};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

const CONTEXT_MARKER: &str = "Context:";

#[derive(Debug, Clone)]
enum Behavior {
    Echo,
    Reply(String),
    Fail(String),
}

/// Deterministic [`LlmClient`] with a call counter.
#[derive(Debug)]
pub struct MockLlmClient {
    behavior: Behavior,
    delay: Option<Duration>,
    calls: AtomicUsize,
    last_request: Mutex<Option<LlmRequest>>,
}

impl MockLlmClient {
    fn with_behavior(behavior: Behavior) -> Self {
        Self {
            behavior,
            delay: None,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Answer with the first context line of the prompt.
    pub fn echo() -> Self {
        Self::with_behavior(Behavior::Echo)
    }

    /// Always answer with `reply`.
    pub fn reply(reply: impl Into<String>) -> Self {
        Self::with_behavior(Behavior::Reply(reply.into()))
    }

    /// Always fail with a provider error carrying `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_behavior(Behavior::Fail(message.into()))
    }

    /// Sleep before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of completions requested so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The most recent request, if any.
    pub fn last_request(&self) -> Option<LlmRequest> {
        self.last_request
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    fn echo_answer(request: &LlmRequest) -> String {
        let system = request.system_text().unwrap_or_default();
        let context_line = system
            .split_once(CONTEXT_MARKER)
            .and_then(|(_, rest)| rest.lines().map(str::trim).find(|l| !l.is_empty()));

        match context_line {
            Some(line) => format!("According to the provided context: {line}"),
            None => "I do not know based on the provided context.".to_string(),
        }
    }
}

#[async_trait::async_trait]
impl LlmClient for MockLlmClient {
    fn provider_name(&self) -> &str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_request.lock() {
            *last = Some(request.clone());
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let content = match &self.behavior {
            Behavior::Echo => Self::echo_answer(request),
            Behavior::Reply(reply) => reply.clone(),
            Behavior::Fail(message) => return Err(AppError::Provider(message.clone())),
        };

        Ok(LlmResponse {
            content,
            model: "mock".to_string(),
            usage: LlmUsage::default(),
        })
    }
}
