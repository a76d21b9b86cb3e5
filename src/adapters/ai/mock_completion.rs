//! Mock completion service for testing.
//!
//! # Features
//!
//! - Pre-configured responses, consumed in order
//! - Error injection
//! - Call tracking for verification

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{
    CompletionError, CompletionRequest, CompletionResponse, CompletionService, FinishReason,
    ProviderInfo, TokenUsage,
};

/// A configured mock response.
#[derive(Debug, Clone)]
pub enum MockResponse {
    Success(String),
    Error(CompletionError),
}

/// Completion service that replays queued responses.
#[derive(Debug, Clone)]
pub struct MockCompletionService {
    responses: Arc<Mutex<VecDeque<MockResponse>>>,
    /// Reply once the queue is empty.
    default_reply: String,
    delay: Duration,
    calls: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl Default for MockCompletionService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCompletionService {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            default_reply: "Thanks for your question! An agent will follow up shortly.".to_string(),
            delay: Duration::ZERO,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_response(self, content: impl Into<String>) -> Self {
        self.push(MockResponse::Success(content.into()));
        self
    }

    pub fn with_error(self, error: CompletionError) -> Self {
        self.push(MockResponse::Error(error));
        self
    }

    pub fn with_default_reply(mut self, reply: impl Into<String>) -> Self {
        self.default_reply = reply.into();
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Queues a response on a shared instance.
    pub fn push(&self, response: MockResponse) {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(response);
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn calls(&self) -> Vec<CompletionRequest> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn next_response(&self) -> MockResponse {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| MockResponse::Success(self.default_reply.clone()))
    }
}

#[async_trait]
impl CompletionService for MockCompletionService {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, CompletionError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        match self.next_response() {
            MockResponse::Success(content) => Ok(CompletionResponse {
                usage: TokenUsage::new(10, (content.len() / 4) as u32),
                content,
                model: "mock-model".to_string(),
                finish_reason: FinishReason::Stop,
            }),
            MockResponse::Error(err) => Err(err),
        }
    }

    fn provider_info(&self) -> ProviderInfo {
        ProviderInfo::new("mock", "mock-model")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{LeadId, TenantId};
    use crate::ports::{MessageRole, RequestMetadata};

    fn request(text: &str) -> CompletionRequest {
        CompletionRequest::new(RequestMetadata::new(TenantId::new(), LeadId::new(), "t"))
            .with_message(MessageRole::User, text)
    }

    #[tokio::test]
    async fn replays_queue_then_default() {
        let mock = MockCompletionService::new()
            .with_response("first")
            .with_error(CompletionError::unavailable("down"))
            .with_default_reply("fallback");

        assert_eq!(mock.complete(request("a")).await.unwrap().content, "first");
        assert!(mock.complete(request("b")).await.is_err());
        assert_eq!(mock.complete(request("c")).await.unwrap().content, "fallback");
        assert_eq!(mock.call_count(), 3);
        assert_eq!(mock.calls()[1].last_user_message(), Some("b"));
    }

    #[tokio::test]
    async fn clones_share_state() {
        let mock = MockCompletionService::new();
        let clone = mock.clone();
        clone.push(MockResponse::Success("shared".into()));
        assert_eq!(mock.complete(request("x")).await.unwrap().content, "shared");
        assert_eq!(clone.call_count(), 1);
    }
}
