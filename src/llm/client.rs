//! Core LLM client trait and a scripted mock implementation

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::error::Result;
use crate::llm::types::{CompletionRequest, CompletionResponse};

/// Stateless LLM client - each call is independent (fresh context)
///
/// Implementations are shared across scraper tasks, so they must be safe
/// for concurrent invocation.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Single completion request (blocking until complete)
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Model identifier used by default for requests
    fn model(&self) -> &str;

    /// Whether the client has what it needs to make calls
    fn is_ready(&self) -> bool;
}

type Handler = dyn Fn(&CompletionRequest) -> Result<CompletionResponse> + Send + Sync;

/// Mock client whose responses are computed from the request.
///
/// Concurrent runs issue calls in no particular order, so responses are
/// derived from the request (forced tool, last message) rather than
/// popped from a queue.
pub struct MockLlmClient {
    handler: Arc<Handler>,
    calls: AtomicUsize,
}

impl MockLlmClient {
    /// Create a mock that answers every request with the handler's result
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&CompletionRequest) -> Result<CompletionResponse> + Send + Sync + 'static,
    {
        Self {
            handler: Arc::new(handler),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of completed calls so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.handler)(&request)
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    fn is_ready(&self) -> bool {
        true
    }
}

impl std::fmt::Debug for MockLlmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockLlmClient")
            .field("calls", &self.call_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CrawlerError;
    use crate::llm::types::Message;

    #[tokio::test]
    async fn test_mock_answers_from_request() {
        let mock = MockLlmClient::new(|req| {
            let last = req.messages.last().map(|m| m.content.clone()).unwrap_or_default();
            Ok(CompletionResponse::text(format!("echo: {}", last)))
        });

        let response = mock
            .complete(CompletionRequest::new(vec![Message::user("hello")]))
            .await
            .unwrap();

        assert_eq!(response.content, "echo: hello");
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_propagates_errors() {
        let mock = MockLlmClient::new(|_| Err(CrawlerError::Llm("boom".to_string())));
        let result = mock.complete(CompletionRequest::default()).await;
        assert!(matches!(result, Err(CrawlerError::Llm(_))));
        assert_eq!(mock.call_count(), 1);
    }

    #[test]
    fn test_mock_identity() {
        let mock = MockLlmClient::new(|_| Ok(CompletionResponse::default()));
        assert!(mock.is_ready());
        assert_eq!(mock.model(), "mock-model");
    }

    #[test]
    fn test_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MockLlmClient>();
    }
}
