//! Scripted chat provider for testing.

use super::{ChatProvider, ProviderError};
use crate::models::Message;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Mock chat provider that replays a fixed script of replies.
///
/// Replies are handed out in order; once the script runs out the last entry keeps
/// being returned. Every call is counted and the most recent conversation kept,
/// so tests can assert on retries and prompt contents.
pub struct MockChatProvider {
    script: Mutex<Vec<Result<String, ProviderError>>>,
    fallback: Mutex<Option<Result<String, ProviderError>>>,
    calls: AtomicUsize,
    last_messages: Mutex<Vec<Message>>,
    delay: Option<Duration>,
    healthy: bool,
}

impl MockChatProvider {
    pub fn with_responses(responses: Vec<Result<String, ProviderError>>) -> Self {
        let mut script = responses;
        script.reverse();
        Self {
            script: Mutex::new(script),
            fallback: Mutex::new(None),
            calls: AtomicUsize::new(0),
            last_messages: Mutex::new(Vec::new()),
            delay: None,
            healthy: true,
        }
    }

    /// Provider that returns the same text on every call.
    pub fn repeating(text: impl Into<String>) -> Self {
        Self::with_responses(vec![Ok(text.into())])
    }

    /// Provider whose every call fails with the given error.
    pub fn failing(error: ProviderError) -> Self {
        Self::with_responses(vec![Err(error)])
    }

    /// Sleep before answering, for exercising request timeouts.
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn unhealthy(mut self) -> Self {
        self.healthy = false;
        self
    }

    /// Number of `complete` calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Messages sent on the most recent call.
    pub fn last_messages(&self) -> Vec<Message> {
        self.last_messages
            .lock()
            .map(|messages| messages.clone())
            .unwrap_or_default()
    }

    fn next_reply(&self) -> Result<String, ProviderError> {
        let mut script = match self.script.lock() {
            Ok(script) => script,
            Err(poisoned) => poisoned.into_inner(),
        };
        let mut fallback = match self.fallback.lock() {
            Ok(fallback) => fallback,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(reply) = script.pop() {
            if script.is_empty() {
                *fallback = Some(reply.clone());
            }
            return reply;
        }

        fallback
            .clone()
            .unwrap_or(Err(ProviderError::EmptyResponse))
    }
}

#[async_trait]
impl ChatProvider for MockChatProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn complete(&self, messages: &[Message], _model: &str) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_messages.lock() {
            *last = messages.to_vec();
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.next_reply()
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        if self.healthy {
            Ok(())
        } else {
            Err(ProviderError::NotConfigured(
                "Mock chat provider not healthy".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_script_replayed_then_last_repeats() {
        let provider = MockChatProvider::with_responses(vec![
            Ok("first".to_string()),
            Ok("second".to_string()),
        ]);
        let messages = [Message::user("q")];

        assert_eq!(provider.complete(&messages, "m").await.unwrap(), "first");
        assert_eq!(provider.complete(&messages, "m").await.unwrap(), "second");
        assert_eq!(provider.complete(&messages, "m").await.unwrap(), "second");
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn test_failing_repeats_error() {
        let provider = MockChatProvider::failing(ProviderError::RateLimited);
        let messages = [Message::user("q")];

        for _ in 0..2 {
            assert!(matches!(
                provider.complete(&messages, "m").await,
                Err(ProviderError::RateLimited)
            ));
        }
    }

    #[tokio::test]
    async fn test_records_last_messages() {
        let provider = MockChatProvider::repeating("{}");
        provider
            .complete(&[Message::system("s"), Message::user("u")], "m")
            .await
            .unwrap();

        let last = provider.last_messages();
        assert_eq!(last.len(), 2);
        assert_eq!(last[1].content, "u");
    }
}
