//! Chat completion provider abstractions and implementations.
//!
//! The generation service talks to the LLM only through [`ChatProvider`], so the
//! GigaChat backend can be swapped for the scripted mock in tests.

pub mod gigachat;
pub mod mock;

use crate::models::Message;
use async_trait::async_trait;
use thiserror::Error;

/// Error type for provider operations.
///
/// Every variant means the upstream could not produce text; none of them are
/// decode problems.
#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Response contained no choices")]
    EmptyResponse,

    #[error("Request timed out after {0}s")]
    Timeout(u64),
}

impl ProviderError {
    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::NotConfigured(_) => "not_configured",
            ProviderError::Auth(_) => "auth",
            ProviderError::RateLimited => "rate_limited",
            ProviderError::ApiError(_) => "api",
            ProviderError::NetworkError(_) => "network",
            ProviderError::EmptyResponse => "empty_response",
            ProviderError::Timeout(_) => "timeout",
        }
    }
}

/// Trait for chat completion backends (e.g., GigaChat).
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Provider name used in logs and metrics.
    fn name(&self) -> &'static str;

    /// Send the conversation and return the first choice's text unmodified.
    async fn complete(&self, messages: &[Message], model: &str) -> Result<String, ProviderError>;

    /// Health check.
    async fn health_check(&self) -> Result<(), ProviderError>;
}
