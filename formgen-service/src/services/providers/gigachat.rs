//! GigaChat provider implementation.
//!
//! Talks to the GigaChat REST API: an OAuth exchange turns the configured
//! authorization key into a short-lived bearer token, which is cached and reused
//! for `/chat/completions` calls until shortly before it expires.

use super::{ChatProvider, ProviderError};
use crate::config::GigaChatConfig;
use crate::models::Message;
use crate::services::metrics;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;
use uuid::Uuid;

/// Tokens this close to expiry are refreshed before use.
const TOKEN_REFRESH_MARGIN_MS: i64 = 60_000;

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    expires_at_ms: i64,
}

impl AccessToken {
    fn is_fresh(&self, now_ms: i64) -> bool {
        self.expires_at_ms - TOKEN_REFRESH_MARGIN_MS > now_ms
    }
}

/// GigaChat chat provider.
pub struct GigaChatProvider {
    config: GigaChatConfig,
    client: Client,
    token: Mutex<Option<AccessToken>>,
}

impl GigaChatProvider {
    pub fn new(config: GigaChatConfig, timeout: Duration) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()
            .map_err(|e| {
                ProviderError::NotConfigured(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            config,
            client,
            token: Mutex::new(None),
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/{}", self.config.api_base_url.trim_end_matches('/'), path)
    }

    fn credentials(&self) -> Result<&str, ProviderError> {
        self.config
            .credentials
            .as_deref()
            .filter(|c| !c.is_empty())
            .ok_or_else(|| {
                ProviderError::NotConfigured("GigaChat credentials not configured".to_string())
            })
    }

    /// Return a valid bearer token, running the OAuth exchange when the cached one
    /// is missing or about to expire.
    async fn access_token(&self) -> Result<String, ProviderError> {
        let credentials = self.credentials()?;

        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.is_fresh(now_millis()) {
                return Ok(token.value.clone());
            }
        }

        tracing::debug!(scope = %self.config.scope, "Requesting GigaChat access token");

        let response = self
            .client
            .post(&self.config.auth_url)
            .header(AUTHORIZATION, format!("Basic {}", credentials))
            .header("RqUID", Uuid::new_v4().to_string())
            .header(ACCEPT, "application/json")
            .form(&[("scope", self.config.scope.as_str())])
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(status_error(status, "OAuth", error_text));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Auth(format!("Failed to parse token response: {}", e)))?;

        *cached = Some(AccessToken {
            value: token.access_token.clone(),
            expires_at_ms: token.expires_at,
        });

        Ok(token.access_token)
    }

    async fn invalidate_token(&self) {
        *self.token.lock().await = None;
    }
}

#[async_trait]
impl ChatProvider for GigaChatProvider {
    fn name(&self) -> &'static str {
        "gigachat"
    }

    async fn complete(&self, messages: &[Message], model: &str) -> Result<String, ProviderError> {
        let token = self.access_token().await?;

        let request = ChatCompletionRequest { model, messages };

        tracing::debug!(
            model = %model,
            message_count = messages.len(),
            "Sending request to GigaChat API"
        );

        let response = self
            .client
            .post(self.api_url("chat/completions"))
            .bearer_auth(&token)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            if status == StatusCode::UNAUTHORIZED {
                self.invalidate_token().await;
            }
            return Err(status_error(status, "chat", error_text));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ApiError(format!("Failed to parse response: {}", e)))?;

        if let Some(usage) = &completion.usage {
            metrics::record_tokens(model, usage.prompt_tokens, usage.completion_tokens);
        }

        completion.into_content()
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        let token = self.access_token().await?;

        let response = self
            .client
            .get(self.api_url("models"))
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(ProviderError::ApiError(format!(
                "Health check failed: {}",
                response.status()
            )))
        }
    }
}

fn status_error(status: StatusCode, call: &str, body: String) -> ProviderError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::Auth(format!(
            "GigaChat {} rejected credentials ({}): {}",
            call, status, body
        )),
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited,
        _ => ProviderError::ApiError(format!("GigaChat {} error {}: {}", call, status, body)),
    }
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

// ============================================================================
// GigaChat API Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    /// Expiry as unix milliseconds.
    expires_at: i64,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

impl ChatCompletionResponse {
    fn into_content(self) -> Result<String, ProviderError> {
        self.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or(ProviderError::EmptyResponse)
    }
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize, Default)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}
