//! Test helpers for formgen-service integration tests.
//!
//! The application runs on a random port with a scripted chat provider, so no
//! network access or GigaChat credentials are needed.

#![allow(dead_code)]

use formgen_service::config::{FormgenConfig, GigaChatConfig, LlmConfig};
use formgen_service::services::metrics;
use formgen_service::services::providers::mock::MockChatProvider;
use formgen_service::startup::Application;
use service_core::config::Config;
use std::sync::Arc;
use std::time::Duration;

pub const QUESTION_JSON: &str =
    r#"{"text": "How often do you exercise?", "answer_type": "single_choice", "answer_options": ["Daily", "Weekly", "Rarely"]}"#;

pub const FORM_JSON: &str = r#"{"title": "Fitness habits", "questions": [
    {"text": "How often do you exercise?", "answer_type": "single_choice", "answer_options": ["Daily", "Weekly"]},
    {"text": "What motivates you?", "answer_type": "text"}
]}"#;

pub struct TestApp {
    pub address: String,
    pub provider: Arc<MockChatProvider>,
    client: reqwest::Client,
}

impl TestApp {
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    pub async fn post_json(&self, path: &str, body: &serde_json::Value) -> reqwest::Response {
        self.client
            .post(format!("{}{}", self.address, path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn post_raw(&self, path: &str, body: &'static str) -> reqwest::Response {
        self.client
            .post(format!("{}{}", self.address, path))
            .header("content-type", "application/json")
            .body(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{}", self.address, path))
            .send()
            .await
            .expect("Failed to execute request")
    }
}

pub fn test_config() -> FormgenConfig {
    FormgenConfig {
        common: Config {
            port: 0,
            log_level: "debug".to_string(),
        },
        llm: LlmConfig {
            request_timeout_secs: 5,
            ..LlmConfig::default()
        },
        gigachat: GigaChatConfig::default(),
        swagger_enabled: true,
        otlp_endpoint: None,
    }
}

pub async fn spawn_app(provider: MockChatProvider) -> TestApp {
    spawn_app_with_config(provider, test_config()).await
}

pub async fn spawn_app_with_config(provider: MockChatProvider, config: FormgenConfig) -> TestApp {
    metrics::init_metrics();

    let provider = Arc::new(provider);
    let app = Application::build_with_provider(config, provider.clone())
        .await
        .expect("Failed to build application");
    let port = app.port();

    tokio::spawn(async move {
        let _ = app.run_until_stopped().await;
    });

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .expect("Failed to build client");

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        provider,
        client,
    }
}
