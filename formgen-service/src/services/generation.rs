//! Generation service: prompt builder, chat provider and parser composed into the
//! six form and question operations.

use crate::config::LlmConfig;
use crate::models::{
    Form, FormGenerationRequest, FormImprovementRequest, Message,
    MultipleQuestionGenerationRequest, Question, QuestionGenerationRequest,
    QuestionImprovementRequest, SurveyAnalysisRequest,
};
use crate::services::metrics;
use crate::services::parser;
use crate::services::prompts;
use crate::services::providers::{ChatProvider, ProviderError};
use serde::de::DeserializeOwned;
use service_core::error::AppError;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use validator::{Validate, ValidationErrors};

#[derive(Error, Debug)]
pub enum GenerationError {
    /// The chat provider could not produce a reply. Never retried.
    #[error("upstream unavailable: {0}")]
    Upstream(#[from] ProviderError),

    /// Every attempt produced text that did not decode into the expected shape.
    #[error("generation failed: could not extract valid structured output")]
    Decode { attempts: u32, last_error: String },
}

impl From<GenerationError> for AppError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::Upstream(ProviderError::Timeout(secs)) => AppError::GatewayTimeout(
                format!("LLM provider did not respond within {}s", secs),
            ),
            GenerationError::Upstream(e) => AppError::ServiceUnavailable(e.to_string()),
            GenerationError::Decode {
                attempts,
                last_error,
            } => AppError::BadGateway(format!(
                "could not extract valid structured output after {} attempts: {}",
                attempts, last_error
            )),
        }
    }
}

/// Stateless orchestrator shared by all request handlers.
pub struct GenerationService {
    provider: Arc<dyn ChatProvider>,
    model: String,
    max_decode_attempts: u32,
    timeout: Duration,
}

impl GenerationService {
    pub fn new(provider: Arc<dyn ChatProvider>, config: &LlmConfig) -> Self {
        Self {
            provider,
            model: config.model.clone(),
            max_decode_attempts: config.max_decode_attempts.max(1),
            timeout: config.request_timeout(),
        }
    }

    pub fn provider(&self) -> &Arc<dyn ChatProvider> {
        &self.provider
    }

    #[tracing::instrument(skip(self, request), fields(topic = %request.topic))]
    pub async fn create_form(
        &self,
        request: &FormGenerationRequest,
    ) -> Result<Form, GenerationError> {
        let messages = prompts::build_create_form_messages(request);
        self.complete_structured("create_form", &messages, Form::validate).await
    }

    #[tracing::instrument(skip(self, request), fields(title = %request.form.title))]
    pub async fn improve_form(
        &self,
        request: &FormImprovementRequest,
    ) -> Result<Form, GenerationError> {
        let messages = prompts::build_improve_form_messages(request);
        self.complete_structured("improve_form", &messages, Form::validate).await
    }

    #[tracing::instrument(skip(self, request), fields(topic = %request.topic))]
    pub async fn generate_question(
        &self,
        request: &QuestionGenerationRequest,
    ) -> Result<Question, GenerationError> {
        let messages = prompts::build_generate_question_messages(request);
        self.complete_structured("generate_question", &messages, Question::validate).await
    }

    #[tracing::instrument(skip(self, request), fields(questions_count = request.questions_count))]
    pub async fn generate_multiple_questions(
        &self,
        request: &MultipleQuestionGenerationRequest,
    ) -> Result<Vec<Question>, GenerationError> {
        let messages = prompts::build_generate_multiple_questions_messages(request);
        let questions: Vec<Question> = self
            .complete_structured(
                "generate_multiple_questions",
                &messages,
                |questions: &Vec<Question>| questions.iter().try_for_each(Question::validate),
            )
            .await?;

        if questions.len() != request.questions_count as usize {
            tracing::warn!(
                requested = request.questions_count,
                returned = questions.len(),
                "LLM returned a different number of questions than requested"
            );
        }

        Ok(questions)
    }

    #[tracing::instrument(skip(self, request))]
    pub async fn improve_question(
        &self,
        request: &QuestionImprovementRequest,
    ) -> Result<Question, GenerationError> {
        let messages = prompts::build_improve_question_messages(request);
        self.complete_structured("improve_question", &messages, Question::validate).await
    }

    /// Free-text analysis. The reply is normalized and returned without any
    /// structural decoding, so it is never retried on shape.
    #[tracing::instrument(skip(self, request), fields(survey = %request.survey.title))]
    pub async fn analyze_results(
        &self,
        request: &SurveyAnalysisRequest,
    ) -> Result<String, GenerationError> {
        let survey = &request.survey;
        if !survey.counts_consistent() {
            tracing::warn!(
                total = survey.total_respondents,
                completed = survey.completed_count,
                incompleted = survey.incompleted_count,
                "Survey counts do not add up"
            );
        }

        let messages = prompts::build_analysis_messages(request);
        let result = self
            .call_provider(&messages)
            .await
            .map(|raw| parser::normalize(&raw))
            .map_err(GenerationError::from);

        record_outcome("analyze_results", &result);
        result
    }

    /// Call the provider and decode the reply into `T`, re-asking with the same
    /// conversation until the attempt budget is spent. Provider errors end the loop
    /// immediately.
    async fn complete_structured<T, F>(
        &self,
        operation: &'static str,
        messages: &[Message],
        check: F,
    ) -> Result<T, GenerationError>
    where
        T: DeserializeOwned,
        F: Fn(&T) -> Result<(), ValidationErrors>,
    {
        let result = self.decode_loop(operation, messages, check).await;
        record_outcome(operation, &result);
        result
    }

    async fn decode_loop<T, F>(
        &self,
        operation: &'static str,
        messages: &[Message],
        check: F,
    ) -> Result<T, GenerationError>
    where
        T: DeserializeOwned,
        F: Fn(&T) -> Result<(), ValidationErrors>,
    {
        let mut last_error = String::new();

        for attempt in 1..=self.max_decode_attempts {
            let raw = self.call_provider(messages).await?;

            let decoded = parser::decode::<T>(&raw)
                .map_err(|e| e.to_string())
                .and_then(|value| check(&value).map(|_| value).map_err(|e| e.to_string()));

            match decoded {
                Ok(value) => {
                    tracing::debug!(operation, attempt, "Decoded LLM reply");
                    return Ok(value);
                }
                Err(e) => {
                    metrics::record_decode_failure(operation);
                    tracing::warn!(
                        operation,
                        attempt,
                        max_attempts = self.max_decode_attempts,
                        error = %e,
                        "LLM reply did not match the expected shape"
                    );
                    last_error = e;
                }
            }
        }

        tracing::error!(
            operation,
            attempts = self.max_decode_attempts,
            "Giving up on structured output"
        );

        Err(GenerationError::Decode {
            attempts: self.max_decode_attempts,
            last_error,
        })
    }

    async fn call_provider(&self, messages: &[Message]) -> Result<String, ProviderError> {
        let provider = self.provider.name();
        let start = Instant::now();

        let result = match tokio::time::timeout(
            self.timeout,
            self.provider.complete(messages, &self.model),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(self.timeout.as_secs())),
        };

        metrics::record_provider_latency(provider, &self.model, start.elapsed().as_secs_f64());

        if let Err(e) = &result {
            metrics::record_provider_error(provider, e.kind());
            tracing::error!(provider, model = %self.model, error = %e, "LLM provider call failed");
        }

        result
    }
}

fn record_outcome<T>(operation: &str, result: &Result<T, GenerationError>) {
    let outcome = match result {
        Ok(_) => "success",
        Err(GenerationError::Upstream(_)) => "upstream_error",
        Err(GenerationError::Decode { .. }) => "decode_error",
    };
    metrics::record_generation(operation, outcome);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AnswerType;
    use crate::services::providers::mock::MockChatProvider;
    use axum::http::StatusCode;

    const QUESTION_JSON: &str =
        r#"{"text": "How often do you exercise?", "answer_type": "single_choice", "answer_options": ["Daily", "Weekly"]}"#;

    fn service(provider: Arc<MockChatProvider>) -> GenerationService {
        GenerationService::new(provider, &LlmConfig::default())
    }

    fn question_request() -> QuestionGenerationRequest {
        QuestionGenerationRequest {
            topic: "fitness".to_string(),
            target_audience: None,
        }
    }

    #[tokio::test]
    async fn test_valid_reply_decodes_on_first_attempt() {
        let provider = Arc::new(MockChatProvider::repeating(QUESTION_JSON));
        let question = service(provider.clone())
            .generate_question(&question_request())
            .await
            .unwrap();

        assert_eq!(question.answer_type, AnswerType::SingleChoice);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_undecodable_reply_costs_exactly_three_calls() {
        let provider = Arc::new(MockChatProvider::repeating("I cannot help with that."));
        let err = service(provider.clone())
            .generate_question(&question_request())
            .await
            .unwrap_err();

        assert!(matches!(err, GenerationError::Decode { attempts: 3, .. }));
        assert_eq!(
            err.to_string(),
            "generation failed: could not extract valid structured output"
        );
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn test_retry_resends_same_conversation() {
        let provider = Arc::new(MockChatProvider::with_responses(vec![
            Ok("not json".to_string()),
            Ok(QUESTION_JSON.replace('"', "'")),
        ]));
        let service = service(provider.clone());
        let request = question_request();

        let question = service.generate_question(&request).await.unwrap();

        assert_eq!(question.text, "How often do you exercise?");
        assert_eq!(provider.calls(), 2);
        assert_eq!(
            provider.last_messages(),
            prompts::build_generate_question_messages(&request)
        );
    }

    #[tokio::test]
    async fn test_invalid_values_rejected_like_bad_shape() {
        let provider = Arc::new(MockChatProvider::with_responses(vec![
            Ok(r#"{"title": "", "questions": []}"#.to_string()),
            Ok(r#"{"title": "Habits", "questions": []}"#.to_string()),
        ]));
        let form = service(provider.clone())
            .create_form(&FormGenerationRequest {
                topic: "Habits".to_string(),
                questions_count: None,
                target_audience: None,
            })
            .await
            .unwrap();

        assert_eq!(form.title, "Habits");
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_upstream_error_not_retried() {
        let provider = Arc::new(MockChatProvider::failing(ProviderError::NetworkError(
            "connection refused".to_string(),
        )));
        let err = service(provider.clone())
            .generate_question(&question_request())
            .await
            .unwrap_err();

        assert!(matches!(err, GenerationError::Upstream(_)));
        assert_eq!(provider.calls(), 1);
        assert_eq!(
            AppError::from(err).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[tokio::test]
    async fn test_slow_provider_times_out() {
        let provider = Arc::new(
            MockChatProvider::repeating(QUESTION_JSON).delayed(Duration::from_millis(500)),
        );
        let config = LlmConfig {
            request_timeout_secs: 0,
            ..LlmConfig::default()
        };
        let service = GenerationService::new(provider.clone(), &config);

        let err = service
            .generate_question(&question_request())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            GenerationError::Upstream(ProviderError::Timeout(0))
        ));
        assert_eq!(provider.calls(), 1);
        assert_eq!(
            AppError::from(err).status_code(),
            StatusCode::GATEWAY_TIMEOUT
        );
    }

    #[tokio::test]
    async fn test_multiple_questions_returns_list() {
        let reply = format!("[{}, {}]", QUESTION_JSON, QUESTION_JSON);
        let provider = Arc::new(MockChatProvider::repeating(reply));
        let questions = service(provider)
            .generate_multiple_questions(&MultipleQuestionGenerationRequest {
                topic: Some("fitness".to_string()),
                target_audience: None,
                questions_count: 3,
                previous_questions: None,
            })
            .await
            .unwrap();

        assert_eq!(questions.len(), 2);
    }

    #[tokio::test]
    async fn test_analysis_passes_text_through() {
        let provider = Arc::new(MockChatProvider::repeating(
            "  Most respondents are 'satisfied'. {not json}\n",
        ));
        let request: SurveyAnalysisRequest = serde_json::from_str(
            r#"{
                "survey": {"title": "NPS", "totalRespondents": 5, "completedCount": 4, "incompletedCount": 3},
                "questions": []
            }"#,
        )
        .unwrap();

        let analysis = service(provider.clone())
            .analyze_results(&request)
            .await
            .unwrap();

        assert_eq!(analysis, "Most respondents are \"satisfied\". {not json}");
        assert_eq!(provider.calls(), 1);
    }

    #[test]
    fn test_decode_failure_maps_to_bad_gateway() {
        let err = GenerationError::Decode {
            attempts: 3,
            last_error: "expected value".to_string(),
        };
        let app_error = AppError::from(err);
        assert_eq!(app_error.status_code(), StatusCode::BAD_GATEWAY);
        assert!(app_error.to_string().contains("after 3 attempts"));
    }
}
