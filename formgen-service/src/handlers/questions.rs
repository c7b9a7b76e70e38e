use axum::{extract::State, Json};
use service_core::error::AppError;
use service_core::extract::ValidatedJson;

use crate::models::{
    MultipleQuestionGenerationRequest, Question, QuestionGenerationRequest,
    QuestionImprovementRequest,
};
use crate::startup::AppState;

/// Generate a single question on a topic
#[utoipa::path(
    post,
    path = "/questions/generate",
    request_body = QuestionGenerationRequest,
    responses(
        (status = 200, description = "Generated question", body = Question),
        (status = 422, description = "Request failed validation"),
        (status = 502, description = "LLM output could not be decoded"),
        (status = 503, description = "LLM provider unavailable")
    ),
    tag = "Questions"
)]
pub async fn generate_question(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<QuestionGenerationRequest>,
) -> Result<Json<Question>, AppError> {
    let question = state.generation.generate_question(&request).await?;
    Ok(Json(question))
}

/// Generate several questions, avoiding ones already in the survey
#[utoipa::path(
    post,
    path = "/questions/generate_multiple",
    request_body = MultipleQuestionGenerationRequest,
    responses(
        (status = 200, description = "Generated questions", body = [Question]),
        (status = 422, description = "Request failed validation"),
        (status = 502, description = "LLM output could not be decoded"),
        (status = 503, description = "LLM provider unavailable")
    ),
    tag = "Questions"
)]
pub async fn generate_multiple_questions(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<MultipleQuestionGenerationRequest>,
) -> Result<Json<Vec<Question>>, AppError> {
    let questions = state
        .generation
        .generate_multiple_questions(&request)
        .await?;
    Ok(Json(questions))
}

/// Rework a single question
#[utoipa::path(
    post,
    path = "/questions/improve",
    request_body = QuestionImprovementRequest,
    responses(
        (status = 200, description = "Improved question", body = Question),
        (status = 422, description = "Request failed validation"),
        (status = 502, description = "LLM output could not be decoded"),
        (status = 503, description = "LLM provider unavailable")
    ),
    tag = "Questions"
)]
pub async fn improve_question(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<QuestionImprovementRequest>,
) -> Result<Json<Question>, AppError> {
    let question = state.generation.improve_question(&request).await?;
    Ok(Json(question))
}
