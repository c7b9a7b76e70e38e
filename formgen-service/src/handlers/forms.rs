use axum::{extract::State, Json};
use service_core::error::AppError;
use service_core::extract::ValidatedJson;

use crate::models::{Form, FormGenerationRequest, FormImprovementRequest, SurveyAnalysisRequest};
use crate::startup::AppState;

/// Generate a new form on a topic
#[utoipa::path(
    post,
    path = "/forms/create",
    request_body = FormGenerationRequest,
    responses(
        (status = 200, description = "Generated form", body = Form),
        (status = 422, description = "Request failed validation"),
        (status = 502, description = "LLM output could not be decoded"),
        (status = 503, description = "LLM provider unavailable"),
        (status = 504, description = "LLM provider timed out")
    ),
    tag = "Forms"
)]
pub async fn create_form(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<FormGenerationRequest>,
) -> Result<Json<Form>, AppError> {
    let form = state.generation.create_form(&request).await?;
    Ok(Json(form))
}

/// Rework an existing form, optionally following an instruction
#[utoipa::path(
    post,
    path = "/forms/improve",
    request_body = FormImprovementRequest,
    responses(
        (status = 200, description = "Improved form", body = Form),
        (status = 422, description = "Request failed validation"),
        (status = 502, description = "LLM output could not be decoded"),
        (status = 503, description = "LLM provider unavailable")
    ),
    tag = "Forms"
)]
pub async fn improve_form(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<FormImprovementRequest>,
) -> Result<Json<Form>, AppError> {
    let form = state.generation.improve_form(&request).await?;
    Ok(Json(form))
}

/// Produce a prose analysis of aggregated survey results
#[utoipa::path(
    post,
    path = "/forms/analyze_results",
    request_body = SurveyAnalysisRequest,
    responses(
        (status = 200, description = "Analysis text", body = String),
        (status = 422, description = "Request failed validation"),
        (status = 503, description = "LLM provider unavailable")
    ),
    tag = "Forms"
)]
pub async fn analyze_results(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<SurveyAnalysisRequest>,
) -> Result<Json<String>, AppError> {
    let analysis = state.generation.analyze_results(&request).await?;
    Ok(Json(analysis))
}
