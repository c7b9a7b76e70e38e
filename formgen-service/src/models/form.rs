//! Form schema and the requests that generate or improve a whole form.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::Question;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct Form {
    #[validate(length(min = 1, message = "Form title cannot be empty"))]
    #[schema(example = "Customer satisfaction")]
    pub title: String,

    #[validate(nested)]
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct FormGenerationRequest {
    #[validate(length(min = 1, message = "Topic is required"))]
    #[schema(example = "Remote work habits")]
    pub topic: String,

    #[validate(range(min = 1, max = 20, message = "Questions count must be between 1 and 20"))]
    #[schema(example = 5, minimum = 1, maximum = 20)]
    pub questions_count: Option<u32>,

    #[schema(example = "Software engineers")]
    pub target_audience: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct FormImprovementRequest {
    /// Free-form instruction describing the desired change.
    pub prompt: Option<String>,

    #[validate(nested)]
    pub form: Form,
}
