//! Question schemas and the requests that produce or rework a question.

use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;
use validator::Validate;

/// How a question is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AnswerType {
    MultipleChoice,
    SingleChoice,
    Numeric,
    Text,
}

impl AnswerType {
    pub const ALL: [AnswerType; 4] = [
        AnswerType::MultipleChoice,
        AnswerType::SingleChoice,
        AnswerType::Numeric,
        AnswerType::Text,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnswerType::MultipleChoice => "multiple_choice",
            AnswerType::SingleChoice => "single_choice",
            AnswerType::Numeric => "numeric",
            AnswerType::Text => "text",
        }
    }
}

impl fmt::Display for AnswerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A survey question.
///
/// `answer_options` only carries meaning for choice types; the schema does not
/// enforce that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct Question {
    #[validate(length(min = 1, message = "Question text cannot be empty"))]
    #[schema(example = "How often do you exercise?")]
    pub text: String,

    pub answer_type: AnswerType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer_options: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct QuestionGenerationRequest {
    #[validate(length(min = 1, message = "Topic is required"))]
    #[schema(example = "science")]
    pub topic: String,

    pub target_audience: Option<String>,
}

fn default_questions_count() -> u32 {
    1
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct MultipleQuestionGenerationRequest {
    pub topic: Option<String>,

    pub target_audience: Option<String>,

    #[serde(default = "default_questions_count")]
    #[validate(range(min = 1, max = 10, message = "Questions count must be between 1 and 10"))]
    #[schema(example = 3, minimum = 1, maximum = 10)]
    pub questions_count: u32,

    /// Questions already in the survey, so the model does not repeat them.
    pub previous_questions: Option<Vec<Question>>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct QuestionImprovementRequest {
    #[validate(length(min = 1, message = "Question text is required"))]
    pub text: String,

    pub answer_type: Option<AnswerType>,

    pub answer_options: Option<Vec<String>>,

    /// Free-form instruction describing the desired change.
    pub prompt: Option<String>,
}
