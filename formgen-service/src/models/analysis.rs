//! Survey result summaries submitted for free-text analysis.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct SurveyAnalysisRequest {
    #[validate(nested)]
    pub survey: SurveyInfo,

    pub questions: Vec<QuestionAnalysis>,
}

/// Survey-level counters.
///
/// The three counts are independent inputs; nothing guarantees
/// `completed + incompleted == total`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SurveyInfo {
    #[validate(length(min = 1, message = "Survey title is required"))]
    pub title: String,

    pub description: Option<String>,

    pub total_respondents: u32,

    pub completed_count: u32,

    pub incompleted_count: u32,
}

impl SurveyInfo {
    pub fn counts_consistent(&self) -> bool {
        u64::from(self.completed_count) + u64::from(self.incompleted_count)
            == u64::from(self.total_respondents)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionAnalysis {
    pub question_text: String,

    pub question_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,

    #[serde(default)]
    pub total_answers: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object, nullable)]
    pub statistics: Option<QuestionStatistics>,
}

/// Per-question aggregate, shaped by the question type.
///
/// Any other JSON object is carried through as-is. Scalars and arrays are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuestionStatistics {
    Choice(ChoiceStats),
    Scale(ScaleStats),
    Text(TextStats),
    Other(serde_json::Map<String, serde_json::Value>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceStats {
    pub options: Vec<String>,
    pub counts: Vec<u32>,
    pub percentages: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleStats {
    pub min: i64,
    pub max: i64,
    pub average: f64,
    pub distribution: Vec<u32>,
    pub median: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStats {
    pub total_answers: u32,
    pub word_cloud: Vec<String>,
    pub sample_answers: Vec<String>,
}
