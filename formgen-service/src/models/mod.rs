//! Domain models for the formgen service.

pub mod analysis;
pub mod form;
pub mod message;
pub mod question;

pub use analysis::{
    ChoiceStats, QuestionAnalysis, QuestionStatistics, ScaleStats, SurveyAnalysisRequest,
    SurveyInfo, TextStats,
};
pub use form::{Form, FormGenerationRequest, FormImprovementRequest};
pub use message::{Message, Role};
pub use question::{
    AnswerType, MultipleQuestionGenerationRequest, Question, QuestionGenerationRequest,
    QuestionImprovementRequest,
};
