//! Chat message builders for each generation operation.
//!
//! Every builder is a pure function of its request. The sequence always opens with
//! a fixed system message, adds one user message per populated field in declaration
//! order, and closes with an instruction message. For structured operations that
//! last message embeds a worked example serialized from real model values, so the
//! example cannot drift from what the parser decodes into.

use crate::models::{
    AnswerType, Form, FormGenerationRequest, FormImprovementRequest, Message,
    MultipleQuestionGenerationRequest, Question, QuestionAnalysis, QuestionGenerationRequest,
    QuestionImprovementRequest, SurveyAnalysisRequest, SurveyInfo,
};
use serde::Serialize;

pub const SYSTEM_PROMPT: &str = "You are a helpful assistant for creating google forms.";

pub const ANALYSIS_SYSTEM_PROMPT: &str =
    "You are an experienced survey analyst. You read aggregated survey results and explain \
     what they reveal about the respondents.";

const JSON_ONLY: &str = "Return ONLY JSON without any explanations.";

pub fn build_create_form_messages(request: &FormGenerationRequest) -> Vec<Message> {
    let mut messages = vec![
        Message::system(SYSTEM_PROMPT),
        Message::user(format!("Create a form on the topic: {}", request.topic)),
    ];
    if let Some(count) = request.questions_count {
        messages.push(Message::user(format!("Make {} questions", count)));
    }
    if let Some(audience) = present(&request.target_audience) {
        messages.push(Message::user(format!("Target audience: {}", audience)));
    }
    messages.push(json_instruction(&example_form()));
    messages
}

pub fn build_improve_form_messages(request: &FormImprovementRequest) -> Vec<Message> {
    let mut messages = vec![Message::system(SYSTEM_PROMPT)];
    if let Some(prompt) = present(&request.prompt) {
        messages.push(Message::user(format!("Improvement instructions: {}", prompt)));
    }
    messages.push(Message::user(format!(
        "Improve the following form: {}",
        to_json(&request.form)
    )));
    messages.push(json_instruction(&example_form()));
    messages
}

pub fn build_generate_question_messages(request: &QuestionGenerationRequest) -> Vec<Message> {
    let mut messages = vec![
        Message::system(SYSTEM_PROMPT),
        Message::user(format!(
            "Create a survey question on the topic: {}",
            request.topic
        )),
    ];
    if let Some(audience) = present(&request.target_audience) {
        messages.push(Message::user(format!("Target audience: {}", audience)));
    }
    messages.push(json_instruction(&example_choice_question()));
    messages
}

pub fn build_generate_multiple_questions_messages(
    request: &MultipleQuestionGenerationRequest,
) -> Vec<Message> {
    let mut messages = vec![Message::system(SYSTEM_PROMPT)];
    if let Some(topic) = present(&request.topic) {
        messages.push(Message::user(format!(
            "Create survey questions on the topic: {}",
            topic
        )));
    }
    if let Some(audience) = present(&request.target_audience) {
        messages.push(Message::user(format!("Target audience: {}", audience)));
    }
    messages.push(Message::user(format!(
        "Make {} questions",
        request.questions_count
    )));
    if let Some(previous) = request
        .previous_questions
        .as_ref()
        .filter(|questions| !questions.is_empty())
    {
        messages.push(Message::user(format!(
            "The survey already contains these questions, do not repeat them: {}",
            to_json(previous)
        )));
    }
    messages.push(json_instruction(&vec![
        example_choice_question(),
        example_text_question(),
    ]));
    messages
}

pub fn build_improve_question_messages(request: &QuestionImprovementRequest) -> Vec<Message> {
    let mut messages = vec![
        Message::system(SYSTEM_PROMPT),
        Message::user(format!(
            "Improve the following survey question: {}",
            request.text
        )),
    ];
    if let Some(answer_type) = request.answer_type {
        messages.push(Message::user(format!("Answer type: {}", answer_type)));
    }
    if let Some(options) = request
        .answer_options
        .as_ref()
        .filter(|options| !options.is_empty())
    {
        messages.push(Message::user(format!("Answer options: {}", to_json(options))));
    }
    if let Some(prompt) = present(&request.prompt) {
        messages.push(Message::user(format!("Improvement instructions: {}", prompt)));
    }
    messages.push(json_instruction(&example_choice_question()));
    messages
}

/// Build the free-text analysis conversation. The reply is prose, so the closing
/// message asks for plain text instead of JSON.
pub fn build_analysis_messages(request: &SurveyAnalysisRequest) -> Vec<Message> {
    let mut messages = vec![
        Message::system(ANALYSIS_SYSTEM_PROMPT),
        Message::user(describe_survey(&request.survey)),
    ];
    messages.extend(
        request
            .questions
            .iter()
            .enumerate()
            .map(|(index, question)| Message::user(describe_question(index + 1, question))),
    );
    messages.push(Message::user(
        "Write an analysis of these results: the main findings, notable patterns and \
         recommendations. Answer in plain prose without JSON or markdown.",
    ));
    messages
}

fn describe_survey(survey: &SurveyInfo) -> String {
    let mut summary = format!("Survey: {}.", survey.title);
    if let Some(description) = present(&survey.description) {
        summary.push_str(&format!(" Description: {}.", description));
    }
    summary.push_str(&format!(
        " Total respondents: {}, completed: {}, not completed: {}.",
        survey.total_respondents, survey.completed_count, survey.incompleted_count
    ));
    summary
}

fn describe_question(number: usize, question: &QuestionAnalysis) -> String {
    let mut text = format!(
        "Question {}: {} (type: {}, answers: {}).",
        number, question.question_text, question.question_type, question.total_answers
    );
    if let Some(options) = question.options.as_ref().filter(|o| !o.is_empty()) {
        text.push_str(&format!(" Options: {}.", to_json(options)));
    }
    if let Some(statistics) = &question.statistics {
        text.push_str(&format!(" Statistics: {}", to_json(statistics)));
    }
    text
}

fn json_instruction<T: Serialize>(example: &T) -> Message {
    let allowed = AnswerType::ALL
        .iter()
        .map(AnswerType::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    Message::user(format!(
        "Reply in JSON format. EXAMPLE RESPONSE: {} Allowed answer_type values: {}. {}",
        to_json(example),
        allowed,
        JSON_ONLY
    ))
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_default()
}

fn example_choice_question() -> Question {
    Question {
        text: "Question".to_string(),
        answer_type: AnswerType::MultipleChoice,
        answer_options: Some(vec!["Answer 1".to_string(), "Answer 2".to_string()]),
    }
}

fn example_text_question() -> Question {
    Question {
        text: "Question".to_string(),
        answer_type: AnswerType::Text,
        answer_options: None,
    }
}

fn example_form() -> Form {
    Form {
        title: "Form title".to_string(),
        questions: vec![
            example_choice_question(),
            Question {
                text: "Question".to_string(),
                answer_type: AnswerType::SingleChoice,
                answer_options: Some(vec!["Answer 1".to_string()]),
            },
        ],
    }
}
