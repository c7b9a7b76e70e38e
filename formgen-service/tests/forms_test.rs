//! Integration tests for the /forms routes.

mod common;

use common::{spawn_app, FORM_JSON};
use formgen_service::services::providers::mock::MockChatProvider;
use serde_json::json;

#[tokio::test]
async fn create_form_returns_decoded_form() {
    let app = spawn_app(MockChatProvider::repeating(FORM_JSON)).await;

    let response = app
        .post_json(
            "/forms/create",
            &json!({"topic": "Fitness", "questions_count": 2, "target_audience": "Students"}),
        )
        .await;

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["title"], "Fitness habits");
    assert_eq!(body["questions"].as_array().map(Vec::len), Some(2));
    assert_eq!(body["questions"][0]["answer_type"], "single_choice");
    assert!(body["questions"][1].get("answer_options").is_none());
    assert_eq!(app.provider.calls(), 1);

    let sent = app.provider.last_messages();
    assert_eq!(sent.len(), 5);
    assert!(sent[3].content.contains("Students"));
}

#[tokio::test]
async fn create_form_accepts_single_quoted_reply() {
    let app = spawn_app(MockChatProvider::repeating(FORM_JSON.replace('"', "'"))).await;

    let response = app
        .post_json("/forms/create", &json!({"topic": "Fitness"}))
        .await;

    assert_eq!(response.status(), 200);
    assert_eq!(app.provider.calls(), 1);
}

#[tokio::test]
async fn create_form_rejects_invalid_request_before_calling_llm() {
    let app = spawn_app(MockChatProvider::repeating(FORM_JSON)).await;

    let empty_topic = app.post_json("/forms/create", &json!({"topic": ""})).await;
    assert_eq!(empty_topic.status(), 422);

    let too_many = app
        .post_json("/forms/create", &json!({"topic": "Fitness", "questions_count": 21}))
        .await;
    assert_eq!(too_many.status(), 422);

    let missing_topic = app.post_json("/forms/create", &json!({})).await;
    assert_eq!(missing_topic.status(), 422);

    let malformed = app.post_raw("/forms/create", "{\"topic\": ").await;
    assert_eq!(malformed.status(), 400);

    assert_eq!(app.provider.calls(), 0);
}

#[tokio::test]
async fn create_form_fails_with_bad_gateway_after_three_attempts() {
    let app = spawn_app(MockChatProvider::repeating("Sorry, I can't do that")).await;

    let response = app
        .post_json("/forms/create", &json!({"topic": "Fitness"}))
        .await;

    assert_eq!(response.status(), 502);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert!(body["details"]
        .as_str()
        .unwrap_or_default()
        .contains("after 3 attempts"));
    assert_eq!(app.provider.calls(), 3);
}

#[tokio::test]
async fn improve_form_returns_reworked_form() {
    let app = spawn_app(MockChatProvider::repeating(FORM_JSON)).await;

    let response = app
        .post_json(
            "/forms/improve",
            &json!({
                "prompt": "Make the questions friendlier",
                "form": {
                    "title": "Habits",
                    "questions": [{"text": "Exercise?", "answer_type": "text"}]
                }
            }),
        )
        .await;

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["title"], "Fitness habits");

    let sent = app.provider.last_messages();
    assert!(sent[1].content.contains("friendlier"));
    assert!(sent[2].content.contains("Exercise?"));
}

#[tokio::test]
async fn improve_form_validates_nested_questions() {
    let app = spawn_app(MockChatProvider::repeating(FORM_JSON)).await;

    let response = app
        .post_json(
            "/forms/improve",
            &json!({"form": {"title": "Habits", "questions": [{"text": "", "answer_type": "text"}]}}),
        )
        .await;

    assert_eq!(response.status(), 422);
    assert_eq!(app.provider.calls(), 0);
}

#[tokio::test]
async fn analyze_results_returns_text() {
    let app = spawn_app(MockChatProvider::repeating(
        "\n Respondents are mostly 'satisfied' with the service.  ",
    ))
    .await;

    let response = app
        .post_json(
            "/forms/analyze_results",
            &json!({
                "survey": {
                    "title": "Service quality",
                    "description": "Quarterly check",
                    "totalRespondents": 40,
                    "completedCount": 35,
                    "incompletedCount": 5
                },
                "questions": [{
                    "questionText": "Which plan do you use?",
                    "questionType": "single_choice",
                    "options": ["Basic", "Pro"],
                    "totalAnswers": 35,
                    "statistics": {"options": ["Basic", "Pro"], "counts": [20, 15], "percentages": [57.1, 42.9]}
                }]
            }),
        )
        .await;

    assert_eq!(response.status(), 200);
    let body: String = response.json().await.expect("Failed to parse JSON");
    assert_eq!(
        body,
        "Respondents are mostly \"satisfied\" with the service."
    );
    assert_eq!(app.provider.calls(), 1);
}

#[tokio::test]
async fn analyze_results_requires_survey_title() {
    let app = spawn_app(MockChatProvider::repeating("ok")).await;

    let response = app
        .post_json(
            "/forms/analyze_results",
            &json!({
                "survey": {"title": "", "totalRespondents": 0, "completedCount": 0, "incompletedCount": 0},
                "questions": []
            }),
        )
        .await;

    assert_eq!(response.status(), 422);
    assert_eq!(app.provider.calls(), 0);
}
