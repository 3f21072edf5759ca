mod common;

use common::TestApp;
use leaf_service::services::providers::{MockProvider, ProviderError};
use serde_json::{json, Value};

#[tokio::test]
async fn ask_returns_model_reply() {
    let app = TestApp::spawn_with(MockProvider::replying("Mulch to keep the soil moist.")).await;

    let response = app
        .post_json("/ask", &json!({"message": "How do I save water?"}))
        .await;

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["reply"], "Mulch to keep the soil moist.");

    let requests = app.provider.requests();
    assert_eq!(requests[0].model, "gemini-2.0-flash-001");
    assert!(requests[0]
        .prompt_text()
        .starts_with("You are Kalpataru, an AI farming assistant."));
    assert!(requests[0]
        .prompt_text()
        .ends_with("The user asks: How do I save water?"));
}

#[tokio::test]
async fn missing_message_is_sent_as_empty() {
    let app = TestApp::spawn_with(MockProvider::replying("Ask me anything.")).await;

    let response = app.post_json("/ask", &json!({})).await;

    assert_eq!(response.status(), 200);
    assert!(app.provider.requests()[0]
        .prompt_text()
        .ends_with("The user asks: "));
}

#[tokio::test]
async fn remote_failure_is_bad_gateway() {
    let app = TestApp::spawn_with(MockProvider::failing(ProviderError::ApiError(
        "API key not valid".to_string(),
    )))
    .await;

    let response = app.post_json("/ask", &json!({"message": "hi"})).await;

    assert_eq!(response.status(), 502);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "remote_api_error");
    assert!(body["error"].as_str().unwrap().contains("API key not valid"));
}

#[tokio::test]
async fn rate_limit_is_service_unavailable() {
    let app = TestApp::spawn_with(MockProvider::failing(ProviderError::RateLimited)).await;

    let response = app.post_json("/ask", &json!({"message": "hi"})).await;

    assert_eq!(response.status(), 503);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "rate_limited");
}

#[tokio::test]
async fn empty_model_reply_is_bad_gateway() {
    let app = TestApp::spawn_with(MockProvider::empty()).await;

    let response = app.post_json("/ask", &json!({"message": "hi"})).await;

    assert_eq!(response.status(), 502);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "empty_reply");
}

#[tokio::test]
async fn overlong_message_is_rejected() {
    let app = TestApp::spawn().await;

    let response = app
        .post_json("/ask", &json!({"message": "a".repeat(4001)}))
        .await;

    assert_eq!(response.status(), 422);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "validation_error");
    assert!(app.provider.requests().is_empty());
}

#[tokio::test]
async fn malformed_json_gets_structured_error() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(app.url("/ask"))
        .header("content-type", "application/json")
        .body("{oops")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "bad_request");
    assert!(body["error"].as_str().unwrap().contains("JSON"));
    assert!(app.provider.requests().is_empty());
}
