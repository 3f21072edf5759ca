mod common;

use common::{solid_png, TestApp};
use leaf_service::services::providers::{MockProvider, Part, ProviderError};
use serde_json::{json, Value};

#[tokio::test]
async fn analyze_returns_metrics_analysis_and_token() {
    let app = TestApp::spawn().await;

    let response = app.upload(solid_png(32, 32, [255, 255, 0])).await;
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert!(uuid::Uuid::parse_str(body["upload_id"].as_str().unwrap()).is_ok());
    assert_eq!(body["yellow_spots"], 100.0);
    assert_eq!(body["brown_spots"], 0.0);
    assert_eq!(body["solidity"], 100.0);
    assert_eq!(body["plant"], "Tomato");
    assert_eq!(body["suggestion"], "Remove yellowing leaves.\nWater at the base.");
    assert_eq!(body["thresholds"]["solidity_min"], 90.0);
    assert_eq!(body["analysis_source"], "model");

    let requests = app.provider.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].model, "gemini-2.0-flash");
    assert!(requests[0].prompt_text().contains("- Yellow spots: 100%"));
    assert!(requests[0].parts.iter().any(|part| matches!(
        part,
        Part::Image { mime_type, .. } if mime_type == "image/png"
    )));

    let stored: Vec<_> = std::fs::read_dir(&app.upload_dir).unwrap().collect();
    assert_eq!(stored.len(), 1);
}

#[tokio::test]
async fn analyze_falls_back_when_model_fails() {
    let app = TestApp::spawn_with(MockProvider::failing(ProviderError::NetworkError(
        "connection refused".to_string(),
    )))
    .await;

    let response = app.upload(solid_png(8, 8, [0, 0, 0])).await;
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["plant"], "Unknown Plant");
    assert_eq!(body["suggestion"], "Could not analyze properly.");
    assert_eq!(
        body["thresholds"],
        json!({"yellow_max": 10.0, "brown_max": 5.0, "solidity_min": 85.0})
    );
    assert_eq!(body["analysis_source"], "fallback");
    assert_eq!(body["solidity"], 0.0);
}

#[tokio::test]
async fn analyze_without_file_is_bad_request() {
    let app = TestApp::spawn().await;

    let form = reqwest::multipart::Form::new().text("note", "no image here");
    let response = app
        .client
        .post(app.url("/analyze"))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "bad_request");
    assert_eq!(body["error"], "No file uploaded");
}

#[tokio::test]
async fn undecodable_upload_is_invalid_image() {
    let app = TestApp::spawn().await;

    let response = app.upload(b"not an image at all".to_vec()).await;

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "invalid_image");
    assert!(app.provider.requests().is_empty());
}

#[tokio::test]
async fn correct_plant_before_analyze_is_missing_state() {
    let app = TestApp::spawn().await;

    let response = app.post_json("/correct-plant", &json!({"plant": "Tomato"})).await;
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "missing_state");

    let response = app
        .post_json(
            "/correct-plant",
            &json!({"upload_id": uuid::Uuid::new_v4(), "plant": "Tomato"}),
        )
        .await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn malformed_upload_id_is_missing_state() {
    let app = TestApp::spawn().await;

    let response = app
        .post_json(
            "/correct-plant",
            &json!({"upload_id": "not-a-uuid", "plant": "Tomato"}),
        )
        .await;

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "missing_state");
    assert!(app.provider.requests().is_empty());
}

#[tokio::test]
async fn analyze_with_json_body_is_bad_request() {
    let app = TestApp::spawn().await;

    let response = app.post_json("/analyze", &json!({"file": "leaf.png"})).await;

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "bad_request");
}

#[tokio::test]
async fn correct_plant_reanalyzes_stored_image_with_override() {
    let app = TestApp::spawn().await;

    let uploaded: Value = app
        .upload(solid_png(16, 16, [255, 255, 0]))
        .await
        .json()
        .await
        .unwrap();

    let response = app
        .post_json(
            "/correct-plant",
            &json!({
                "upload_id": uploaded["upload_id"],
                "plant": "  Mango ",
                "brown_spots": 7.5
            }),
        )
        .await;
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["plant"], "Tomato");
    assert_eq!(body["analysis_source"], "model");
    assert!(body.get("upload_id").is_none());

    let requests = app.provider.requests();
    assert_eq!(requests.len(), 2);
    let prompt = requests[1].prompt_text();
    assert!(prompt.contains("The user confirms this is a Mango leaf."));
    assert!(prompt.contains("- Yellow spots: 100%"));
    assert!(prompt.contains("- Brown spots: 7.5%"));
    assert_eq!(requests[0].parts[1], requests[1].parts[1]);
}

#[tokio::test]
async fn correct_plant_rejects_overlong_name() {
    let app = TestApp::spawn().await;

    let response = app
        .post_json(
            "/correct-plant",
            &json!({"upload_id": uuid::Uuid::new_v4(), "plant": "x".repeat(101)}),
        )
        .await;

    assert_eq!(response.status(), 422);
}
