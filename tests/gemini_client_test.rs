use adforge::adapters::gemini::GeminiClient;
use adforge::config::settings::GeminiSettings;
use adforge::domain::image::ImagePayload;
use adforge::domain::model::{AspectRatio, CopySuggestion};
use adforge::domain::ports::GenerativeClient;
use adforge::AdForgeError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use httpmock::prelude::*;
use serde_json::json;

const IMAGE_PATH: &str = "/v1beta/models/gemini-2.5-flash-image:generateContent";
const TEXT_PATH: &str = "/v1beta/models/gemini-2.5-flash:generateContent";

fn client(server: &MockServer) -> GeminiClient {
    GeminiClient::new(&GeminiSettings {
        endpoint: server.base_url(),
        api_key: "test-key".to_string(),
        ..GeminiSettings::default()
    })
}

fn image_reply(mime: &str, bytes: &[u8]) -> serde_json::Value {
    json!({
        "candidates": [{
            "content": {
                "parts": [
                    { "text": "Here is your image." },
                    { "inlineData": { "mimeType": mime, "data": STANDARD.encode(bytes) } }
                ]
            }
        }]
    })
}

fn text_reply(text: &str) -> serde_json::Value {
    json!({ "candidates": [{ "content": { "parts": [{ "text": text }] } }] })
}

#[tokio::test]
async fn test_generate_background_sends_prompt_and_aspect_ratio() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path(IMAGE_PATH)
            .header("x-goog-api-key", "test-key")
            .body_contains("High-end professional advertising background: neon city")
            .body_contains("\"aspectRatio\":\"9:16\"");
        then.status(200).json_body(image_reply("image/jpeg", &[1, 2, 3]));
    });

    let image = client(&server)
        .generate_background("neon city", AspectRatio::Vertical9x16)
        .await
        .unwrap();

    mock.assert();
    assert_eq!(image.mime_type, "image/jpeg");
    assert_eq!(image.bytes, vec![1, 2, 3]);
    assert!(image.to_data_url().starts_with("data:image/jpeg;base64,"));
}

#[tokio::test]
async fn test_generate_background_without_image_is_an_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path(IMAGE_PATH);
        then.status(200).json_body(text_reply("I cannot draw that."));
    });

    let err = client(&server)
        .generate_background("anything", AspectRatio::Square)
        .await
        .unwrap_err();

    assert!(matches!(err, AdForgeError::GenerationError { .. }));
}

#[tokio::test]
async fn test_service_error_keeps_status_and_message() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path(IMAGE_PATH);
        then.status(500)
            .json_body(json!({ "error": { "code": 500, "message": "backend overloaded" } }));
    });

    let err = client(&server)
        .generate_background("anything", AspectRatio::Widescreen16x9)
        .await
        .unwrap_err();

    match err {
        AdForgeError::ServiceStatusError { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "backend overloaded");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_edit_sends_image_and_returns_edited_bytes() {
    let server = MockServer::start();
    let original = ImagePayload::png(vec![7, 7, 7]);
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path(IMAGE_PATH)
            .body_contains(&STANDARD.encode([7u8, 7, 7]))
            .body_contains("Modify this image based on the following request: add snow");
        then.status(200).json_body(image_reply("image/png", &[9, 9]));
    });

    let edited = client(&server).edit_image(&original, "add snow").await.unwrap();

    mock.assert();
    assert_eq!(edited.bytes, vec![9, 9]);
}

#[tokio::test]
async fn test_edit_without_image_keeps_original() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path(IMAGE_PATH);
        then.status(200).json_body(text_reply("No changes made."));
    });

    let original = ImagePayload::png(vec![4, 5, 6]);
    let edited = client(&server).edit_image(&original, "make it blue").await.unwrap();

    assert_eq!(edited, original);
}

#[tokio::test]
async fn test_analyze_uses_text_model_and_parses_json() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path(TEXT_PATH)
            .body_contains("\"responseMimeType\":\"application/json\"");
        then.status(200).json_body(text_reply(
            r#"{"headline":"Summit Ready","subheadline":"Gear built for the climb."}"#,
        ));
    });

    let suggestion = client(&server)
        .analyze_image(&ImagePayload::new("image/jpeg", vec![1]))
        .await
        .unwrap();

    mock.assert();
    assert_eq!(suggestion.headline, "Summit Ready");
    assert_eq!(suggestion.subheadline, "Gear built for the climb.");
}

#[tokio::test]
async fn test_analyze_malformed_reply_falls_back() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path(TEXT_PATH);
        then.status(200).json_body(text_reply("headline: nice photo"));
    });

    let suggestion = client(&server)
        .analyze_image(&ImagePayload::png(vec![1]))
        .await
        .unwrap();

    assert_eq!(suggestion, CopySuggestion::fallback());
}

#[tokio::test]
async fn test_refine_prompt_trims_and_falls_back_to_headline() {
    let server = MockServer::start();
    let mut first = server.mock(|when, then| {
        when.method(POST)
            .path(TEXT_PATH)
            .body_contains("Headline: \\\"Gold Rush\\\"");
        then.status(200)
            .json_body(text_reply("  golden vault interior, soft light \n"));
    });

    let gemini = client(&server);
    let prompt = gemini.refine_prompt("Gold Rush", "Buy now").await.unwrap();
    assert_eq!(prompt, "golden vault interior, soft light");
    first.assert();
    first.delete();

    server.mock(|when, then| {
        when.method(POST).path(TEXT_PATH);
        then.status(200).json_body(json!({ "candidates": [] }));
    });
    let prompt = gemini.refine_prompt("Gold Rush", "Buy now").await.unwrap();
    assert_eq!(prompt, "Gold Rush");
}
