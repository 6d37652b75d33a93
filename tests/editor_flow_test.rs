use adforge::adapters::gemini::GeminiClient;
use adforge::adapters::storage::SupabaseStorage;
use adforge::config::settings::{GeminiSettings, StorageSettings};
use adforge::core::editor::status;
use adforge::domain::model::{AdComposition, AspectRatio, ExportResolution};
use adforge::{AdForgeError, AdRenderer, EditorSession};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use httpmock::prelude::*;
use serde_json::json;
use std::io::Cursor;

type Session = EditorSession<GeminiClient, SupabaseStorage>;

fn tiny_png() -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(8, 8, image::Rgba([200, 120, 40, 255]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

fn session(gemini: &MockServer, storage: &MockServer, composition: AdComposition) -> Session {
    let generator = GeminiClient::new(&GeminiSettings {
        endpoint: gemini.base_url(),
        api_key: "gemini-key".to_string(),
        ..GeminiSettings::default()
    });
    let store = SupabaseStorage::new(&StorageSettings {
        url: storage.base_url(),
        api_key: "storage-key".to_string(),
        ..StorageSettings::default()
    });
    EditorSession::new(generator, store, AdRenderer::new(None), composition)
        .with_resolution(ExportResolution::OneK)
}

fn offline_composition() -> AdComposition {
    AdComposition {
        image_url: String::new(),
        ..AdComposition::default()
    }
}

#[tokio::test]
async fn test_generate_then_export() -> anyhow::Result<()> {
    let gemini = MockServer::start();
    let storage = MockServer::start();
    let png = tiny_png();

    let refine = gemini.mock(|when, then| {
        when.method(POST)
            .path("/v1beta/models/gemini-2.5-flash:generateContent")
            .body_contains("Who Bought 26 Tons of Gold");
        then.status(200).json_body(json!({
            "candidates": [{ "content": { "parts": [{ "text": "gold bars in a dark vault" }] } }]
        }));
    });
    let generate = gemini.mock(|when, then| {
        when.method(POST)
            .path("/v1beta/models/gemini-2.5-flash-image:generateContent")
            .body_contains("gold bars in a dark vault")
            .body_contains("\"aspectRatio\":\"16:9\"");
        then.status(200).json_body(json!({
            "candidates": [{ "content": { "parts": [
                { "inlineData": { "mimeType": "image/png", "data": STANDARD.encode(&png) } }
            ] } }]
        }));
    });
    let upload = storage.mock(|when, then| {
        when.method(POST)
            .path("/storage/v1/object/ad-assets/exports/ad-42.png")
            .header("authorization", "Bearer storage-key")
            .header("content-type", "image/png");
        then.status(200)
            .json_body(json!({ "Key": "ad-assets/exports/ad-42.png" }));
    });

    let session = session(&gemini, &storage, offline_composition());

    session.generate_background().await?;
    refine.assert();
    generate.assert();
    assert_eq!(session.status(), None);

    let comp = session.composition();
    assert_eq!(comp.prompt_strategy, "gold bars in a dark vault");
    assert!(comp.image_url.starts_with("data:image/png;base64,"));

    let stored = session.export("exports/ad-42.png").await?;
    upload.assert();
    assert_eq!(stored.key, "ad-assets/exports/ad-42.png");
    assert_eq!(session.status().as_deref(), Some(status::SAVED));
    assert!(!session.is_busy());
    Ok(())
}

#[tokio::test]
async fn test_exported_png_matches_resolution() -> anyhow::Result<()> {
    let gemini = MockServer::start();
    let storage = MockServer::start();
    let comp = AdComposition {
        aspect_ratio: AspectRatio::Square,
        ..offline_composition()
    };
    let session = session(&gemini, &storage, comp);

    let png = session.render_png(ExportResolution::OneK).await?;
    let decoded = image::load_from_memory(&png)?;
    assert_eq!((decoded.width(), decoded.height()), (1920, 1920));
    Ok(())
}

#[tokio::test]
async fn test_failed_generation_leaves_image_untouched() {
    let gemini = MockServer::start();
    let storage = MockServer::start();
    gemini.mock(|when, then| {
        when.method(POST)
            .path("/v1beta/models/gemini-2.5-flash-image:generateContent");
        then.status(500)
            .json_body(json!({ "error": { "message": "internal" } }));
    });

    let comp = AdComposition {
        prompt_strategy: "misty alpine lake at dawn".to_string(),
        image_url: format!("data:image/png;base64,{}", STANDARD.encode(tiny_png())),
        ..AdComposition::default()
    };
    let before = comp.image_url.clone();
    let session = session(&gemini, &storage, comp);

    let err = session.generate_background().await.unwrap_err();

    assert!(matches!(err, AdForgeError::ServiceStatusError { status: 500, .. }));
    assert_eq!(session.status().as_deref(), Some(status::ERROR));
    assert_eq!(session.composition().image_url, before);
    assert!(!session.is_busy());
}

#[tokio::test]
async fn test_failed_upload_reports_export_error() {
    let gemini = MockServer::start();
    let storage = MockServer::start();
    storage.mock(|when, then| {
        when.method(POST);
        then.status(403)
            .json_body(json!({ "message": "new row violates row-level security policy" }));
    });

    let session = session(&gemini, &storage, offline_composition());
    let err = session.export("exports/ad-1.png").await.unwrap_err();

    assert!(matches!(err, AdForgeError::UploadError { .. }));
    assert_eq!(session.status().as_deref(), Some(status::EXPORT_ERROR));
    assert!(!session.is_busy());
}

#[tokio::test]
async fn test_edit_replaces_background_and_clears_instruction() -> anyhow::Result<()> {
    let gemini = MockServer::start();
    let storage = MockServer::start();
    let edited = tiny_png();
    let edit = gemini.mock(|when, then| {
        when.method(POST)
            .path("/v1beta/models/gemini-2.5-flash-image:generateContent")
            .body_contains("add falling snow");
        then.status(200).json_body(json!({
            "candidates": [{ "content": { "parts": [
                { "inlineData": { "mimeType": "image/webp", "data": STANDARD.encode(&edited) } }
            ] } }]
        }));
    });

    let comp = AdComposition {
        image_url: format!("data:image/png;base64,{}", STANDARD.encode([1u8, 2, 3])),
        ..AdComposition::default()
    };
    let session = session(&gemini, &storage, comp);
    session.set_edit_instruction("add falling snow");

    session.edit_background().await?;

    edit.assert();
    assert!(session
        .composition()
        .image_url
        .starts_with("data:image/webp;base64,"));
    assert_eq!(session.edit_instruction(), "");
    Ok(())
}
