use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::settings::GeminiSettings;
use crate::domain::image::ImagePayload;
use crate::domain::model::{AspectRatio, CopySuggestion};
use crate::domain::ports::GenerativeClient;
use crate::utils::error::{AdForgeError, Result};

const ANALYZE_INSTRUCTION: &str = "Analyze this image and suggest a compelling marketing headline and subheadline for an ad campaign. Return only a JSON object with 'headline' and 'subheadline' keys.";

pub fn background_prompt(prompt: &str) -> String {
    format!(
        "High-end professional advertising background: {}. Cinematic lighting, luxury brand aesthetic. NO TEXT, NO CHARACTERS.",
        prompt
    )
}

pub fn edit_prompt(instruction: &str) -> String {
    format!(
        "Modify this image based on the following request: {}. Maintain the same layout and aspect ratio.",
        instruction
    )
}

pub fn refine_request(headline: &str, subheadline: &str) -> String {
    format!(
        "Generate a short AI image prompt for a background that matches this ad copy: Headline: \"{}\", Sub: \"{}\". Return ONLY the prompt text. No people, no text.",
        headline, subheadline
    )
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum RequestPart {
    Text {
        text: String,
    },
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

impl RequestPart {
    fn text(text: impl Into<String>) -> Self {
        RequestPart::Text { text: text.into() }
    }

    fn image(image: &ImagePayload) -> Self {
        RequestPart::Inline {
            inline_data: InlineData {
                mime_type: image.mime_type.clone(),
                data: image.to_base64(),
            },
        }
    }
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_config: Option<ImageConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageConfig {
    aspect_ratio: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(default = "default_mime_type")]
    mime_type: String,
    data: String,
}

fn default_mime_type() -> String {
    "image/png".to_string()
}

#[derive(Debug, Default, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    inline_data: Option<InlineData>,
}

impl GenerateContentResponse {
    fn first_parts(&self) -> &[ResponsePart] {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.as_slice())
            .unwrap_or(&[])
    }

    fn first_image(&self) -> Option<&InlineData> {
        self.first_parts().iter().find_map(|p| p.inline_data.as_ref())
    }

    fn text(&self) -> String {
        self.first_parts()
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect::<Vec<_>>()
            .join("")
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// Parse the analysis reply into a copy pair. Each field that is missing,
/// blank or not a string falls back on its own; anything but a JSON object
/// gives the full fallback pair.
pub fn parse_copy_suggestion(raw: &str) -> CopySuggestion {
    let fallback = CopySuggestion::fallback();
    let fields = match serde_json::from_str::<serde_json::Value>(strip_code_fence(raw)) {
        Ok(serde_json::Value::Object(fields)) => fields,
        Ok(other) => {
            tracing::warn!("Analysis reply is not a JSON object ({}), using fallback copy", other);
            return fallback;
        }
        Err(e) => {
            tracing::warn!("Analysis reply is not valid JSON ({}), using fallback copy", e);
            return fallback;
        }
    };

    let pick = |key: &str, default: String| {
        fields
            .get(key)
            .and_then(serde_json::Value::as_str)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .unwrap_or(default)
    };
    CopySuggestion {
        headline: pick("headline", fallback.headline),
        subheadline: pick("subheadline", fallback.subheadline),
    }
}

/// Drop a surrounding Markdown code fence such as ```` ```json ... ``` ````.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

/// REST client for the Gemini `generateContent` endpoint.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    endpoint: String,
    api_key: String,
    image_model: String,
    text_model: String,
}

impl GeminiClient {
    pub fn new(settings: &GeminiSettings) -> Self {
        Self::with_client(Client::new(), settings)
    }

    pub fn with_client(client: Client, settings: &GeminiSettings) -> Self {
        Self {
            client,
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            image_model: settings.image_model.clone(),
            text_model: settings.text_model.clone(),
        }
    }

    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let url = format!("{}/v1beta/models/{}:generateContent", self.endpoint, model);
        tracing::debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("Generation response status: {}", status);
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(AdForgeError::ServiceStatusError {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json::<GenerateContentResponse>().await?)
    }
}

#[async_trait]
impl GenerativeClient for GeminiClient {
    async fn generate_background(
        &self,
        prompt: &str,
        aspect_ratio: AspectRatio,
    ) -> Result<ImagePayload> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![RequestPart::text(background_prompt(prompt))],
            }],
            generation_config: Some(GenerationConfig {
                image_config: Some(ImageConfig {
                    aspect_ratio: aspect_ratio.to_string(),
                }),
                ..GenerationConfig::default()
            }),
        };

        let response = self.generate_content(&self.image_model, &request).await?;
        let inline = response
            .first_image()
            .ok_or_else(|| AdForgeError::GenerationError {
                message: "No image data returned".to_string(),
            })?;
        let image = ImagePayload::from_base64(inline.mime_type.clone(), &inline.data)?;
        tracing::info!("Generated {} background ({} bytes)", aspect_ratio, image.bytes.len());
        Ok(image)
    }

    async fn edit_image(&self, image: &ImagePayload, instruction: &str) -> Result<ImagePayload> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![RequestPart::image(image), RequestPart::text(edit_prompt(instruction))],
            }],
            generation_config: None,
        };

        let response = self.generate_content(&self.image_model, &request).await?;
        match response.first_image() {
            Some(inline) => ImagePayload::from_base64(inline.mime_type.clone(), &inline.data),
            None => {
                tracing::warn!("Edit returned no image, keeping the original");
                Ok(image.clone())
            }
        }
    }

    async fn analyze_image(&self, image: &ImagePayload) -> Result<CopySuggestion> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![RequestPart::image(image), RequestPart::text(ANALYZE_INSTRUCTION)],
            }],
            generation_config: Some(GenerationConfig {
                response_mime_type: Some("application/json".to_string()),
                ..GenerationConfig::default()
            }),
        };

        let response = self.generate_content(&self.text_model, &request).await?;
        Ok(parse_copy_suggestion(&response.text()))
    }

    async fn refine_prompt(&self, headline: &str, subheadline: &str) -> Result<String> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![RequestPart::text(refine_request(headline, subheadline))],
            }],
            generation_config: None,
        };

        let response = self.generate_content(&self.text_model, &request).await?;
        let text = response.text();
        let prompt = text.trim();
        if prompt.is_empty() {
            Ok(headline.to_string())
        } else {
            Ok(prompt.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_copy_suggestion_valid_json() {
        let s = parse_copy_suggestion(r#"{"headline": "Golden Hour", "subheadline": "Own it."}"#);
        assert_eq!(s.headline, "Golden Hour");
        assert_eq!(s.subheadline, "Own it.");
    }

    #[test]
    fn test_parse_copy_suggestion_code_fence() {
        let raw = "```json\n{\"headline\": \"A\", \"subheadline\": \"B\"}\n```";
        let s = parse_copy_suggestion(raw);
        assert_eq!((s.headline.as_str(), s.subheadline.as_str()), ("A", "B"));
    }

    #[test]
    fn test_parse_copy_suggestion_malformed_falls_back() {
        for raw in [
            "",
            "not json",
            "{\"headline\":",
            "[1, 2]",
            "[\"x\", \"y\"]",
            "\"just a string\"",
            "```\n```",
            "null",
        ] {
            let s = parse_copy_suggestion(raw);
            assert_eq!(s, CopySuggestion::fallback(), "input {raw:?}");
            assert!(!s.headline.is_empty() && !s.subheadline.is_empty());
        }
    }

    #[test]
    fn test_parse_copy_suggestion_fills_missing_fields() {
        let s = parse_copy_suggestion(r#"{"headline": "Only headline", "subheadline": "  "}"#);
        assert_eq!(s.headline, "Only headline");
        assert_eq!(s.subheadline, CopySuggestion::FALLBACK_SUBHEADLINE);

        let s = parse_copy_suggestion("{}");
        assert_eq!(s, CopySuggestion::fallback());
    }

    #[test]
    fn test_parse_copy_suggestion_wrong_type_only_replaces_that_field() {
        let s = parse_copy_suggestion(r#"{"headline": "A", "subheadline": 5}"#);
        assert_eq!(s.headline, "A");
        assert_eq!(s.subheadline, CopySuggestion::FALLBACK_SUBHEADLINE);

        let s = parse_copy_suggestion(r#"{"headline": ["x"], "subheadline": " Shine on. "}"#);
        assert_eq!(s.headline, CopySuggestion::FALLBACK_HEADLINE);
        assert_eq!(s.subheadline, "Shine on.");
    }

    #[test]
    fn test_request_serialization_shape() {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    RequestPart::image(&ImagePayload::png(vec![1, 2, 3])),
                    RequestPart::text("hello"),
                ],
            }],
            generation_config: Some(GenerationConfig {
                image_config: Some(ImageConfig {
                    aspect_ratio: "9:16".to_string(),
                }),
                ..GenerationConfig::default()
            }),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value["contents"][0]["parts"][0]["inlineData"]["mimeType"],
            "image/png"
        );
        assert_eq!(value["contents"][0]["parts"][0]["inlineData"]["data"], "AQID");
        assert_eq!(value["contents"][0]["parts"][1]["text"], "hello");
        assert_eq!(value["generationConfig"]["imageConfig"]["aspectRatio"], "9:16");
        assert!(value["generationConfig"].get("responseMimeType").is_none());
    }

    #[test]
    fn test_response_helpers() {
        let response: GenerateContentResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{
                "content": { "parts": [
                    { "text": "Here you go. " },
                    { "inlineData": { "mimeType": "image/jpeg", "data": "AQID" } },
                    { "text": "Enjoy." }
                ]}
            }]
        }))
        .unwrap();
        assert_eq!(response.text(), "Here you go. Enjoy.");
        assert_eq!(response.first_image().unwrap().mime_type, "image/jpeg");

        let empty: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert!(empty.first_image().is_none());
        assert_eq!(empty.text(), "");
    }
}
