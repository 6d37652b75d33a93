use crate::domain::image::ImagePayload;
use crate::utils::error::{AdForgeError, Result};
use reqwest::Client;

/// Resolves a composition's `image_url` to image bytes.
///
/// Accepts `data:` URLs, `http(s)` URLs and local file paths. An empty URL means
/// "no background".
#[derive(Debug, Clone, Default)]
pub struct ImageLoader {
    client: Client,
}

impl ImageLoader {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub async fn load(&self, image_url: &str) -> Result<Option<ImagePayload>> {
        let source = image_url.trim();
        if source.is_empty() {
            return Ok(None);
        }
        if ImagePayload::is_data_url(source) {
            return ImagePayload::from_data_url(source).map(Some);
        }
        if source.starts_with("http://") || source.starts_with("https://") {
            return self.fetch(source).await.map(Some);
        }

        let bytes = tokio::fs::read(source).await?;
        Ok(Some(ImagePayload::from_file_bytes(bytes)))
    }

    async fn fetch(&self, url: &str) -> Result<ImagePayload> {
        tracing::debug!("Fetching background image from {}", url);
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AdForgeError::ValidationError {
                message: format!("Background image request returned HTTP {}", status.as_u16()),
            });
        }

        let header_mime = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_string())
            .filter(|v| v.starts_with("image/"));
        let bytes = response.bytes().await?.to_vec();

        Ok(match header_mime {
            Some(mime) => ImagePayload::new(mime, bytes),
            None => ImagePayload::from_file_bytes(bytes),
        })
    }
}
