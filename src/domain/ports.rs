use crate::domain::image::ImagePayload;
use crate::domain::model::{AspectRatio, CopySuggestion};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Outbound calls to the generative-AI service.
#[async_trait]
pub trait GenerativeClient: Send + Sync {
    async fn generate_background(
        &self,
        prompt: &str,
        aspect_ratio: AspectRatio,
    ) -> Result<ImagePayload>;
    async fn edit_image(&self, image: &ImagePayload, instruction: &str) -> Result<ImagePayload>;
    async fn analyze_image(&self, image: &ImagePayload) -> Result<CopySuggestion>;
    async fn refine_prompt(&self, headline: &str, subheadline: &str) -> Result<String>;
}

/// Where an uploaded object ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub key: String,
    pub location: String,
}

pub trait AssetStore: Send + Sync {
    fn put_object(
        &self,
        path: &str,
        data: &[u8],
        content_type: &str,
    ) -> impl std::future::Future<Output = Result<StoredObject>> + Send;
}
