use crate::config::settings::StorageSettings;
use crate::domain::ports::{AssetStore, StoredObject};
use crate::utils::error::{AdForgeError, Result};
use aws_sdk_s3::error::ProvideErrorMetadata;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;

#[derive(Debug, Clone)]
pub struct S3Storage {
    client: S3Client,
    bucket: String,
    cache_control_seconds: u64,
}

impl S3Storage {
    pub fn new(client: S3Client, settings: &StorageSettings) -> Self {
        Self {
            client,
            bucket: settings.bucket.clone(),
            cache_control_seconds: settings.cache_control_seconds,
        }
    }

    /// Client from the ambient AWS configuration, with the region override applied.
    pub async fn from_env(settings: &StorageSettings) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = settings.region.clone() {
            loader = loader.region(aws_config::Region::new(region));
        }
        let config = loader.load().await;
        Self::new(S3Client::new(&config), settings)
    }
}

impl AssetStore for S3Storage {
    async fn put_object(&self, path: &str, data: &[u8], content_type: &str) -> Result<StoredObject> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(path)
            .content_type(content_type)
            .cache_control(format!("max-age={}", self.cache_control_seconds))
            .body(ByteStream::from(data.to_vec()))
            .send()
            .await
            .map_err(|e| {
                let service_error = e.into_service_error();
                AdForgeError::UploadError {
                    message: format!(
                        "S3 put_object failed ({}): {}",
                        service_error.code().unwrap_or("unknown"),
                        service_error.message().unwrap_or("no message")
                    ),
                }
            })?;

        tracing::info!("Uploaded asset to s3://{}/{}", self.bucket, path);
        Ok(StoredObject {
            key: path.to_string(),
            location: format!("s3://{}/{}", self.bucket, path),
        })
    }
}
