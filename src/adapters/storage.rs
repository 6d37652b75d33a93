use crate::config::settings::{StorageBackend, StorageSettings};
use crate::domain::ports::{AssetStore, StoredObject};
use crate::utils::error::{AdForgeError, Result};
use reqwest::Client;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Uploads to a Supabase storage bucket over its REST API.
#[derive(Debug, Clone)]
pub struct SupabaseStorage {
    client: Client,
    base_url: String,
    api_key: String,
    bucket: String,
    cache_control_seconds: u64,
    upsert: bool,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(rename = "Key")]
    key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StorageErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl SupabaseStorage {
    pub fn new(settings: &StorageSettings) -> Self {
        Self::with_client(Client::new(), settings)
    }

    pub fn with_client(client: Client, settings: &StorageSettings) -> Self {
        Self {
            client,
            base_url: settings.url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            bucket: settings.bucket.clone(),
            cache_control_seconds: settings.cache_control_seconds,
            upsert: settings.upsert,
        }
    }

    fn object_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url,
            self.bucket,
            path.trim_start_matches('/')
        )
    }
}

impl AssetStore for SupabaseStorage {
    async fn put_object(&self, path: &str, data: &[u8], content_type: &str) -> Result<StoredObject> {
        let url = self.object_url(path);
        tracing::debug!("Uploading {} bytes to {}", data.len(), url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("apikey", &self.api_key)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header(
                reqwest::header::CACHE_CONTROL,
                format!("max-age={}", self.cache_control_seconds),
            )
            .header("x-upsert", self.upsert.to_string())
            .body(data.to_vec())
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            let message = serde_json::from_str::<StorageErrorBody>(&body)
                .ok()
                .and_then(|e| e.message.or(e.error))
                .unwrap_or(body);
            return Err(AdForgeError::UploadError {
                message: format!("HTTP {}: {}", status.as_u16(), message),
            });
        }

        let key = serde_json::from_str::<UploadResponse>(&body)
            .ok()
            .and_then(|r| r.key)
            .unwrap_or_else(|| format!("{}/{}", self.bucket, path));
        tracing::info!("Uploaded asset to {}", key);
        Ok(StoredObject { key, location: url })
    }
}

/// Writes exports under a local directory.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

impl AssetStore for LocalStorage {
    async fn put_object(&self, path: &str, data: &[u8], _content_type: &str) -> Result<StoredObject> {
        let full_path = self.base_path.join(path.trim_start_matches('/'));

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(&full_path, data).await?;
        tracing::info!("Wrote {} bytes to {}", data.len(), full_path.display());
        Ok(StoredObject {
            key: path.to_string(),
            location: full_path.display().to_string(),
        })
    }
}

/// The store selected by `[storage] backend`.
#[derive(Debug, Clone)]
pub enum ConfiguredStore {
    Supabase(SupabaseStorage),
    Local(LocalStorage),
    #[cfg(feature = "s3")]
    S3(crate::adapters::s3::S3Storage),
}

impl ConfiguredStore {
    pub async fn from_settings(settings: &StorageSettings) -> Result<Self> {
        match settings.backend {
            StorageBackend::Supabase => Ok(Self::Supabase(SupabaseStorage::new(settings))),
            StorageBackend::Local => Ok(Self::Local(LocalStorage::new(&settings.local_path))),
            #[cfg(feature = "s3")]
            StorageBackend::S3 => Ok(Self::S3(
                crate::adapters::s3::S3Storage::from_env(settings).await,
            )),
            #[cfg(not(feature = "s3"))]
            StorageBackend::S3 => Err(AdForgeError::InvalidConfigValueError {
                field: "storage.backend".to_string(),
                value: "s3".to_string(),
                reason: "built without the `s3` feature".to_string(),
            }),
        }
    }
}

impl AssetStore for ConfiguredStore {
    async fn put_object(&self, path: &str, data: &[u8], content_type: &str) -> Result<StoredObject> {
        match self {
            Self::Supabase(store) => store.put_object(path, data, content_type).await,
            Self::Local(store) => store.put_object(path, data, content_type).await,
            #[cfg(feature = "s3")]
            Self::S3(store) => store.put_object(path, data, content_type).await,
        }
    }
}
