use crate::domain::model::ExportResolution;
use crate::utils::error::{AdForgeError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_BUCKET: &str = "ad-assets";
pub const DEFAULT_PREFIX: &str = "exports";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub gemini: GeminiSettings,
    pub storage: StorageSettings,
    pub export: ExportSettings,
    pub render: RenderSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiSettings {
    pub endpoint: String,
    pub api_key: String,
    pub image_model: String,
    pub text_model: String,
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_GEMINI_ENDPOINT.to_string(),
            api_key: std::env::var("GEMINI_API_KEY").unwrap_or_default(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Supabase,
    Local,
    S3,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub backend: StorageBackend,
    /// Project URL of the storage service (Supabase).
    pub url: String,
    pub api_key: String,
    pub bucket: String,
    pub prefix: String,
    pub cache_control_seconds: u64,
    pub upsert: bool,
    pub local_path: String,
    pub region: Option<String>,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Supabase,
            url: std::env::var("SUPABASE_URL").unwrap_or_default(),
            api_key: std::env::var("SUPABASE_KEY").unwrap_or_default(),
            bucket: DEFAULT_BUCKET.to_string(),
            prefix: DEFAULT_PREFIX.to_string(),
            cache_control_seconds: 3600,
            upsert: false,
            local_path: "./exports".to_string(),
            region: None,
        }
    }
}

impl StorageSettings {
    /// Object key for an export taken at `unix_millis`.
    pub fn export_key(&self, unix_millis: i64) -> String {
        let prefix = self.prefix.trim_matches('/');
        if prefix.is_empty() {
            format!("ad-{}.png", unix_millis)
        } else {
            format!("{}/ad-{}.png", prefix, unix_millis)
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    pub resolution: ExportResolution,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub fonts_dir: Option<PathBuf>,
}

impl AppSettings {
    /// Load settings from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(AdForgeError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// Settings from `path` when it exists, defaults otherwise.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            tracing::debug!("Loading settings from {}", path.as_ref().display());
            Self::from_file(path)
        } else {
            tracing::debug!(
                "No settings file at {}, using defaults",
                path.as_ref().display()
            );
            Ok(Self::default())
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = substitute_env_vars(content);
        Ok(toml::from_str(&processed_content)?)
    }

    fn validate_gemini(&self) -> Result<()> {
        validation::validate_url("gemini.endpoint", &self.gemini.endpoint)?;
        validation::validate_non_empty_string("gemini.image_model", &self.gemini.image_model)?;
        validation::validate_non_empty_string("gemini.text_model", &self.gemini.text_model)?;
        if self.gemini.api_key.trim().is_empty() {
            return Err(AdForgeError::MissingConfigError {
                field: "gemini.api_key".to_string(),
            });
        }
        Ok(())
    }

    fn validate_storage(&self) -> Result<()> {
        let storage = &self.storage;
        validation::validate_range(
            "storage.cache_control_seconds",
            storage.cache_control_seconds,
            0,
            31_536_000,
        )?;
        match storage.backend {
            StorageBackend::Supabase => {
                validation::validate_url("storage.url", &storage.url)?;
                validation::validate_bucket_name("storage.bucket", &storage.bucket)?;
                if storage.api_key.trim().is_empty() {
                    return Err(AdForgeError::MissingConfigError {
                        field: "storage.api_key".to_string(),
                    });
                }
            }
            StorageBackend::S3 => {
                validation::validate_bucket_name("storage.bucket", &storage.bucket)?;
            }
            StorageBackend::Local => {
                validation::validate_path("storage.local_path", &storage.local_path)?;
            }
        }
        Ok(())
    }

    /// Checks only what the generative-AI calls need.
    pub fn validate_for_generation(&self) -> Result<()> {
        self.validate_gemini()
    }

    /// Checks only what export needs.
    pub fn validate_for_export(&self) -> Result<()> {
        self.validate_storage()
    }
}

impl Validate for AppSettings {
    fn validate(&self) -> Result<()> {
        self.validate_gemini()?;
        self.validate_storage()?;
        tracing::info!("✅ Configuration validation passed");
        Ok(())
    }
}

/// Replace `${VAR}` with the environment value; unknown variables are left as-is.
fn substitute_env_vars(content: &str) -> String {
    use regex::Regex;
    use std::sync::OnceLock;

    static ENV_VAR: OnceLock<Regex> = OnceLock::new();
    let re = ENV_VAR.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("valid regex"));

    re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
    })
    .into_owned()
}
