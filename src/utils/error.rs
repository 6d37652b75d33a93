use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdForgeError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),

    #[error("Image processing error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Base64 decoding error: {0}")]
    Base64Error(#[from] base64::DecodeError),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Invalid composition document {path}: {message}")]
    DocumentError { path: String, message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Generation service error: {message}")]
    GenerationError { message: String },

    #[error("Generation service returned status {status}: {message}")]
    ServiceStatusError { status: u16, message: String },

    #[error("Upload failed: {message}")]
    UploadError { message: String },

    #[error("Render error: {message}")]
    RenderError { message: String },

    #[error("Another request is already in flight")]
    Busy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Configuration,
    Data,
    Service,
    Rendering,
    Session,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AdForgeError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AdForgeError::HttpError(_) => ErrorCategory::Network,
            AdForgeError::ConfigError { .. }
            | AdForgeError::MissingConfigError { .. }
            | AdForgeError::InvalidConfigValueError { .. }
            | AdForgeError::TomlError(_)
            | AdForgeError::TomlSerializeError(_) => ErrorCategory::Configuration,
            AdForgeError::IoError(_)
            | AdForgeError::SerializationError(_)
            | AdForgeError::Base64Error(_)
            | AdForgeError::DocumentError { .. }
            | AdForgeError::ValidationError { .. } => ErrorCategory::Data,
            AdForgeError::GenerationError { .. }
            | AdForgeError::ServiceStatusError { .. }
            | AdForgeError::UploadError { .. } => ErrorCategory::Service,
            AdForgeError::ImageError(_) | AdForgeError::RenderError { .. } => {
                ErrorCategory::Rendering
            }
            AdForgeError::Busy => ErrorCategory::Session,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Session => ErrorSeverity::Low,
            ErrorCategory::Network | ErrorCategory::Service => ErrorSeverity::Medium,
            ErrorCategory::Data | ErrorCategory::Rendering => ErrorSeverity::High,
            ErrorCategory::Configuration => ErrorSeverity::Critical,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            AdForgeError::HttpError(_) => "Could not reach the remote service.".to_string(),
            AdForgeError::MissingConfigError { field } => {
                format!("Required setting '{}' is missing.", field)
            }
            AdForgeError::InvalidConfigValueError { field, reason, .. } => {
                format!("Setting '{}' is invalid: {}", field, reason)
            }
            AdForgeError::ServiceStatusError { status, .. } => {
                format!("The generation service rejected the request (HTTP {}).", status)
            }
            AdForgeError::UploadError { .. } => "The asset could not be uploaded.".to_string(),
            AdForgeError::DocumentError { path, message } => {
                format!("The composition document {} could not be read: {}", path, message)
            }
            AdForgeError::Busy => "Please wait for the current request to finish.".to_string(),
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => "Check your network connection and try again.",
            ErrorCategory::Configuration => {
                "Review the settings file and the GEMINI_API_KEY / SUPABASE_* environment variables."
            }
            ErrorCategory::Data => {
                "Check the composition document and input image; `adforge init --force` rewrites the document."
            }
            ErrorCategory::Service => "Try again; the remote service may be temporarily unavailable.",
            ErrorCategory::Rendering => "Check the background image and the fonts directory.",
            ErrorCategory::Session => "Wait for the in-flight request to complete.",
        }
    }
}

pub type Result<T> = std::result::Result<T, AdForgeError>;
