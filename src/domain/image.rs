use base64::{engine::general_purpose, Engine as _};

use crate::utils::error::{AdForgeError, Result};

/// Raw image bytes plus their MIME type, as exchanged with the generation service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ImagePayload {
    pub fn new(mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn png(bytes: Vec<u8>) -> Self {
        Self::new("image/png", bytes)
    }

    /// Build from a base64 body returned by the service.
    pub fn from_base64(mime_type: impl Into<String>, data: &str) -> Result<Self> {
        let bytes = general_purpose::STANDARD.decode(data.trim())?;
        Ok(Self::new(mime_type, bytes))
    }

    pub fn to_base64(&self) -> String {
        general_purpose::STANDARD.encode(&self.bytes)
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.to_base64())
    }

    pub fn is_data_url(url: &str) -> bool {
        url.trim_start().starts_with("data:")
    }

    /// Parse `data:<mime>;base64,<body>`.
    pub fn from_data_url(url: &str) -> Result<Self> {
        let malformed = |reason: &str| AdForgeError::ValidationError {
            message: format!("Malformed data URL: {}", reason),
        };

        let rest = url
            .trim()
            .strip_prefix("data:")
            .ok_or_else(|| malformed("missing 'data:' prefix"))?;
        let (header, body) = rest
            .split_once(',')
            .ok_or_else(|| malformed("missing ',' separator"))?;
        let mime_type = header
            .strip_suffix(";base64")
            .ok_or_else(|| malformed("only base64 payloads are supported"))?;
        if mime_type.is_empty() {
            return Err(malformed("missing MIME type"));
        }

        Self::from_base64(mime_type, body)
    }

    /// Sniff the MIME type of a local file from its contents, defaulting to PNG.
    pub fn from_file_bytes(bytes: Vec<u8>) -> Self {
        let mime_type = match image::guess_format(&bytes) {
            Ok(image::ImageFormat::Jpeg) => "image/jpeg",
            Ok(image::ImageFormat::WebP) => "image/webp",
            Ok(image::ImageFormat::Gif) => "image/gif",
            _ => "image/png",
        };
        Self::new(mime_type, bytes)
    }
}
