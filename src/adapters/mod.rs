// Adapters layer: concrete implementations of the domain ports for external systems.

pub mod assets;
pub mod gemini;
#[cfg(feature = "s3")]
pub mod s3;
pub mod storage;
