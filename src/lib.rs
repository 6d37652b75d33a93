pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::gemini::GeminiClient;
pub use adapters::storage::{ConfiguredStore, LocalStorage, SupabaseStorage};
pub use config::settings::AppSettings;
pub use core::editor::EditorSession;
pub use core::render::AdRenderer;
pub use domain::model::AdComposition;
pub use utils::error::{AdForgeError, Result};
