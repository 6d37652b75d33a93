#[cfg(feature = "cli")]
pub mod cli;
pub mod document;
pub mod settings;

#[cfg(feature = "cli")]
pub use cli::{CliConfig, Command, SetArgs};
pub use settings::{AppSettings, StorageBackend};
