pub mod editor;
pub mod layout;
pub mod render;

pub use crate::domain::model::{AdComposition, AspectRatio, CopySuggestion};
pub use crate::domain::ports::{AssetStore, GenerativeClient, StoredObject};
pub use crate::utils::error::Result;
