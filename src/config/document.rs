use crate::domain::model::AdComposition;
use crate::utils::error::{AdForgeError, Result};
use std::path::Path;

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// Read a composition document. `.json` files are JSON, everything else TOML.
///
/// A missing document yields the default composition.
pub fn load_composition<P: AsRef<Path>>(path: P) -> Result<AdComposition> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::info!(
            "No composition at {}, starting from the default ad",
            path.display()
        );
        return Ok(AdComposition::default());
    }

    let content = std::fs::read_to_string(path)?;
    let parsed: std::result::Result<AdComposition, String> = if is_json(path) {
        serde_json::from_str(&content).map_err(|e| e.to_string())
    } else {
        toml::from_str(&content).map_err(|e| e.to_string())
    };
    parsed.map_err(|message| AdForgeError::DocumentError {
        path: path.display().to_string(),
        message,
    })
}

/// Write the default composition. An existing document, readable or not, is
/// only replaced with `force`.
pub fn init_composition<P: AsRef<Path>>(path: P, force: bool) -> Result<()> {
    let path = path.as_ref();
    if path.exists() && !force {
        return Err(AdForgeError::ConfigError {
            message: format!("{} already exists, pass --force to overwrite", path.display()),
        });
    }
    save_composition(path, &AdComposition::default())
}

pub fn save_composition<P: AsRef<Path>>(path: P, composition: &AdComposition) -> Result<()> {
    let path = path.as_ref();
    let content = if is_json(path) {
        serde_json::to_string_pretty(composition)?
    } else {
        toml::to_string_pretty(composition)?
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    tracing::debug!("Saved composition to {}", path.display());
    Ok(())
}
