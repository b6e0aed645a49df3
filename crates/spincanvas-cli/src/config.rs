//! Configuration file handling for the CLI

use anyhow::{Context, Result};
use spincanvas_scene::config::CanvasConfig;
use std::path::Path;
use tracing::info;

/// Load configuration from file; a missing file yields the defaults
pub fn load_config(path: &Path) -> Result<CanvasConfig> {
    if path.exists() {
        CanvasConfig::load(path).with_context(|| format!("Failed to load {}", path.display()))
    } else {
        info!(
            path = %path.display(),
            "Configuration file not found, using defaults"
        );
        Ok(CanvasConfig::default())
    }
}

/// Save default configuration to file
pub fn save_default_config(path: &Path) -> Result<()> {
    let content = CanvasConfig::default().to_toml()?;
    std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, CanvasConfig::default());
    }

    #[test]
    fn test_saved_defaults_load_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spincanvas.toml");
        save_default_config(&path).unwrap();
        assert_eq!(load_config(&path).unwrap(), CanvasConfig::default());
    }

    #[test]
    fn test_broken_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spincanvas.toml");
        std::fs::write(&path, "[camera\nfov_degrees = ").unwrap();
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to load"));
    }
}
