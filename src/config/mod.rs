//! Application Configuration
//!
//! User settings stored in TOML format: model location, rasterization
//! parameters and decision policy. Missing sections fall back to their
//! defaults so a partial file stays valid across upgrades.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::decide::DecisionConfig;
use crate::raster::RasterConfig;

/// Application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Model settings
    #[serde(default)]
    pub model: ModelConfig,
    /// Rasterization settings
    #[serde(default)]
    pub raster: RasterConfig,
    /// Decision policy settings
    #[serde(default)]
    pub decision: DecisionConfig,
}

/// Classifier model settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Path to the ONNX doodle classifier
    pub model_path: PathBuf,
    /// Optional JSON label file overriding the built-in vocabulary
    pub labels_path: Option<PathBuf>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("model/doodle.onnx"),
            labels_path: None,
        }
    }
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading config from {}", path.display()))?;
    let config: AppConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)
        .with_context(|| format!("writing config to {}", path.display()))?;
    Ok(())
}

/// Per-user default config file location
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "shapesense", "Shapesense")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_app_config() {
        let config = AppConfig::default();

        // Check model defaults
        assert_eq!(config.model.model_path, PathBuf::from("model/doodle.onnx"));
        assert!(config.model.labels_path.is_none());

        // Check raster defaults
        assert_eq!(config.raster.target_size, 28);
        assert_eq!(config.raster.fit_margin_px, 2);

        // Check decision defaults
        assert!((config.decision.confidence_threshold - 0.6).abs() < 0.01);
        assert!((config.decision.fit_margin - 0.10).abs() < 0.01);
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = AppConfig::default();

        // Serialize to TOML
        let toml_str = toml::to_string_pretty(&config).unwrap();

        // Deserialize back
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();

        // Verify values match
        assert_eq!(config.model.model_path, parsed.model.model_path);
        assert_eq!(config.raster.target_size, parsed.raster.target_size);
        assert_eq!(
            config.decision.confidence_threshold,
            parsed.decision.confidence_threshold
        );
    }

    #[test]
    fn test_config_with_custom_values() {
        let mut config = AppConfig::default();
        config.model.model_path = PathBuf::from("/opt/models/quickdraw.onnx");
        config.decision.confidence_threshold = 0.8;
        config.raster.stroke_width_px = 3.0;

        // Serialize and deserialize
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(
            parsed.model.model_path,
            PathBuf::from("/opt/models/quickdraw.onnx")
        );
        assert!((parsed.decision.confidence_threshold - 0.8).abs() < 0.01);
        assert!((parsed.raster.stroke_width_px - 3.0).abs() < 0.01);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        // Only the model section present
        let parsed: AppConfig =
            toml::from_str("[model]\nmodel_path = \"custom.onnx\"\n").unwrap();

        assert_eq!(parsed.model.model_path, PathBuf::from("custom.onnx"));
        assert_eq!(parsed.raster.target_size, 28);
        assert!((parsed.decision.confidence_threshold - 0.6).abs() < 0.01);
    }

    #[test]
    fn test_save_and_load_config() {
        let config = AppConfig::default();

        // Create a temporary file
        let temp_file = NamedTempFile::new().unwrap();

        // Save config
        save_config(&config, temp_file.path()).unwrap();

        // Load config
        let loaded = load_config(temp_file.path()).unwrap();

        // Verify
        assert_eq!(config.model.model_path, loaded.model.model_path);
        assert_eq!(config.raster.target_size, loaded.raster.target_size);
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/path/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "this is not valid toml {{{{").unwrap();

        let result = load_config(temp_file.path());
        assert!(result.is_err());
    }
}
