//! # World Configuration
//!
//! One TOML file covering generation and streaming. Every key is optional;
//! an absent file means an all-defaults world, while a present-but-malformed
//! file is an error the launcher should surface rather than silently mask.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use loam_procedural::GeneratorConfig;

use crate::error::WorldResult;
use crate::scheduler::StreamingConfig;

/// Top-level world configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Terrain, cave, ore, and tree tuning.
    pub generator: GeneratorConfig,
    /// Chunk streaming tuning.
    pub streaming: StreamingConfig,
}

impl WorldConfig {
    /// Loads configuration from a TOML file, or defaults if the file does
    /// not exist.
    ///
    /// # Errors
    ///
    /// If the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> WorldResult<Self> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        Self::from_toml_str(&fs::read_to_string(path)?)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// If the text is not valid TOML or has keys of the wrong type.
    pub fn from_toml_str(text: &str) -> WorldResult<Self> {
        Ok(toml::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let path = std::env::temp_dir().join("loam_config_that_does_not_exist.toml");
        let config = WorldConfig::load(&path).unwrap();
        assert_eq!(config.streaming.render_distance, 1);
        assert_eq!(config.streaming.load_budget, 2);
    }

    #[test]
    fn test_partial_toml_overrides_only_named_keys() {
        let config = WorldConfig::from_toml_str(
            r#"
            [streaming]
            render_distance = 3

            [generator]
            tree_threshold = 0.8
            "#,
        )
        .unwrap();

        assert_eq!(config.streaming.render_distance, 3);
        assert_eq!(config.streaming.load_budget, 2, "unnamed keys keep defaults");
        assert!((config.generator.tree_threshold - 0.8).abs() < f64::EPSILON);
        assert!((config.generator.cave_fill_chance - 0.7).abs() < f64::EPSILON);
    }

    #[test]
    fn test_malformed_toml_is_an_error() {
        let result = WorldConfig::from_toml_str("streaming = \"not a table\"");
        assert!(result.is_err());
    }
}
