//! Engine configuration, read from TOML.

use std::path::Path;

use ruletile_rules::{PerlinNoise, RefreshSettings};
use serde::{Deserialize, Serialize};

use crate::RuleTileError;

/// Top-level engine configuration. Every field has a default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub noise: NoiseSettings,
    pub refresh: RefreshSettings,
}

/// Positional noise used by random and animated outputs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseSettings {
    /// Changing the seed reshuffles every random tile on every map.
    pub seed: u32,
}

impl NoiseSettings {
    pub fn noise(&self) -> PerlinNoise {
        PerlinNoise::new(self.seed)
    }
}

/// Load engine configuration from a TOML file
pub fn load_config(path: &Path) -> Result<EngineConfig, RuleTileError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse engine configuration from a TOML string
pub fn parse_config(toml_str: &str) -> Result<EngineConfig, RuleTileError> {
    Ok(toml::from_str(toml_str)?)
}
