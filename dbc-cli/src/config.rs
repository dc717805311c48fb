//! Configuration loading and parsing

use anyhow::{Context, Result};
use dbc_core::{ExportOptions, ImportOptions, LineEnding};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Main application configuration (loaded from dbc.toml)
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub import: ImportOptions,
    #[serde(default)]
    pub export: ExportOptions,
}

impl AppConfig {
    /// Apply command-line overrides on top of the file settings
    pub fn with_overrides(mut self, lf: bool, bom: bool) -> Self {
        if lf {
            self.export.line_ending = LineEnding::Lf;
        }
        if bom {
            self.export.utf8_bom = true;
        }
        self
    }
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    Ok(config)
}
