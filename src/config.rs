//! Project configuration module.
//!
//! Handles loading, validating, and merging `gridcut.toml`. Stock defaults
//! are overridden by the user file, and command-line flags override both.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! project_id = "PRJ"        # Project code used in every shot filename
//! scene_id = "SC01"         # Scene code used in every shot filename
//!
//! [grid]
//! rows = 3                  # Global grid (used with --apply-global)
//! cols = 3
//!
//! [aspect_ratio]
//! width = 16                # Global export ratio
//! height = 9
//!
//! [processing]
//! max_processes = 4         # Max parallel analysis workers (omit for auto = CPU cores)
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse. Override just the values you want:
//!
//! ```toml
//! scene_id = "SC07"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{AspectRatio, GridSpec};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Largest rows/cols value accepted for the global grid.
pub const MAX_GRID: u32 = 9;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Project configuration loaded from `gridcut.toml`.
///
/// All fields have defaults; user files only specify what they override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectConfig {
    /// Project code embedded in shot filenames.
    pub project_id: String,
    /// Scene code embedded in shot filenames.
    pub scene_id: String,
    /// Global grid.
    pub grid: GridConfig,
    /// Global export ratio.
    pub aspect_ratio: RatioConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            project_id: "PRJ".to_string(),
            scene_id: "SC01".to_string(),
            grid: GridConfig::default(),
            aspect_ratio: RatioConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl ProjectConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.project_id.trim().is_empty() {
            return Err(ConfigError::Validation(
                "project_id must not be empty".into(),
            ));
        }
        if self.scene_id.trim().is_empty() {
            return Err(ConfigError::Validation("scene_id must not be empty".into()));
        }
        for (name, value) in [("grid.rows", self.grid.rows), ("grid.cols", self.grid.cols)] {
            if !(1..=MAX_GRID).contains(&value) {
                return Err(ConfigError::Validation(format!(
                    "{name} must be 1-{MAX_GRID}, got {value}"
                )));
            }
        }
        if self.aspect_ratio.width == 0 || self.aspect_ratio.height == 0 {
            return Err(ConfigError::Validation(
                "aspect_ratio values must be non-zero".into(),
            ));
        }
        Ok(())
    }

    pub fn grid_spec(&self) -> GridSpec {
        GridSpec::new(self.grid.rows, self.grid.cols)
    }

    pub fn ratio(&self) -> AspectRatio {
        AspectRatio::new(self.aspect_ratio.width, self.aspect_ratio.height)
    }
}

/// Global grid settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GridConfig {
    pub rows: u32,
    pub cols: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self { rows: 3, cols: 3 }
    }
}

/// Global export ratio settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RatioConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for RatioConfig {
    fn default() -> Self {
        Self {
            width: 16,
            height: 9,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel analysis workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(ProjectConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Whether the file at `path` sets the global grid or ratio itself.
///
/// A missing file sets neither.
pub fn sets_global_params(path: &Path) -> Result<bool, ConfigError> {
    Ok(load_raw_config(path)?
        .as_ref()
        .and_then(|value| value.as_table())
        .is_some_and(|table| table.contains_key("grid") || table.contains_key("aspect_ratio")))
}

/// Load config from `path`, merged over stock defaults and validated.
///
/// A missing file yields the stock defaults.
pub fn load_config(path: &Path) -> Result<ProjectConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match load_raw_config(path)? {
        Some(overlay) => merge_toml(base, overlay),
        None => base,
    };
    let config: ProjectConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Returns a fully-commented stock `gridcut.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# gridcut configuration
# =====================
# All options are optional. Values shown are the defaults.

# Project and scene codes. Every exported shot is named
#   Shot{NNN}_{image}_{scene_id}__{project_id}_{NNN}_{task}.png
project_id = "PRJ"
scene_id = "SC01"

# Global grid. Each input sheet is analysed on its own; this grid is used
# instead when running with --apply-global, and sheets whose detected grid
# differs from it are reported before slicing. When this file sets neither
# [grid] nor [aspect_ratio], the first sheet's detected values are used.
[grid]
rows = 3    # 1-9
cols = 3    # 1-9

# Global export ratio (width:height), same rules as [grid].
[aspect_ratio]
width = 16
height = 9

[processing]
# Max parallel workers for the analysis pass. Omit for auto (= CPU cores).
# max_processes = 4
"##
}
