//! Configuration schema for cradle
//!
//! Configuration is stored at `~/.config/cradle/config.toml`. Everything
//! defaults sensibly; the file is optional.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Runtime and asset locations
    pub runtime: RuntimeConfig,

    /// Sandboxed process defaults
    pub process: ProcessConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable verbose logging
    pub verbose: bool,

    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            log_format: "text".to_string(),
        }
    }
}

/// Runtime and asset locations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Path to a runc-compatible binary. When unset the bundled runtime
    /// asset is installed into the cache directory and used from there.
    pub binary: Option<PathBuf>,

    /// Assets directory override (default: `assets/` next to the executable)
    pub assets_dir: Option<PathBuf>,

    /// Cache directory override (default: per-user cache dir)
    pub cache_dir: Option<PathBuf>,
}

/// Sandboxed process defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessConfig {
    /// Command to run when none is given on the command line
    pub command: Vec<String>,

    /// Hostname inside the container
    pub hostname: String,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            command: vec!["sleep".to_string(), "3".to_string()],
            hostname: "cradle".to_string(),
        }
    }
}
