//! Error types for cradle
//!
//! All modules use `CradleResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for cradle operations
pub type CradleResult<T> = Result<T, CradleError>;

/// All errors that can occur in cradle
#[derive(Error, Debug)]
pub enum CradleError {
    // Setup errors
    #[error("Unsupported architecture: {0}. cradle ships assets for amd64 and arm64.")]
    UnsupportedArch(String),

    #[error("Failed to create cache directory {path}: {source}")]
    CacheDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Runtime binary not found: {0}")]
    RuntimeNotFound(PathBuf),

    // Asset errors
    #[error("Bundled asset not found: {0}")]
    AssetNotFound(String),

    #[error("Failed to read asset {name}: {source}")]
    AssetRead {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write asset {name} to {dest}: {source}")]
    AssetWrite {
        name: String,
        dest: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Extraction errors
    #[error("Root filesystem extraction failed: {stderr}")]
    Extraction { stderr: String },

    // Spec errors
    #[error("Failed to write runtime spec to {path}: {reason}")]
    SpecWrite { path: PathBuf, reason: String },

    // Bundle errors
    #[error("Bundle preparation failed during {stage}: {source}")]
    BundlePrepare {
        stage: &'static str,
        #[source]
        source: Box<CradleError>,
    },

    // Runtime lifecycle errors
    #[error("Failed to delete container '{id}': {stderr}")]
    RuntimeDelete { id: String, stderr: String },

    #[error("Failed to create container '{id}': {stderr}")]
    RuntimeCreate { id: String, stderr: String },

    #[error("Runtime reported no process id for container '{0}'")]
    RuntimePid(String),

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Cancellation
    #[error("Operation cancelled")]
    Cancelled,

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Process errors
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command execution error: {command}, stderr: {stderr}")]
    CommandExecution { command: String, stderr: String },

    // Serialization errors
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl CradleError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Create a command execution error
    pub fn command_exec(command: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self::CommandExecution {
            command: command.into(),
            stderr: stderr.into(),
        }
    }

    /// Wrap an error with the bundle-preparation stage that produced it
    pub fn bundle_stage(stage: &'static str, source: CradleError) -> Self {
        Self::BundlePrepare {
            stage,
            source: Box::new(source),
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::AssetNotFound(_) | Self::AssetRead { .. } => Some(
                "The distribution looks incomplete; reinstall cradle or point --assets at a valid assets directory",
            ),
            Self::RuntimeNotFound(_) => {
                Some("Point [runtime].binary in the config (or --runtime) at a runc-compatible binary")
            }
            Self::UnsupportedArch(_) => Some("Build assets for this architecture or run on amd64/arm64"),
            _ => None,
        }
    }
}
