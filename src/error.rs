//! Error types for Packwright
//!
//! All modules use `PackwrightResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Packwright operations
pub type PackwrightResult<T> = Result<T, PackwrightError>;

/// All errors that can occur in Packwright
#[derive(Error, Debug)]
pub enum PackwrightError {
    // Configuration errors
    #[error("Improperly configured: {0}")]
    Configuration(String),

    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Build errors
    #[error("Config file not found: {0}")]
    ConfigNotFound(String),

    #[error("Bundling failed for {config}\n\n{message}")]
    Bundling { config: String, message: String },

    // Manifest errors
    #[error("Key {key} is missing from manifest {manifest}")]
    ManifestMiss { key: String, manifest: PathBuf },

    #[error("Malformed manifest {path}: {reason}")]
    MalformedManifest { path: PathBuf, reason: String },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("{0}")]
    User(String),
}

impl PackwrightError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a configuration error
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration(reason.into())
    }

    /// Create a bundling error for a config file
    pub fn bundling(config: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Bundling {
            config: config.into(),
            message: message.into(),
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Configuration(_) => Some("Run: packwright config set <key> <value>"),
            Self::ConfigNotFound(_) => {
                Some("Check environment.config_dirs or pass an absolute config path")
            }
            Self::ManifestMiss { .. } => {
                Some("Add the config to [manifest] entries and run: packwright manifest populate")
            }
            Self::MalformedManifest { .. } => Some("Run: packwright manifest populate"),
            _ => None,
        }
    }
}
