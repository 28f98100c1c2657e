//! Error types for configuration loading.

use thiserror::Error;
use waypost_console::DefinitionError;
use waypost_routing::RouteError;

/// Errors that can occur while loading, saving or converting configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// The file extension is neither YAML nor JSON.
    #[error("unsupported config format: {0} (expected .yaml, .yml or .json)")]
    UnsupportedFormat(String),

    /// The command configuration does not form a valid definition.
    #[error("invalid command definition: {0}")]
    DefinitionError(#[from] DefinitionError),

    /// A configured route does not compile.
    #[error("invalid route: {0}")]
    RouteError(#[from] RouteError),
}

/// Convenience alias for results with [`ConfigError`].
pub type Result<T> = std::result::Result<T, ConfigError>;
