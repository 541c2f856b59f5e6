//! Error types for configuration loading and validation.

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the public API.
#[derive(Debug, Error)]
pub enum Error {
    /// A configuration value failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A configuration file could not be read.
    #[error("failed to read config file {path:?}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A configuration file could not be parsed as TOML.
    #[error("failed to parse config file")]
    ParseConfig(#[from] toml::de::Error),
}
