//! Error types raised before the scheduler starts.
//!
//! Failures during a run are reported through [`crate::scheduler::RunError`],
//! which also carries the partial report of what was already consumed.

use crate::cycle::CycleError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Startup failure for one source. No tokens are emitted when this occurs.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("invalid cycle '{spec}' for source '{}': {source}", path.display())]
    Config {
        path: PathBuf,
        spec: String,
        #[source]
        source: CycleError,
    },

    #[error("cannot read source '{}': {source}", path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl SetupError {
    /// The source the error refers to.
    pub fn path(&self) -> &PathBuf {
        match self {
            SetupError::Config { path, .. } => path,
            SetupError::SourceUnavailable { path, .. } => path,
        }
    }
}

/// Errors from loading, saving or editing the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to find config directory")]
    NoConfigDir,

    #[error("unknown configuration key: {0}")]
    UnknownKey(String),

    #[error("invalid value '{value}' for {key}: {expected}")]
    InvalidValue {
        key: String,
        value: String,
        expected: &'static str,
    },

    #[error("config I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("config serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}
