//! Errors raised at the crate's fallible edges.
//!
//! Diffing and planning never fail; these cover loading configuration and
//! reading or writing objects.

use std::path::PathBuf;
use thiserror::Error;

/// Error is the crate-wide error type.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {what}: {source}")]
    Parse {
        what: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to serialize output: {0}")]
    Serialize(#[from] serde_yaml::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Creates a read error for the given path.
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Read {
            path: path.into(),
            source,
        }
    }

    /// Creates a parse error describing what was being parsed.
    pub fn parse(what: impl Into<String>, source: serde_yaml::Error) -> Self {
        Error::Parse {
            what: what.into(),
            source,
        }
    }

    /// Creates an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Error::InvalidConfig(message.into())
    }
}

/// Result is a Result with the crate's Error.
pub type Result<T> = std::result::Result<T, Error>;
