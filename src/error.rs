//! Error types for the Forfettario Engine.
//!
//! The computation functions in [`crate::engine`] and
//! [`crate::set_aside`] cannot fail.  Errors only arise at the edges:
//! loading the configuration table and validating caller input.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// The profile is well-formed but describes a combination the
    /// regime does not allow (e.g. a professional enrolled with the
    /// artisans and merchants scheme).
    #[error("unsupported configuration: {0}")]
    UnsupportedConfiguration(String),

    /// A numeric input is outside its allowed domain.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("failed to read tax configuration {path:?}: {source}")]
    ConfigLoad {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse tax configuration {path:?}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, EngineError>;
