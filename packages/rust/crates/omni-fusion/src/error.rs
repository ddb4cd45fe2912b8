//! Error types for run fusion.
//!
//! Follows ODF-REP: Library crates use `thiserror` for explicit error enums.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading, fusing or saving runs.
///
/// Every variant is fatal to the fusion job: nothing is retried and no
/// partial output is produced.
#[derive(Error, Debug)]
pub enum FusionError {
    /// Invalid method name, missing or mismatched parameter, non-positive depth/k.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed line in a TREC run file.
    #[error("Malformed run file {source_name} at line {line}: {reason} (line: {content:?})")]
    Parse {
        /// File path or label of the parsed text
        source_name: String,
        /// 1-based line number
        line: usize,
        /// Offending line content
        content: String,
        /// What was wrong with it
        reason: String,
    },

    /// Malformed line in a lambda (per-query weight) file.
    #[error("Error parsing JSON line in lambda file {source_name} at line {line}: {content}. Error: {reason}")]
    LambdaParse {
        /// File path or label of the parsed text
        source_name: String,
        /// 1-based line number
        line: usize,
        /// Offending line content
        content: String,
        /// What was wrong with it
        reason: String,
    },

    /// Malformed YAML fusion plan.
    #[error("Invalid fusion plan {path}: {source}")]
    Plan {
        /// Plan file path
        path: PathBuf,
        /// Underlying YAML error
        source: serde_yaml::Error,
    },

    /// Unreadable input or unwritable output.
    #[error("IO error on {path}: {source}")]
    Io {
        /// Path being read or written
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },
}

impl FusionError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result alias for fusion operations.
pub type Result<T> = std::result::Result<T, FusionError>;
