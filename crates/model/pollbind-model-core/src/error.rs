use std::fmt;

use thiserror::Error;

/// Why a traversal of the model graph was cut short.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecursionReason {
    /// A container refers back to one of its own ancestors.
    Cycle,
    /// Nesting went deeper than the configured limit.
    DepthExceeded(usize),
}

impl fmt::Display for RecursionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecursionReason::Cycle => f.write_str("container refers back to an ancestor"),
            RecursionReason::DepthExceeded(limit) => write!(f, "nesting exceeds depth {limit}"),
        }
    }
}

/// Errors produced while addressing, copying or comparing model values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("invalid model path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },
    #[error("path conflict in '{path}': '{segment}' holds a primitive, not a container")]
    PathConflict { path: String, segment: String },
    #[error("invalid key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },
    #[error("recursion limit reached at '{path}': {reason}")]
    RecursionLimit {
        path: String,
        reason: RecursionReason,
    },
    #[error("model json: {0}")]
    Json(String),
}

impl ModelError {
    pub(crate) fn invalid_path(path: &str, reason: impl Into<String>) -> Self {
        ModelError::InvalidPath {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}
