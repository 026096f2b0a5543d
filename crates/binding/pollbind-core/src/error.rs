use std::error::Error as StdError;

use pollbind_model::ModelError;
use thiserror::Error;

use crate::target::TargetId;

/// Boxed cause of a render or sink failure.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Errors surfaced by lifecycle calls and poll passes.
#[derive(Debug, Error)]
pub enum BindError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("no binding registered for target '{0}'")]
    BindingNotFound(TargetId),
    #[error("target '{0}' is no longer attached")]
    TargetDetached(TargetId),
    #[error("render callback failed for target '{target}': {source}")]
    Render {
        target: TargetId,
        #[source]
        source: BoxError,
    },
    #[error("writing output to target '{target}' failed: {source}")]
    Sink {
        target: TargetId,
        #[source]
        source: BoxError,
    },
    #[error("invalid engine config: {reason}")]
    Config { reason: String },
}

impl BindError {
    pub(crate) fn config(reason: impl Into<String>) -> Self {
        BindError::Config {
            reason: reason.into(),
        }
    }

    /// The target a failure is about, when it concerns a single binding.
    pub fn target(&self) -> Option<&TargetId> {
        match self {
            BindError::BindingNotFound(t) | BindError::TargetDetached(t) => Some(t),
            BindError::Render { target, .. } | BindError::Sink { target, .. } => Some(target),
            BindError::Model(_) | BindError::Config { .. } => None,
        }
    }
}
