//! Output sinks that rendered content is written to.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of an output target. The registry holds at most one binding per id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetId(String);

impl TargetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TargetId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for TargetId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Borrow<str> for TargetId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for TargetId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A host-owned sink for rendered content, such as a page element.
///
/// The engine only keeps a weak handle: once the host drops the target, or
/// reports it detached, the binding is pruned by the next poll pass.
pub trait RenderTarget {
    fn target_id(&self) -> TargetId;

    /// Whether the target can still receive output.
    fn is_attached(&self) -> bool {
        true
    }

    /// Replace the target's content with `markup`.
    fn write(&self, markup: &str) -> anyhow::Result<()>;
}
