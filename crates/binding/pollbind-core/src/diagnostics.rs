use crate::error::BindError;
use crate::target::TargetId;

/// A binding whose check or render failed during a pass.
#[derive(Debug)]
pub struct PassFailure {
    pub target: TargetId,
    pub error: BindError,
}

/// Outcome of one poll pass over the registry.
#[derive(Debug, Default)]
pub struct PassReport {
    /// Engine epoch of the pass (first pass is 1).
    pub epoch: u64,
    /// Bound bindings that were compared against their snapshot.
    pub checked: usize,
    /// Unbound bindings passed over.
    pub skipped: usize,
    /// Targets re-rendered because their model changed, in poll order.
    pub rendered: Vec<TargetId>,
    /// Orphaned targets removed from the registry.
    pub pruned: Vec<TargetId>,
    pub failures: Vec<PassFailure>,
}

impl PassReport {
    pub fn new(epoch: u64) -> Self {
        Self {
            epoch,
            ..Self::default()
        }
    }

    /// No binding failed during the pass.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn was_rendered(&self, target: &str) -> bool {
        self.rendered.iter().any(|t| t.as_str() == target)
    }

    pub fn was_pruned(&self, target: &str) -> bool {
        self.pruned.iter().any(|t| t.as_str() == target)
    }
}
