use std::fmt;
use std::rc::{Rc, Weak};

use pollbind_model::{deep_clone, ModelError, ModelPath, Snapshot, StateTree, Value};

use crate::target::{RenderTarget, TargetId};

/// Render callback: maps the current model value to markup.
pub type RenderFn = Box<dyn FnMut(&Value) -> anyhow::Result<String>>;

/// One model path kept in sync with one output target.
pub struct Binding {
    pub(crate) path: ModelPath,
    /// Live value at `path` as of the last resolution; aliases the tree.
    pub(crate) reference: Value,
    /// Deep copy of `reference` taken when it was last rendered.
    pub(crate) snapshot: Snapshot,
    pub(crate) render: RenderFn,
    pub(crate) target: Weak<dyn RenderTarget>,
    pub(crate) target_id: TargetId,
    pub(crate) bound: bool,
    pub(crate) renders: u64,
}

impl Binding {
    /// Resolve `path`, snapshot its value and wire it to `target`.
    pub(crate) fn new(
        tree: &StateTree,
        path: ModelPath,
        render: RenderFn,
        target: Weak<dyn RenderTarget>,
        target_id: TargetId,
        bound: bool,
        max_depth: usize,
    ) -> Result<Self, ModelError> {
        let reference = tree.resolve(&path)?;
        let snapshot = deep_clone(&reference, max_depth)?;
        Ok(Self {
            path,
            reference,
            snapshot,
            render,
            target,
            target_id,
            bound,
            renders: 0,
        })
    }

    pub fn path(&self) -> &ModelPath {
        &self.path
    }

    pub fn reference(&self) -> &Value {
        &self.reference
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn target_id(&self) -> &TargetId {
        &self.target_id
    }

    pub fn is_bound(&self) -> bool {
        self.bound
    }

    /// Number of times this binding has written to its target.
    pub fn render_count(&self) -> u64 {
        self.renders
    }

    pub(crate) fn target(&self) -> Option<Rc<dyn RenderTarget>> {
        self.target.upgrade()
    }

    /// Dropped by its host, or reported detached.
    pub fn is_orphaned(&self) -> bool {
        match self.target.upgrade() {
            Some(target) => !target.is_attached(),
            None => true,
        }
    }

    /// Adopt `live` as the reference and take a fresh snapshot of it.
    pub(crate) fn refresh(&mut self, live: Value, max_depth: usize) -> Result<(), ModelError> {
        self.snapshot = deep_clone(&live, max_depth)?;
        self.reference = live;
        Ok(())
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("path", &self.path)
            .field("target", &self.target_id)
            .field("bound", &self.bound)
            .field("renders", &self.renders)
            .field("snapshot", &self.snapshot)
            .finish_non_exhaustive()
    }
}
