use indexmap::IndexMap;

use crate::binding::Binding;
use crate::error::BindError;
use crate::target::TargetId;

/// Active bindings keyed by target, in registration order.
///
/// Keying by target enforces one binding per target. Poll passes iterate over
/// [`BindingRegistry::targets`], a copy of the index, so entries may be added
/// or removed while a pass is underway.
#[derive(Debug, Default)]
pub struct BindingRegistry {
    entries: IndexMap<TargetId, Binding>,
}

impl BindingRegistry {
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// Insert `binding` at the end of poll order. A binding already held for
    /// the same target is removed first and returned.
    pub fn add(&mut self, binding: Binding) -> Option<Binding> {
        let previous = self.entries.shift_remove(binding.target_id.as_str());
        self.entries.insert(binding.target_id.clone(), binding);
        previous
    }

    pub fn remove(&mut self, target: &str) -> Option<Binding> {
        self.entries.shift_remove(target)
    }

    /// Remove every binding matching `predicate`, keeping the order of the rest.
    pub fn remove_where<F>(&mut self, mut predicate: F) -> Vec<Binding>
    where
        F: FnMut(&Binding) -> bool,
    {
        let doomed: Vec<TargetId> = self
            .entries
            .values()
            .filter(|b| predicate(b))
            .map(|b| b.target_id.clone())
            .collect();
        doomed
            .iter()
            .filter_map(|t| self.entries.shift_remove(t.as_str()))
            .collect()
    }

    pub fn find_by_target(&self, target: &str) -> Result<&Binding, BindError> {
        self.entries
            .get(target)
            .ok_or_else(|| BindError::BindingNotFound(target.into()))
    }

    pub fn find_by_target_mut(&mut self, target: &str) -> Result<&mut Binding, BindError> {
        self.entries
            .get_mut(target)
            .ok_or_else(|| BindError::BindingNotFound(target.into()))
    }

    /// Lookup that tolerates entries removed since the caller saw them.
    pub(crate) fn get_mut(&mut self, target: &str) -> Option<&mut Binding> {
        self.entries.get_mut(target)
    }

    pub fn contains(&self, target: &str) -> bool {
        self.entries.contains_key(target)
    }

    pub fn all(&self) -> impl Iterator<Item = &Binding> {
        self.entries.values()
    }

    /// Copy of the index in poll order.
    pub fn targets(&self) -> Vec<TargetId> {
        self.entries.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
