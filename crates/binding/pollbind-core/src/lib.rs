//! pollbind
//!
//! Polling dirty-checking binding engine. Each [`Binding`] ties a dotted path
//! in a shared [`StateTree`] to a render callback and an output target. A poll
//! pass re-resolves every bound path, compares the live value against the
//! snapshot taken at the last render and re-renders whatever changed.
//!
//! The engine owns no thread or timer. Hosts drive it through
//! [`PollScheduler::advance`] from their own loop, or hand the current thread
//! to [`PollScheduler::run_until_stopped`].

pub mod binding;
pub mod config;
pub mod constants;
pub mod diagnostics;
pub mod error;
pub mod registry;
pub mod render;
pub mod scheduler;
pub mod target;

use std::rc::Rc;

use log::debug;

pub use crate::binding::{Binding, RenderFn};
pub use crate::config::{EngineConfig, RegisterPolicy};
pub use crate::constants::{DEFAULT_POLL_PERIOD_MS, DEFAULT_POLL_RATE_HZ, RENDER_MARKER};
pub use crate::diagnostics::{PassFailure, PassReport};
pub use crate::error::{BindError, BoxError};
pub use crate::registry::BindingRegistry;
pub use crate::scheduler::{run_pass, PollScheduler, SchedulerState, StopHandle};
pub use crate::target::{RenderTarget, TargetId};
pub use pollbind_model::{ModelError, ModelPath, StateTree, Value};

/// Binding registry plus the shared tree its paths resolve against.
#[derive(Debug)]
pub struct Engine {
    pub(crate) tree: StateTree,
    pub(crate) registry: BindingRegistry,
    pub(crate) config: EngineConfig,
    /// Number of poll passes run so far.
    pub(crate) epoch: u64,
}

impl Engine {
    /// Engine with the default configuration.
    pub fn new(tree: StateTree) -> Self {
        Self {
            tree,
            registry: BindingRegistry::new(),
            config: EngineConfig::default(),
            epoch: 0,
        }
    }

    pub fn with_config(tree: StateTree, config: EngineConfig) -> Result<Self, BindError> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::new(tree)
        })
    }

    /// The shared model. Cloning the returned tree shares its root.
    pub fn tree(&self) -> &StateTree {
        &self.tree
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &BindingRegistry {
        &self.registry
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn binding(&self, target: &str) -> Result<&Binding, BindError> {
        self.registry.find_by_target(target)
    }

    /// Bind `path` to `target` and render it once.
    ///
    /// Missing segments of `path` are created in the tree. Whether the new
    /// binding is polled follows [`EngineConfig::register_policy`]. A binding
    /// already registered for the same target is replaced and returned. If the
    /// initial render fails, nothing is registered.
    pub fn register<T, F>(
        &mut self,
        path: &str,
        target: &Rc<T>,
        render: F,
    ) -> Result<Option<Binding>, BindError>
    where
        T: RenderTarget + 'static,
        F: FnMut(&Value) -> anyhow::Result<String> + 'static,
    {
        let target: Rc<dyn RenderTarget> = target.clone();
        self.register_dyn(path, &target, Box::new(render))
    }

    /// [`Engine::register`] for already type-erased targets and callbacks.
    pub fn register_dyn(
        &mut self,
        path: &str,
        target: &Rc<dyn RenderTarget>,
        render: RenderFn,
    ) -> Result<Option<Binding>, BindError> {
        let path = ModelPath::parse(path)?;
        let target_id = target.target_id();
        if !target.is_attached() {
            return Err(BindError::TargetDetached(target_id));
        }
        let bound = self.config.register_policy == RegisterPolicy::Bound;

        let mut binding = Binding::new(
            &self.tree,
            path,
            render,
            Rc::downgrade(target),
            target_id,
            bound,
            self.config.max_depth,
        )?;
        render::invoke(&mut binding)?;

        debug!(
            "register: target={} path={} bound={}",
            binding.target_id, binding.path, bound
        );
        Ok(self.registry.add(binding))
    }

    /// Remove the binding for `target` and hand it back.
    pub fn unregister(&mut self, target: &str) -> Result<Binding, BindError> {
        let binding = self
            .registry
            .remove(target)
            .ok_or_else(|| BindError::BindingNotFound(target.into()))?;
        debug!("unregister: target={}", target);
        Ok(binding)
    }

    /// Stop polling `target`. The binding stays registered and is not re-rendered.
    pub fn unbind(&mut self, target: &str) -> Result<(), BindError> {
        self.registry.find_by_target_mut(target)?.bound = false;
        debug!("unbind: target={}", target);
        Ok(())
    }

    /// Resume polling `target` and render it right away.
    pub fn bind(&mut self, target: &str) -> Result<(), BindError> {
        self.registry.find_by_target_mut(target)?.bound = true;
        debug!("bind: target={}", target);
        self.force_render(target)
    }

    pub fn is_bound(&self, target: &str) -> Result<bool, BindError> {
        Ok(self.registry.find_by_target(target)?.bound)
    }

    /// Re-resolve and render `target` whether or not its value changed or it
    /// is bound.
    pub fn update(&mut self, target: &str) -> Result<(), BindError> {
        self.force_render(target)
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    fn force_render(&mut self, target: &str) -> Result<(), BindError> {
        let binding = self.registry.find_by_target_mut(target)?;
        if binding.is_orphaned() {
            return Err(BindError::TargetDetached(binding.target_id.clone()));
        }
        let live = self.tree.resolve(&binding.path)?;
        binding.refresh(live, self.config.max_depth)?;
        render::invoke(binding)
    }
}
