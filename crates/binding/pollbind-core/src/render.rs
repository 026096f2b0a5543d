//! Render invoker: runs a binding's callback and delivers the markup.

use log::debug;

use crate::binding::Binding;
use crate::constants::RENDER_MARKER;
use crate::error::BindError;

/// Render `binding.reference` and write it, prefixed with [`RENDER_MARKER`],
/// to the binding's target.
///
/// Callback failures are returned as [`BindError::Render`] and are not
/// retried. A target that is gone fails with [`BindError::TargetDetached`]
/// before the callback runs.
pub fn invoke(binding: &mut Binding) -> Result<(), BindError> {
    let target = binding
        .target()
        .ok_or_else(|| BindError::TargetDetached(binding.target_id.clone()))?;

    let content = (binding.render)(&binding.reference).map_err(|e| BindError::Render {
        target: binding.target_id.clone(),
        source: e.into(),
    })?;

    let mut markup = String::with_capacity(RENDER_MARKER.len() + content.len());
    markup.push_str(RENDER_MARKER);
    markup.push_str(&content);
    target.write(&markup).map_err(|e| BindError::Sink {
        target: binding.target_id.clone(),
        source: e.into(),
    })?;

    binding.renders += 1;
    debug!(
        "render: target={} path={} renders={}",
        binding.target_id, binding.path, binding.renders
    );
    Ok(())
}
