use std::fmt;

use log::trace;

use crate::error::ModelError;
use crate::path::ModelPath;
use crate::value::{ObjectRef, Value};

/// The shared state tree that bindings address by path.
///
/// `StateTree` is a cheap handle: clones share the same root, so the host
/// keeps one clone to mutate the model and hands another to the engine.
#[derive(Clone)]
pub struct StateTree {
    root: ObjectRef,
}

impl StateTree {
    /// Create a tree with an empty root map.
    pub fn new() -> Self {
        Self {
            root: ObjectRef::new_map(),
        }
    }

    /// Seed a tree from a JSON object.
    pub fn from_json(json: &serde_json::Value) -> Result<Self, ModelError> {
        match Value::from_json(json) {
            Value::Object(root) if !root.is_list() => Ok(Self { root }),
            other => Err(ModelError::Json(format!(
                "state tree root must be an object, got {}",
                other.type_name()
            ))),
        }
    }

    pub fn root(&self) -> &ObjectRef {
        &self.root
    }

    /// Resolve `path` to the value stored there.
    ///
    /// Reads may write: every intermediate segment that is missing, `Undefined`
    /// or `Null` is replaced by an empty map, and a missing final segment is
    /// created holding `Undefined`. Containers are returned as aliasing handles.
    /// An intermediate segment holding a primitive fails with
    /// [`ModelError::PathConflict`].
    pub fn resolve(&self, path: &ModelPath) -> Result<Value, ModelError> {
        let (parents, last) = path.split_last();
        let node = self.walk(path, parents, true)?;
        match node.get(last) {
            Some(value) => Ok(value),
            None => {
                node.set(last, Value::Undefined)?;
                trace!("resolve: created '{}' as undefined", path);
                Ok(Value::Undefined)
            }
        }
    }

    /// Parse and resolve a dotted path string.
    pub fn resolve_str(&self, path: &str) -> Result<Value, ModelError> {
        self.resolve(&ModelPath::parse(path)?)
    }

    /// Read the value at `path` without creating anything.
    pub fn get(&self, path: &str) -> Result<Option<Value>, ModelError> {
        let path = ModelPath::parse(path)?;
        let mut node = self.root.clone();
        let (parents, last) = path.split_last();
        for seg in parents {
            match node.get(seg) {
                Some(Value::Object(obj)) => node = obj,
                _ => return Ok(None),
            }
        }
        Ok(node.get(last))
    }

    /// Store `value` at `path`, creating intermediate maps as `resolve` does.
    /// Returns the previous value.
    pub fn set(&self, path: &str, value: impl Into<Value>) -> Result<Option<Value>, ModelError> {
        let path = ModelPath::parse(path)?;
        let (parents, last) = path.split_last();
        let node = self.walk(&path, parents, true)?;
        node.set(last, value.into())
    }

    /// Remove the value at `path`. Missing intermediates are not created.
    pub fn remove(&self, path: &str) -> Result<Option<Value>, ModelError> {
        let path = ModelPath::parse(path)?;
        let (parents, last) = path.split_last();
        match self.walk(&path, parents, false) {
            Ok(node) => Ok(node.remove(last)),
            Err(ModelError::PathConflict { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Walk `parents` from the root. With `vivify` unset, a missing segment is
    /// reported as a conflict so callers can treat it as absent.
    fn walk(
        &self,
        path: &ModelPath,
        parents: &[String],
        vivify: bool,
    ) -> Result<ObjectRef, ModelError> {
        let mut node = self.root.clone();
        for (i, seg) in parents.iter().enumerate() {
            node = match node.get(seg) {
                Some(Value::Object(obj)) => obj,
                None | Some(Value::Undefined) | Some(Value::Null) if vivify => {
                    let created = ObjectRef::new_map();
                    node.set(seg, Value::Object(created.clone()))?;
                    trace!("resolve: created container '{}'", path.prefix(i + 1));
                    created
                }
                _ => {
                    return Err(ModelError::PathConflict {
                        path: path.to_string(),
                        segment: path.prefix(i + 1),
                    })
                }
            };
        }
        Ok(node)
    }
}

impl Default for StateTree {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StateTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateTree").field("root", &self.root).finish()
    }
}
