//! Structural snapshots of model values.
//!
//! A [`Snapshot`] is a deep copy of a value's own keys into fresh containers.
//! It never shares a container with its source, so later writes to the live
//! tree cannot leak into the baseline it is compared against.

use hashbrown::HashSet;

use crate::error::{ModelError, RecursionReason};
use crate::{ObjectRef, Value, DEFAULT_MAX_DEPTH};

/// Independent deep copy of a model value, owned by whoever took it.
#[derive(Debug, Clone, Default)]
pub struct Snapshot(Value);

impl Snapshot {
    /// Take a snapshot of `value` with the default depth limit.
    pub fn take(value: &Value) -> Result<Self, ModelError> {
        deep_clone(value, DEFAULT_MAX_DEPTH)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

struct Frame {
    src: ObjectRef,
    dst: ObjectRef,
    keys: Vec<String>,
    next: usize,
    key: Option<String>,
}

impl Frame {
    fn new(src: ObjectRef, dst: ObjectRef, key: Option<String>) -> Self {
        let keys = src.keys();
        Self {
            src,
            dst,
            keys,
            next: 0,
            key,
        }
    }
}

/// Dotted location of the frame on top of the stack, for error reports.
fn breadcrumb(stack: &[Frame], child: &str) -> String {
    stack
        .iter()
        .filter_map(|f| f.key.as_deref())
        .chain(std::iter::once(child))
        .collect::<Vec<_>>()
        .join(".")
}

/// Deep-copy `value` into fresh containers.
///
/// Primitives are returned unchanged. Containers are walked iteratively; a
/// container that reappears on its own ancestor chain, or nesting deeper than
/// `max_depth`, fails with [`ModelError::RecursionLimit`]. Containers shared
/// by siblings (not ancestors) are copied once per occurrence.
pub fn deep_clone(value: &Value, max_depth: usize) -> Result<Snapshot, ModelError> {
    let Value::Object(src) = value else {
        return Ok(Snapshot(value.clone()));
    };
    let root = src.empty_like();
    let mut ancestors: HashSet<usize> = HashSet::new();
    ancestors.insert(src.addr());
    let mut stack = vec![Frame::new(src.clone(), root.clone(), None)];

    while let Some(frame) = stack.last_mut() {
        if frame.next == frame.keys.len() {
            if let Some(done) = stack.pop() {
                ancestors.remove(&done.src.addr());
            }
            continue;
        }
        let key = frame.keys[frame.next].clone();
        frame.next += 1;
        let child = frame.src.get(&key).unwrap_or_default();
        let dst = frame.dst.clone();
        let child_src = match child {
            Value::Object(obj) => obj,
            primitive => {
                dst.append(key, primitive);
                continue;
            }
        };

        if ancestors.contains(&child_src.addr()) {
            return Err(ModelError::RecursionLimit {
                path: breadcrumb(&stack, &key),
                reason: RecursionReason::Cycle,
            });
        }
        if stack.len() >= max_depth {
            return Err(ModelError::RecursionLimit {
                path: breadcrumb(&stack, &key),
                reason: RecursionReason::DepthExceeded(max_depth),
            });
        }
        let child_dst = child_src.empty_like();
        dst.append(key.clone(), Value::Object(child_dst.clone()));
        ancestors.insert(child_src.addr());
        stack.push(Frame::new(child_src, child_dst, Some(key)));
    }

    Ok(Snapshot(Value::Object(root)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::identical;

    fn sample() -> Value {
        Value::map([
            ("name", Value::from("Ada")),
            ("zero", Value::from(0)),
            ("empty", Value::from("")),
            ("off", Value::from(false)),
            ("nothing", Value::Null),
            (
                "tags",
                Value::list([Value::from("math"), Value::map([("level", Value::from(3))])]),
            ),
        ])
    }

    #[test]
    fn primitives_snapshot_to_themselves() {
        let snap = Snapshot::take(&Value::from(42)).unwrap();
        assert_eq!(snap.as_value().as_f64(), Some(42.0));
        assert!(Snapshot::take(&Value::Undefined).unwrap().as_value().is_undefined());
    }

    #[test]
    fn snapshot_preserves_falsy_values_and_kinds() {
        let v = sample();
        let snap = Snapshot::take(&v).unwrap();
        let copy = snap.as_value();
        assert_eq!(copy.get("zero").and_then(|z| z.as_f64()), Some(0.0));
        assert_eq!(copy.get("empty").unwrap().as_str(), Some(""));
        assert_eq!(copy.get("off").and_then(|b| b.as_bool()), Some(false));
        assert!(matches!(copy.get("nothing"), Some(Value::Null)));
        assert!(copy.get("tags").unwrap().as_object().unwrap().is_list());
        assert!(identical(&v, copy).unwrap());
    }

    #[test]
    fn snapshot_never_aliases_source() {
        let v = sample();
        let snap = Snapshot::take(&v).unwrap();
        assert!(!snap.as_value().same_ref(&v));
        let live_tags = v.get("tags").unwrap();
        assert!(!snap.as_value().get("tags").unwrap().same_ref(&live_tags));

        live_tags
            .get("1")
            .unwrap()
            .as_object()
            .unwrap()
            .set("level", Value::from(4))
            .unwrap();
        let frozen = snap.as_value().get("tags").unwrap().get("1").unwrap();
        assert_eq!(frozen.get("level").and_then(|l| l.as_f64()), Some(3.0));
        assert!(!identical(&v, snap.as_value()).unwrap());
    }

    #[test]
    fn shared_siblings_are_copied_separately() {
        let shared = Value::map([("n", Value::from(1))]);
        let v = Value::map([("a", shared.clone()), ("b", shared)]);
        let snap = Snapshot::take(&v).unwrap();
        let a = snap.as_value().get("a").unwrap();
        let b = snap.as_value().get("b").unwrap();
        assert!(!a.same_ref(&b));
    }

    #[test]
    fn cycle_is_reported_not_followed() {
        let v = Value::map([("child", Value::empty_map())]);
        let child = v.get("child").unwrap();
        child.as_object().unwrap().set("parent", v.clone()).unwrap();

        let err = Snapshot::take(&v).unwrap_err();
        match err {
            ModelError::RecursionLimit { path, reason } => {
                assert_eq!(path, "child.parent");
                assert_eq!(reason, RecursionReason::Cycle);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn depth_limit_is_enforced() {
        let mut v = Value::from(1);
        for _ in 0..10 {
            v = Value::map([("inner", v)]);
        }
        assert!(deep_clone(&v, 32).is_ok());
        assert!(matches!(
            deep_clone(&v, 4),
            Err(ModelError::RecursionLimit {
                reason: RecursionReason::DepthExceeded(4),
                ..
            })
        ));
    }
}
