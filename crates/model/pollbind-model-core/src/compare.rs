//! Structural equality between a live value and a snapshot.
//!
//! Two containers are identical when every key present on either side maps to
//! identical values: containers on both sides are compared recursively,
//! anything else with [`loose_eq`]. A container on one side facing a primitive
//! (or a missing key) on the other is a difference.

use hashbrown::HashSet;

use crate::coercion::loose_eq;
use crate::error::{ModelError, RecursionReason};
use crate::{ObjectRef, Value, DEFAULT_MAX_DEPTH};

/// Compare two values with the default depth limit.
pub fn identical(a: &Value, b: &Value) -> Result<bool, ModelError> {
    identical_with_limit(a, b, DEFAULT_MAX_DEPTH)
}

struct Frame {
    a: ObjectRef,
    b: ObjectRef,
    keys: Vec<String>,
    next: usize,
    key: Option<String>,
}

impl Frame {
    fn new(a: ObjectRef, b: ObjectRef, key: Option<String>) -> Self {
        let keys = union_keys(&a, &b);
        Self {
            a,
            b,
            keys,
            next: 0,
            key,
        }
    }
}

/// Own keys of `a` followed by the keys only `b` has.
fn union_keys(a: &ObjectRef, b: &ObjectRef) -> Vec<String> {
    let mut keys = a.keys();
    let seen: HashSet<String> = keys.iter().cloned().collect();
    keys.extend(b.keys().into_iter().filter(|k| !seen.contains(k)));
    keys
}

/// A map never equals a list, and lists carry their length as an own key, so
/// two lists of different length differ.
fn shapes_differ(a: &ObjectRef, b: &ObjectRef) -> bool {
    match (a.is_list(), b.is_list()) {
        (true, true) => a.len() != b.len(),
        (false, false) => false,
        _ => true,
    }
}

fn breadcrumb(stack: &[Frame], child: &str) -> String {
    stack
        .iter()
        .filter_map(|f| f.key.as_deref())
        .chain(std::iter::once(child))
        .collect::<Vec<_>>()
        .join(".")
}

/// Structural comparison of `a` and `b`, short-circuiting on the first
/// difference.
///
/// Missing keys read as [`Value::Undefined`]. Aliases of the same container
/// compare equal without descending. Both sides are walked iteratively; a
/// cycle present on both sides, or nesting deeper than `max_depth`, fails
/// with [`ModelError::RecursionLimit`].
pub fn identical_with_limit(a: &Value, b: &Value, max_depth: usize) -> Result<bool, ModelError> {
    let (root_a, root_b) = match (a, b) {
        (Value::Object(x), Value::Object(y)) => (x, y),
        (Value::Object(_), _) | (_, Value::Object(_)) => return Ok(false),
        _ => return Ok(loose_eq(a, b)),
    };
    if root_a.ptr_eq(root_b) {
        return Ok(true);
    }
    if shapes_differ(root_a, root_b) {
        return Ok(false);
    }

    let mut ancestors_a: HashSet<usize> = HashSet::new();
    let mut ancestors_b: HashSet<usize> = HashSet::new();
    ancestors_a.insert(root_a.addr());
    ancestors_b.insert(root_b.addr());
    let mut stack = vec![Frame::new(root_a.clone(), root_b.clone(), None)];

    while let Some(frame) = stack.last_mut() {
        if frame.next == frame.keys.len() {
            if let Some(done) = stack.pop() {
                ancestors_a.remove(&done.a.addr());
                ancestors_b.remove(&done.b.addr());
            }
            continue;
        }
        let key = frame.keys[frame.next].clone();
        frame.next += 1;
        let left = frame.a.get(&key).unwrap_or_default();
        let right = frame.b.get(&key).unwrap_or_default();

        let (child_a, child_b) = match (left, right) {
            (Value::Object(x), Value::Object(y)) => (x, y),
            (Value::Object(_), _) | (_, Value::Object(_)) => return Ok(false),
            (x, y) => {
                if loose_eq(&x, &y) {
                    continue;
                }
                return Ok(false);
            }
        };
        if child_a.ptr_eq(&child_b) {
            continue;
        }
        if shapes_differ(&child_a, &child_b) {
            return Ok(false);
        }
        if ancestors_a.contains(&child_a.addr()) && ancestors_b.contains(&child_b.addr()) {
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
        ancestors_a.insert(child_a.addr());
        ancestors_b.insert(child_b.addr());
        stack.push(Frame::new(child_a, child_b, Some(key)));
    }

    Ok(true)
}
