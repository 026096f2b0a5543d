//! Dynamic values held by the shared model tree.
//!
//! A [`Value`] is either a primitive or an [`ObjectRef`], a shared handle to an
//! interior-mutable container. Cloning a `Value` clones the handle, not the
//! container, so two clones of the same object observe each other's writes.
//! Use [`crate::snapshot::deep_clone`] for an independent copy.

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::error::ModelError;
use crate::MAX_LIST_GAP;

/// Insertion-ordered own keys of a map container.
pub type Map = IndexMap<String, Value>;

/// Depth after which `Debug`/`Display` stop descending into containers.
const FORMAT_DEPTH: usize = 16;

#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    Object(ObjectRef),
}

/// Container payload behind an [`ObjectRef`].
pub enum Object {
    Map(Map),
    List(Vec<Value>),
}

/// Shared handle to a container. Equality of handles is identity ([`ObjectRef::ptr_eq`]).
#[derive(Clone)]
pub struct ObjectRef(Rc<RefCell<Object>>);

impl ObjectRef {
    pub fn new(object: Object) -> Self {
        Self(Rc::new(RefCell::new(object)))
    }

    pub fn new_map() -> Self {
        Self::new(Object::Map(Map::new()))
    }

    pub fn new_list() -> Self {
        Self::new(Object::List(Vec::new()))
    }

    /// Fresh empty container of the same kind as `self`.
    pub(crate) fn empty_like(&self) -> Self {
        if self.is_list() {
            Self::new_list()
        } else {
            Self::new_map()
        }
    }

    pub fn borrow(&self) -> Ref<'_, Object> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, Object> {
        self.0.borrow_mut()
    }

    /// True when both handles point at the same container.
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Address of the container, used as its identity in traversal bookkeeping.
    pub(crate) fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }

    pub fn is_list(&self) -> bool {
        matches!(&*self.borrow(), Object::List(_))
    }

    pub fn len(&self) -> usize {
        match &*self.borrow() {
            Object::Map(map) => map.len(),
            Object::List(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Own keys in iteration order. List keys are their decimal indices.
    pub fn keys(&self) -> Vec<String> {
        match &*self.borrow() {
            Object::Map(map) => map.keys().cloned().collect(),
            Object::List(items) => (0..items.len()).map(|i| i.to_string()).collect(),
        }
    }

    /// Value stored under `key`; the returned value aliases nested containers.
    pub fn get(&self, key: &str) -> Option<Value> {
        match &*self.borrow() {
            Object::Map(map) => map.get(key).cloned(),
            Object::List(items) => list_index(key).and_then(|i| items.get(i).cloned()),
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        match &*self.borrow() {
            Object::Map(map) => map.contains_key(key),
            Object::List(items) => list_index(key).is_some_and(|i| i < items.len()),
        }
    }

    /// Store `value` under `key`, returning the previous value.
    ///
    /// Lists only accept decimal index keys; writing past the end pads the
    /// gap with [`Value::Undefined`]. A gap wider than [`MAX_LIST_GAP`] fails
    /// with [`ModelError::InvalidKey`] and leaves the list untouched.
    pub fn set(&self, key: &str, value: Value) -> Result<Option<Value>, ModelError> {
        match &mut *self.borrow_mut() {
            Object::Map(map) => Ok(map.insert(key.to_string(), value)),
            Object::List(items) => {
                let index = list_index(key).ok_or_else(|| ModelError::InvalidKey {
                    key: key.to_string(),
                    reason: "list keys must be decimal indices".to_string(),
                })?;
                if index < items.len() {
                    Ok(Some(std::mem::replace(&mut items[index], value)))
                } else if index - items.len() > MAX_LIST_GAP {
                    Err(ModelError::InvalidKey {
                        key: key.to_string(),
                        reason: format!("more than {MAX_LIST_GAP} slots past the end of the list"),
                    })
                } else {
                    items.resize(index, Value::Undefined);
                    items.push(value);
                    Ok(None)
                }
            }
        }
    }

    /// Remove `key`. Removing a list item leaves an `Undefined` hole so the
    /// remaining indices keep their keys.
    pub fn remove(&self, key: &str) -> Option<Value> {
        match &mut *self.borrow_mut() {
            Object::Map(map) => map.shift_remove(key),
            Object::List(items) => {
                let index = list_index(key)?;
                items
                    .get_mut(index)
                    .map(|slot| std::mem::replace(slot, Value::Undefined))
            }
        }
    }

    /// Append a value copied during traversal; keys arrive in the source's order.
    pub(crate) fn append(&self, key: String, value: Value) {
        match &mut *self.borrow_mut() {
            Object::Map(map) => {
                map.insert(key, value);
            }
            Object::List(items) => items.push(value),
        }
    }
}

/// Canonical decimal index (`"0"`, `"12"`, never `"01"` or `"+1"`).
fn list_index(key: &str) -> Option<usize> {
    let index: usize = key.parse().ok()?;
    (index.to_string() == key).then_some(index)
}

impl Value {
    /// A new map container holding `entries`.
    pub fn map<K, I>(entries: I) -> Value
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let map: Map = entries.into_iter().map(|(k, v)| (k.into(), v)).collect();
        Value::Object(ObjectRef::new(Object::Map(map)))
    }

    /// A new list container holding `items`.
    pub fn list<I: IntoIterator<Item = Value>>(items: I) -> Value {
        Value::Object(ObjectRef::new(Object::List(items.into_iter().collect())))
    }

    pub fn empty_map() -> Value {
        Value::Object(ObjectRef::new_map())
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// `Undefined` or `Null`.
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    /// Containers are structured; everything else is compared by value.
    pub fn is_structured(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Member lookup that treats primitives as having no keys.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.as_object().and_then(|obj| obj.get(key))
    }

    /// True when both values are handles to the same container.
    pub fn same_ref(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::Text(_) => "text",
            Value::Object(obj) if obj.is_list() => "list",
            Value::Object(_) => "map",
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<ObjectRef> for Value {
    fn from(obj: ObjectRef) -> Self {
        Value::Object(obj)
    }
}

/// Host-style number formatting: integral values print without a fraction.
pub(crate) fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let text = if n > 0.0 { "Infinity" } else { "-Infinity" };
        text.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{n:.0}")
    } else {
        n.to_string()
    }
}

fn write_display(value: &Value, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
    match value {
        Value::Undefined | Value::Null => Ok(()),
        Value::Bool(b) => write!(f, "{b}"),
        Value::Number(n) => f.write_str(&format_number(*n)),
        Value::Text(s) => f.write_str(s),
        Value::Object(obj) => {
            let Ok(object) = obj.0.try_borrow() else {
                return Ok(());
            };
            match &*object {
                Object::Map(_) => f.write_str("[object Object]"),
                Object::List(items) => {
                    if depth >= FORMAT_DEPTH {
                        return Ok(());
                    }
                    for (i, item) in items.iter().enumerate() {
                        if i > 0 {
                            f.write_str(",")?;
                        }
                        write_display(item, f, depth + 1)?;
                    }
                    Ok(())
                }
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_display(self, f, 0)
    }
}

struct DebugValue<'a>(&'a Value, usize);

impl fmt::Debug for DebugValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let DebugValue(value, depth) = *self;
        match value {
            Value::Undefined => f.write_str("Undefined"),
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Number(n) => write!(f, "Number({n})"),
            Value::Text(s) => write!(f, "Text({s:?})"),
            Value::Object(obj) => fmt::Debug::fmt(&DebugObject(obj, depth), f),
        }
    }
}

struct DebugObject<'a>(&'a ObjectRef, usize);

impl fmt::Debug for DebugObject<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let DebugObject(obj, depth) = *self;
        if depth >= FORMAT_DEPTH {
            return f.write_str("{..}");
        }
        let Ok(object) = obj.0.try_borrow() else {
            return f.write_str("<borrowed>");
        };
        match &*object {
            Object::Map(map) => f
                .debug_map()
                .entries(map.iter().map(|(k, v)| (k, DebugValue(v, depth + 1))))
                .finish(),
            Object::List(items) => f
                .debug_list()
                .entries(items.iter().map(|v| DebugValue(v, depth + 1)))
                .finish(),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&DebugValue(self, 0), f)
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&DebugObject(self, 0), f)
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Object::Map(map) => f
                .debug_map()
                .entries(map.iter().map(|(k, v)| (k, DebugValue(v, 1))))
                .finish(),
            Object::List(items) => f
                .debug_list()
                .entries(items.iter().map(|v| DebugValue(v, 1)))
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_alias_the_same_container() {
        let a = Value::empty_map();
        let b = a.clone();
        a.as_object().unwrap().set("x", Value::from(1)).unwrap();
        assert!(a.same_ref(&b));
        assert_eq!(b.get("x").and_then(|v| v.as_f64()), Some(1.0));
    }

    #[test]
    fn list_keys_are_indices() {
        let list = Value::list([Value::from("a"), Value::from("b")]);
        let obj = list.as_object().unwrap();
        assert_eq!(obj.keys(), vec!["0".to_string(), "1".to_string()]);
        assert!(obj.get("01").is_none());
        assert!(matches!(
            obj.set("name", Value::Null),
            Err(ModelError::InvalidKey { .. })
        ));
    }

    #[test]
    fn list_set_past_end_pads_with_undefined() {
        let list = Value::list([]);
        let obj = list.as_object().unwrap();
        obj.set("2", Value::from(true)).unwrap();
        assert_eq!(obj.len(), 3);
        assert!(obj.get("0").unwrap().is_undefined());
        assert_eq!(obj.get("2").and_then(|v| v.as_bool()), Some(true));
    }

    #[test]
    fn list_set_far_past_end_is_refused() {
        let list = Value::list([Value::from(1)]);
        let obj = list.as_object().unwrap();
        let limit = (1 + MAX_LIST_GAP).to_string();
        obj.set(&limit, Value::Null).unwrap();
        assert_eq!(obj.len(), MAX_LIST_GAP + 2);

        for key in ["999999999999999999", "100000000"] {
            assert!(matches!(
                obj.set(key, Value::Null),
                Err(ModelError::InvalidKey { .. })
            ));
        }
        assert_eq!(obj.len(), MAX_LIST_GAP + 2);
    }

    #[test]
    fn display_follows_host_string_conversion() {
        assert_eq!(Value::Undefined.to_string(), "");
        assert_eq!(Value::from(3).to_string(), "3");
        assert_eq!(Value::from(2.5).to_string(), "2.5");
        assert_eq!(Value::Number(f64::NAN).to_string(), "NaN");
        assert_eq!(Value::empty_map().to_string(), "[object Object]");
        let list = Value::list([Value::from(1), Value::Null, Value::from("x")]);
        assert_eq!(list.to_string(), "1,,x");
    }

    #[test]
    fn debug_of_cyclic_value_terminates() {
        let a = Value::empty_map();
        a.as_object().unwrap().set("me", a.clone()).unwrap();
        let rendered = format!("{a:?}");
        assert!(rendered.contains("{..}"));
    }
}
