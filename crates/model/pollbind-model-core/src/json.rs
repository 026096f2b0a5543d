//! Conversion between model values and `serde_json` values.

use serde_json::{Map as JsonMap, Number, Value as JsonValue};

use crate::error::{ModelError, RecursionReason};
use crate::value::{Object, Value};
use crate::DEFAULT_MAX_DEPTH;

impl Value {
    /// Build a fresh value graph from JSON. Objects become maps, arrays lists.
    pub fn from_json(json: &JsonValue) -> Value {
        match json {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(*b),
            JsonValue::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            JsonValue::String(s) => Value::Text(s.clone()),
            JsonValue::Array(items) => Value::list(items.iter().map(Value::from_json)),
            JsonValue::Object(map) => {
                Value::map(map.iter().map(|(k, v)| (k.clone(), Value::from_json(v))))
            }
        }
    }

    /// Serialize to JSON the way a host serializer would: `Undefined` map
    /// entries are dropped, `Undefined` list items and non-finite numbers
    /// become `null`. Cyclic graphs fail with [`ModelError::RecursionLimit`].
    pub fn to_json(&self) -> Result<JsonValue, ModelError> {
        let mut ancestors = Vec::new();
        to_json_inner(self, &mut ancestors, &mut Vec::new())
    }
}

fn number_to_json(n: f64) -> JsonValue {
    if !n.is_finite() {
        return JsonValue::Null;
    }
    if n.fract() == 0.0 && n.abs() < 9.0e15 {
        return JsonValue::from(n as i64);
    }
    Number::from_f64(n).map_or(JsonValue::Null, JsonValue::Number)
}

fn to_json_inner(
    value: &Value,
    ancestors: &mut Vec<usize>,
    trail: &mut Vec<String>,
) -> Result<JsonValue, ModelError> {
    let obj = match value {
        Value::Undefined | Value::Null => return Ok(JsonValue::Null),
        Value::Bool(b) => return Ok(JsonValue::Bool(*b)),
        Value::Number(n) => return Ok(number_to_json(*n)),
        Value::Text(s) => return Ok(JsonValue::String(s.clone())),
        Value::Object(obj) => obj,
    };
    if ancestors.contains(&obj.addr()) {
        return Err(ModelError::RecursionLimit {
            path: trail.join("."),
            reason: RecursionReason::Cycle,
        });
    }
    if ancestors.len() >= DEFAULT_MAX_DEPTH {
        return Err(ModelError::RecursionLimit {
            path: trail.join("."),
            reason: RecursionReason::DepthExceeded(DEFAULT_MAX_DEPTH),
        });
    }
    ancestors.push(obj.addr());
    let object = obj.borrow();
    let out = match &*object {
        Object::Map(map) => {
            let mut out = JsonMap::new();
            for (k, v) in map {
                if v.is_undefined() {
                    continue;
                }
                trail.push(k.clone());
                let json = to_json_inner(v, ancestors, trail)?;
                trail.pop();
                out.insert(k.clone(), json);
            }
            JsonValue::Object(out)
        }
        Object::List(items) => {
            let mut out = Vec::with_capacity(items.len());
            for (i, v) in items.iter().enumerate() {
                trail.push(i.to_string());
                out.push(to_json_inner(v, ancestors, trail)?);
                trail.pop();
            }
            JsonValue::Array(out)
        }
    };
    ancestors.pop();
    Ok(out)
}
