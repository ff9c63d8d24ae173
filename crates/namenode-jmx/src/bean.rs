//! Field resolution and coercion on a single bean.
//!
//! Beans are untyped `serde_json` maps; every step checks the kind of the
//! value it is looking at instead of assuming the upstream shape.

use serde_json::{Map, Value};

use crate::error::FieldSkip;
use crate::mapping::{Coercion, FieldPath, ACTIVE_STATE};

pub type Bean = Map<String, Value>;

/// Short name of a JSON value's kind, for diagnostics.
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// The bean's `name` tag, if it has a string one.
pub fn bean_name(bean: &Bean) -> Option<&str> {
    bean.get("name").and_then(Value::as_str)
}

/// Look up `path` in `bean`, descending at most one sub-mapping.
pub fn resolve<'a>(bean: &'a Bean, path: &FieldPath) -> Result<&'a Value, FieldSkip> {
    match *path {
        FieldPath::Field(key) => bean.get(key).ok_or(FieldSkip::Missing),
        FieldPath::Nested(outer, inner) => {
            let sub = bean.get(outer).ok_or(FieldSkip::Missing)?;
            let sub = sub.as_object().ok_or(FieldSkip::WrongKind {
                expected: "object",
                found: value_kind(sub),
            })?;
            sub.get(inner).ok_or(FieldSkip::Missing)
        }
    }
}

/// Turn a resolved value into a gauge reading.
pub fn coerce(value: &Value, coercion: Coercion) -> Result<f64, FieldSkip> {
    match coercion {
        Coercion::Number => match value {
            // `as_f64` yields nothing for a literal outside the f64 range.
            Value::Number(n) => match n.as_f64() {
                Some(n) if n.is_finite() => Ok(n),
                _ => Err(FieldSkip::NonFinite),
            },
            other => Err(FieldSkip::WrongKind {
                expected: "number",
                found: value_kind(other),
            }),
        },
        Coercion::ActiveFlag => match value.as_str() {
            Some(state) if state == ACTIVE_STATE => Ok(1.0),
            Some(_) => Ok(0.0),
            None => Err(FieldSkip::WrongKind {
                expected: "string",
                found: value_kind(value),
            }),
        },
    }
}
