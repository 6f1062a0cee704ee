//! Picture (ISP) settings are an open mapping whose value types are dictated by
//! what the NVR currently stores. Values supplied by a caller are coerced to
//! the kind of the stored value before being written back.

use std::fmt;

use serde_json::{Map, Number, Value};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKind {
    Integer,
    Float,
    Text,
    Boolean,
}

impl SettingKind {
    /// The kind of a stored value, or `None` for nulls, arrays and objects.
    pub fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(_) => Some(SettingKind::Boolean),
            Value::Number(n) if n.is_f64() => Some(SettingKind::Float),
            Value::Number(_) => Some(SettingKind::Integer),
            Value::String(_) => Some(SettingKind::Text),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SettingKind::Integer => "int",
            SettingKind::Float => "float",
            SettingKind::Text => "str",
            SettingKind::Boolean => "bool",
        }
    }
}

impl fmt::Display for SettingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn value_type_name(value: &Value) -> &'static str {
    match SettingKind::of(value) {
        Some(kind) => kind.name(),
        None => match value {
            Value::Null => "null",
            Value::Array(_) => "list",
            _ => "dict",
        },
    }
}

/// Converts `value` to `kind`, or returns `None` when no conversion exists.
///
/// * integers accept integer strings, truncate floats and map booleans to 0/1
/// * floats accept numeric strings, integers and booleans
/// * text renders booleans as `True`/`False` and numbers in decimal
/// * booleans treat non-empty strings and non-zero numbers as true
pub fn coerce_to(kind: SettingKind, value: &Value) -> Option<Value> {
    match kind {
        SettingKind::Integer => match value {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
                .map(Value::from),
            Value::String(s) => s.trim().parse::<i64>().ok().map(Value::from),
            Value::Bool(b) => Some(Value::from(i64::from(*b))),
            _ => None,
        },
        SettingKind::Float => match value {
            Value::Number(n) => n.as_f64().and_then(Number::from_f64).map(Value::Number),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number),
            Value::Bool(b) => Number::from_f64(if *b { 1.0 } else { 0.0 }).map(Value::Number),
            _ => None,
        },
        SettingKind::Text => match value {
            Value::String(s) => Some(Value::String(s.clone())),
            Value::Bool(true) => Some(Value::String("True".to_string())),
            Value::Bool(false) => Some(Value::String("False".to_string())),
            Value::Number(n) => Some(Value::String(n.to_string())),
            _ => None,
        },
        SettingKind::Boolean => match value {
            Value::Bool(b) => Some(Value::Bool(*b)),
            Value::String(s) => Some(Value::Bool(!s.is_empty())),
            Value::Number(n) => Some(Value::Bool(n.as_f64().is_some_and(|f| f != 0.0))),
            Value::Null => Some(Value::Bool(false)),
            _ => None,
        },
    }
}

/// Coerces `value` to the kind of `current`, naming `key` in the error.
pub fn coerce_like(key: &str, current: &Value, value: &Value) -> Result<Value> {
    let kind = SettingKind::of(current).ok_or_else(|| {
        Error::InvalidArgument(format!(
            "Setting `{key}' holds a {} and cannot be set",
            value_type_name(current)
        ))
    })?;

    coerce_to(kind, value).ok_or_else(|| {
        Error::InvalidArgument(format!(
            "Setting `{key}' requires {kind} not {}",
            value_type_name(value)
        ))
    })
}

/// Applies `requested` onto `current` in place, coercing each value to the
/// kind already stored under that key. Nothing is modified on error.
pub fn apply(current: &mut Map<String, Value>, requested: &Map<String, Value>) -> Result<()> {
    let mut coerced = Vec::with_capacity(requested.len());

    for (key, value) in requested {
        let existing = current
            .get(key)
            .ok_or_else(|| Error::InvalidArgument(format!("Unknown setting `{key}'")))?;
        coerced.push((key.clone(), coerce_like(key, existing, value)?));
    }

    current.extend(coerced);
    Ok(())
}

/// Keys from `requested` whose value, coerced to the kind the server returned,
/// differs from what the server reports after the write.
///
/// This check coerces towards the *result* while [`apply`] coerces towards the
/// value stored *before* the write; the two can disagree when the server
/// changes a setting's type.
pub fn rejected_settings(requested: &Map<String, Value>, result: &Map<String, Value>) -> Vec<String> {
    requested
        .iter()
        .filter(|(key, value)| match result.get(*key) {
            Some(actual) => SettingKind::of(actual)
                .and_then(|kind| coerce_to(kind, value))
                .is_none_or(|coerced| !values_equal(&coerced, actual)),
            None => true,
        })
        .map(|(key, _)| key.clone())
        .collect()
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}
