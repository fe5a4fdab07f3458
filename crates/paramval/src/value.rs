//! # Values and the Key Boundary
//!
//! Validated data is a `serde_json::Value`. This module provides the
//! runtime-type, length, and ordering helpers the built-in rules share,
//! and the conversions that bring foreign data into that representation.
//!
//! ## Canonical Keys
//!
//! Every map key inside validated data is a `String`. Data produced by
//! [`to_data`] or [`yaml_to_data`] has integer and boolean keys converted
//! to their string form once, at the boundary, so field lookup in the
//! engine is a single exact match.

use std::cmp::Ordering;
use std::fmt;

use serde::{Serialize, Serializer};
use serde_json::{Map, Number, Value};

/// Runtime type of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// `null`.
    Null,
    /// `true` or `false`.
    Boolean,
    /// A number representable as `i64` or `u64`.
    Integer,
    /// Any other number.
    Float,
    /// A string.
    String,
    /// An ordered sequence.
    Array,
    /// A map of string keys to values.
    Hash,
}

impl ValueKind {
    /// Determine the runtime type of a value.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Boolean,
            Value::Number(n) if n.is_i64() || n.is_u64() => ValueKind::Integer,
            Value::Number(_) => ValueKind::Float,
            Value::String(_) => ValueKind::String,
            Value::Array(_) => ValueKind::Array,
            Value::Object(_) => ValueKind::Hash,
        }
    }

    /// Parse a type name. Case-insensitive; accepts common aliases.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "null" | "nil" => Some(ValueKind::Null),
            "boolean" | "bool" => Some(ValueKind::Boolean),
            "integer" | "int" => Some(ValueKind::Integer),
            "float" => Some(ValueKind::Float),
            "string" | "str" => Some(ValueKind::String),
            "array" | "sequence" | "list" => Some(ValueKind::Array),
            "hash" | "object" | "map" => Some(ValueKind::Hash),
            _ => None,
        }
    }

    /// Canonical lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Boolean => "boolean",
            ValueKind::Integer => "integer",
            ValueKind::Float => "float",
            ValueKind::String => "string",
            ValueKind::Array => "array",
            ValueKind::Hash => "hash",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A scalar bound used by ordered comparisons (`min`, `max`, `in_range`).
#[derive(Debug, Clone, PartialEq)]
pub enum Bound {
    /// Numeric bound.
    Number(Number),
    /// String bound, compared lexicographically.
    Text(String),
}

impl Bound {
    /// Interpret a rule argument as a bound. Only numbers and strings
    /// are ordered.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => Some(Bound::Number(n.clone())),
            Value::String(s) => Some(Bound::Text(s.clone())),
            _ => None,
        }
    }

    fn as_value(&self) -> Value {
        match self {
            Bound::Number(n) => Value::Number(n.clone()),
            Bound::Text(s) => Value::String(s.clone()),
        }
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::Number(n) => write!(f, "{n}"),
            Bound::Text(s) => f.write_str(s),
        }
    }
}

/// Compare two numbers. Exact for integer pairs, `f64` otherwise.
fn compare_numbers(a: &Number, b: &Number) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return Some(x.cmp(&y));
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return Some(x.cmp(&y));
    }
    a.as_f64()?.partial_cmp(&b.as_f64()?)
}

/// Order a value relative to a bound.
///
/// Numbers compare numerically and strings lexicographically. Any other
/// pairing (including null) is incomparable and returns `None`.
pub fn compare(value: &Value, bound: &Bound) -> Option<Ordering> {
    match (value, bound) {
        (Value::Number(a), Bound::Number(b)) => compare_numbers(a, b),
        (Value::String(a), Bound::Text(b)) => Some(a.as_str().cmp(b.as_str())),
        _ => None,
    }
}

/// Order two bounds of the same kind. Used to reject inverted ranges.
pub fn compare_bounds(low: &Bound, high: &Bound) -> Option<Ordering> {
    compare(&low.as_value(), high)
}

/// Structural equality that compares numbers by value, so `1` equals
/// `1.0`. Arrays compare element-wise in order; maps compare by key set
/// and per-key value, ignoring entry order.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => compare_numbers(x, y) == Some(Ordering::Equal),
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(xm), Value::Object(ym)) => {
            xm.len() == ym.len()
                && xm
                    .iter()
                    .all(|(k, x)| ym.get(k).is_some_and(|y| values_equal(x, y)))
        }
        _ => a == b,
    }
}

/// Element count: characters of a string, elements of an array, entries
/// of a map. Scalars have no length.
pub fn element_count(value: &Value) -> Option<usize> {
    match value {
        Value::String(s) => Some(s.chars().count()),
        Value::Array(items) => Some(items.len()),
        Value::Object(map) => Some(map.len()),
        _ => None,
    }
}

/// Render a value for a human-readable message. Strings render bare,
/// everything else as compact JSON.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Render a collection argument as a comma-separated list.
pub fn display_list(value: &Value) -> String {
    match value {
        Value::Array(items) => items
            .iter()
            .map(display_value)
            .collect::<Vec<_>>()
            .join(", "),
        other => display_value(other),
    }
}

/// Convert any serializable value into validated data.
///
/// `serde_json` stringifies integer and boolean map keys, so a
/// `HashMap<u32, _>` becomes a map keyed by `"1"`, `"2"`, and so on.
///
/// # Errors
///
/// Returns the `serde_json` error if the value cannot be represented as
/// JSON (e.g. a map with composite keys).
pub fn to_data<T: Serialize + ?Sized>(value: &T) -> Result<Value, serde_json::Error> {
    serde_json::to_value(value)
}

/// Convert a `serde_yaml::Value` into validated data.
///
/// YAML has a richer type system than JSON (tags, non-string keys). Tags
/// are dropped, and numeric or boolean map keys become their string form.
///
/// # Errors
///
/// Returns a description of the first value that has no JSON equivalent:
/// a non-finite float or a composite (sequence or mapping) map key.
pub fn yaml_to_data(yaml: &serde_yaml::Value) -> Result<Value, String> {
    match yaml {
        serde_yaml::Value::Null => Ok(Value::Null),
        serde_yaml::Value::Bool(b) => Ok(Value::Bool(*b)),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Number(Number::from(i)))
            } else if let Some(u) = n.as_u64() {
                Ok(Value::Number(Number::from(u)))
            } else if let Some(f) = n.as_f64() {
                Number::from_f64(f)
                    .map(Value::Number)
                    .ok_or_else(|| format!("cannot represent float {f} as data"))
            } else {
                Err(format!("unsupported YAML number: {n:?}"))
            }
        }
        serde_yaml::Value::String(s) => Ok(Value::String(s.clone())),
        serde_yaml::Value::Sequence(seq) => {
            let items: Result<Vec<Value>, String> = seq.iter().map(yaml_to_data).collect();
            Ok(Value::Array(items?))
        }
        serde_yaml::Value::Mapping(mapping) => {
            let mut map = Map::new();
            for (k, v) in mapping {
                map.insert(yaml_key(k)?, yaml_to_data(v)?);
            }
            Ok(Value::Object(map))
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_data(&tagged.value),
    }
}

fn yaml_key(key: &serde_yaml::Value) -> Result<String, String> {
    match key {
        serde_yaml::Value::String(s) => Ok(s.clone()),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        serde_yaml::Value::Null => Ok("null".to_string()),
        serde_yaml::Value::Tagged(tagged) => yaml_key(&tagged.value),
        other => Err(format!("unsupported map key: {other:?}")),
    }
}

/// Parse YAML text into validated data.
pub fn yaml_str_to_data(text: &str) -> Result<Value, String> {
    let yaml: serde_yaml::Value =
        serde_yaml::from_str(text).map_err(|e| format!("invalid YAML: {e}"))?;
    yaml_to_data(&yaml)
}

pub(crate) fn serialize_display<T: fmt::Display, S: Serializer>(
    value: &T,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}
