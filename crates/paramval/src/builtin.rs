//! # Built-in Rules
//!
//! Predicates and default messages for every [`BuiltinRule`].
//!
//! Only `required` and `absent` inspect a null value; every other rule
//! fails on null. Values of the wrong type fail the rule rather than
//! erroring (`min` on a map, `format` on a number).

use std::cmp::Ordering;
use std::sync::Arc;

use serde_json::Value;

use crate::registry::{JsonParser, MessageContext, MessageFn};
use crate::rule::{BuiltinRule, RuleSet};
use crate::value::{
    compare, display_list, display_value, element_count, values_equal, ValueKind,
};

/// Result of evaluating a built-in rule.
#[derive(Debug)]
pub enum Verdict<'a> {
    /// The rule holds.
    Valid,
    /// The rule is violated.
    Invalid,
    /// The rule holds iff every element of the data validates against the
    /// nested rule set. The engine performs the recursion.
    Nested(&'a RuleSet),
}

impl From<bool> for Verdict<'_> {
    fn from(valid: bool) -> Self {
        if valid {
            Verdict::Valid
        } else {
            Verdict::Invalid
        }
    }
}

/// Evaluate a built-in rule against a resolved field value.
pub fn evaluate<'a>(rule: &'a BuiltinRule, value: &Value, json: &dyn JsonParser) -> Verdict<'a> {
    if value.is_null() {
        return match rule {
            BuiltinRule::Required => Verdict::Invalid,
            BuiltinRule::Absent => Verdict::Valid,
            BuiltinRule::ArrayOfHashes(nested) => Verdict::Nested(nested),
            _ => Verdict::Invalid,
        };
    }

    let valid = match rule {
        BuiltinRule::Required => true,
        BuiltinRule::Absent => false,
        BuiltinRule::NotBlank => value.as_str().is_some_and(|s| !s.is_empty()),
        BuiltinRule::NotIncludedIn(values) => !values.iter().any(|v| values_equal(v, value)),
        BuiltinRule::IncludedIn(values) => values.iter().any(|v| values_equal(v, value)),
        BuiltinRule::Format(re) => value.as_str().is_some_and(|s| re.is_match(s)),
        BuiltinRule::IsInteger => is_integer(value),
        BuiltinRule::IsFloat => is_float(value),
        BuiltinRule::MinLength(min) => element_count(value).is_some_and(|n| n >= *min),
        BuiltinRule::MaxLength(max) => element_count(value).is_some_and(|n| n <= *max),
        BuiltinRule::LengthRange { low, high } => {
            element_count(value).is_some_and(|n| (*low..=*high).contains(&n))
        }
        BuiltinRule::LengthEquals(len) => element_count(value) == Some(*len),
        BuiltinRule::Equals(expected) => values_equal(value, expected),
        BuiltinRule::Min(bound) => {
            matches!(compare(value, bound), Some(Ordering::Greater | Ordering::Equal))
        }
        BuiltinRule::Max(bound) => {
            matches!(compare(value, bound), Some(Ordering::Less | Ordering::Equal))
        }
        BuiltinRule::InRange { low, high } => {
            matches!(compare(value, low), Some(Ordering::Greater | Ordering::Equal))
                && matches!(compare(value, high), Some(Ordering::Less | Ordering::Equal))
        }
        BuiltinRule::IsArray => value.is_array(),
        BuiltinRule::IsHash => value.is_object(),
        BuiltinRule::IsJson => match value.as_str() {
            Some(text) => match json.parse(text) {
                Ok(()) => true,
                Err(reason) => {
                    tracing::trace!(%reason, "is_json: parse failed");
                    false
                }
            },
            None => false,
        },
        BuiltinRule::IsA(kinds) => kinds.contains(&ValueKind::of(value)),
        BuiltinRule::ArrayOfHashes(nested) => return Verdict::Nested(nested),
    };
    valid.into()
}

/// An integer, or a string of ASCII digits with an optional sign.
fn is_integer(value: &Value) -> bool {
    match value {
        Value::Number(n) => n.is_i64() || n.is_u64(),
        Value::String(s) => {
            let digits = s.strip_prefix(['+', '-']).unwrap_or(s);
            !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
        }
        _ => false,
    }
}

/// Any number, or a string that parses to a finite float.
fn is_float(value: &Value) -> bool {
    match value {
        Value::Number(_) => true,
        Value::String(s) => s.trim().parse::<f64>().is_ok_and(f64::is_finite),
        _ => false,
    }
}

fn range_display(arg: &Value) -> (String, String) {
    match arg {
        Value::Array(items) if items.len() == 2 => {
            (display_value(&items[0]), display_value(&items[1]))
        }
        Value::Object(map) => (
            map.get("low").map(display_value).unwrap_or_default(),
            map.get("high").map(display_value).unwrap_or_default(),
        ),
        other => (display_value(other), String::new()),
    }
}

fn type_names(arg: &Value) -> String {
    match arg {
        Value::Array(items) => items
            .iter()
            .map(display_value)
            .collect::<Vec<_>>()
            .join(" or "),
        other => display_value(other),
    }
}

/// Default message formatter for a built-in rule name.
pub fn default_message(name: &str) -> MessageFn {
    match name {
        "required" => Arc::new(|c: &MessageContext<'_>| format!("{} is required", c.key)),
        "absent" => Arc::new(|c: &MessageContext<'_>| format!("{} must not be present", c.key)),
        "not_blank" => Arc::new(|c: &MessageContext<'_>| format!("{} must not be blank", c.key)),
        "not_included_in" => Arc::new(|c: &MessageContext<'_>| {
            format!("{} must not be included in {}", c.key, display_list(c.arg))
        }),
        "included_in" => Arc::new(|c: &MessageContext<'_>| {
            format!("{} must be one of {}", c.key, display_list(c.arg))
        }),
        "format" => {
            Arc::new(|c: &MessageContext<'_>| format!("{} doesn't have the right format", c.key))
        }
        "is_integer" => {
            Arc::new(|c: &MessageContext<'_>| format!("{} should be an integer", c.key))
        }
        "is_float" => Arc::new(|c: &MessageContext<'_>| format!("{} should be a float", c.key)),
        "min_length" => Arc::new(|c: &MessageContext<'_>| {
            format!("{} must have at least {} elements", c.key, display_value(c.arg))
        }),
        "max_length" => Arc::new(|c: &MessageContext<'_>| {
            format!("{} must have at most {} elements", c.key, display_value(c.arg))
        }),
        "length_range" => Arc::new(|c: &MessageContext<'_>| {
            let (low, high) = range_display(c.arg);
            format!("{} must have between {low} and {high} elements", c.key)
        }),
        "length_equals" => Arc::new(|c: &MessageContext<'_>| {
            format!("{} must have exactly {} elements", c.key, display_value(c.arg))
        }),
        "equals" => Arc::new(|c: &MessageContext<'_>| {
            format!("{} must equal {}", c.key, display_value(c.arg))
        }),
        "min" => Arc::new(|c: &MessageContext<'_>| {
            format!("{} must be at least {}", c.key, display_value(c.arg))
        }),
        "max" => Arc::new(|c: &MessageContext<'_>| {
            format!("{} must be at most {}", c.key, display_value(c.arg))
        }),
        "in_range" => Arc::new(|c: &MessageContext<'_>| {
            let (low, high) = range_display(c.arg);
            format!("{} must be between {low} and {high}", c.key)
        }),
        "is_array" => Arc::new(|c: &MessageContext<'_>| format!("{} should be an array", c.key)),
        "is_hash" => Arc::new(|c: &MessageContext<'_>| format!("{} should be a hash", c.key)),
        "is_json" => Arc::new(|c: &MessageContext<'_>| format!("{} should be valid JSON", c.key)),
        "is_a" => Arc::new(|c: &MessageContext<'_>| {
            format!("{} should be of type {}", c.key, type_names(c.arg))
        }),
        "array_of_hashes" => {
            Arc::new(|_: &MessageContext<'_>| "please supply a sequence of maps".to_string())
        }
        _ => Arc::new(|c: &MessageContext<'_>| format!("{} is invalid", c.key)),
    }
}
