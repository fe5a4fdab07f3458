//! # Rule Sets
//!
//! A rule set maps field keys to rule specs; a rule spec maps rule names
//! to arguments, plus an optional literal `message` override. Rule sets
//! are written as nested maps:
//!
//! ```text
//! {
//!   "amount": { "required": true, "min": 0, "max": 10000 },
//!   "root":   { "array_of_hashes": { "id": { "is_integer": true } } }
//! }
//! ```
//!
//! Compilation turns every built-in rule into a [`BuiltinRule`] variant
//! with a typed payload (compiled regex, checked range, parsed type list,
//! nested rule set). Rule names that are not built in compile to
//! [`RuleKind::Custom`] and are resolved against the registry when the
//! rule set is evaluated.
//!
//! Iteration order of fields and of rules within a field is declaration
//! order.

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::RuleSetError;
use crate::value::{compare_bounds, yaml_str_to_data, Bound, ValueKind};

/// Reserved field key binding to the whole data value.
pub const ROOT_KEY: &str = "root";

/// Reserved rule-spec entry holding a literal message override.
pub const MESSAGE_KEY: &str = "message";

/// Field a rule spec applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldKey {
    /// The entire data value.
    Root,
    /// A named entry of the data map.
    Field(String),
}

impl FieldKey {
    /// Parse a rule-set key. `root` is reserved.
    pub fn parse(key: &str) -> Self {
        if key == ROOT_KEY {
            FieldKey::Root
        } else {
            FieldKey::Field(key.to_string())
        }
    }

    /// The key as written in the rule set.
    pub fn as_str(&self) -> &str {
        match self {
            FieldKey::Root => ROOT_KEY,
            FieldKey::Field(name) => name,
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for FieldKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        crate::value::serialize_display(self, serializer)
    }
}

/// The closed set of built-in rules, each carrying its typed argument.
#[derive(Debug, Clone)]
pub enum BuiltinRule {
    /// Value is not null.
    Required,
    /// Value is null.
    Absent,
    /// Value is a non-empty string.
    NotBlank,
    /// Value is not one of the listed values.
    NotIncludedIn(Vec<Value>),
    /// Value is one of the listed values.
    IncludedIn(Vec<Value>),
    /// Value is a string matching the pattern.
    Format(Regex),
    /// Value is an integer or an integer literal string.
    IsInteger,
    /// Value is a number or a string that parses as a finite float.
    IsFloat,
    /// Element count is at least the bound.
    MinLength(usize),
    /// Element count is at most the bound.
    MaxLength(usize),
    /// Element count is within the inclusive range.
    LengthRange {
        /// Inclusive lower bound.
        low: usize,
        /// Inclusive upper bound.
        high: usize,
    },
    /// Element count equals the argument.
    LengthEquals(usize),
    /// Value structurally equals the argument.
    Equals(Value),
    /// Value is at least the bound.
    Min(Bound),
    /// Value is at most the bound.
    Max(Bound),
    /// Value is within the inclusive range.
    InRange {
        /// Inclusive lower bound.
        low: Bound,
        /// Inclusive upper bound.
        high: Bound,
    },
    /// Value is an array.
    IsArray,
    /// Value is a map.
    IsHash,
    /// Value is a string holding a well-formed JSON document.
    IsJson,
    /// Value's runtime type is one of the listed types.
    IsA(Vec<ValueKind>),
    /// The whole data value is an array of maps, each valid against the
    /// nested rule set.
    ArrayOfHashes(RuleSet),
}

impl BuiltinRule {
    /// Names of every built-in rule.
    pub const NAMES: [&'static str; 21] = [
        "required",
        "absent",
        "not_blank",
        "not_included_in",
        "included_in",
        "format",
        "is_integer",
        "is_float",
        "min_length",
        "max_length",
        "length_range",
        "length_equals",
        "equals",
        "min",
        "max",
        "in_range",
        "is_array",
        "is_hash",
        "is_json",
        "is_a",
        "array_of_hashes",
    ];

    /// Returns true if `name` is a built-in rule.
    pub fn is_builtin(name: &str) -> bool {
        Self::NAMES.contains(&name)
    }

    /// Compile a built-in rule from its name and argument.
    ///
    /// Returns `Ok(None)` if `name` is not a built-in rule, and
    /// `Err(reason)` if the argument has the wrong shape.
    pub fn compile(name: &str, arg: &Value) -> Result<Option<Self>, String> {
        let rule = match name {
            "required" => BuiltinRule::Required,
            "absent" => BuiltinRule::Absent,
            "not_blank" => BuiltinRule::NotBlank,
            "not_included_in" => BuiltinRule::NotIncludedIn(collection(arg)?),
            "included_in" => BuiltinRule::IncludedIn(collection(arg)?),
            "format" => {
                let pattern = arg.as_str().ok_or("expected a pattern string")?;
                let re = Regex::new(pattern).map_err(|e| format!("invalid pattern: {e}"))?;
                BuiltinRule::Format(re)
            }
            "is_integer" => BuiltinRule::IsInteger,
            "is_float" => BuiltinRule::IsFloat,
            "min_length" => BuiltinRule::MinLength(count(arg)?),
            "max_length" => BuiltinRule::MaxLength(count(arg)?),
            "length_range" => {
                let (low, high) = range_parts(arg)?;
                let (low, high) = (count(low)?, count(high)?);
                if low > high {
                    return Err(format!("range {low}..{high} is inverted"));
                }
                BuiltinRule::LengthRange { low, high }
            }
            "length_equals" => BuiltinRule::LengthEquals(count(arg)?),
            "equals" => BuiltinRule::Equals(arg.clone()),
            "min" => BuiltinRule::Min(bound(arg)?),
            "max" => BuiltinRule::Max(bound(arg)?),
            "in_range" => {
                let (low, high) = range_parts(arg)?;
                let (low, high) = (bound(low)?, bound(high)?);
                match compare_bounds(&low, &high) {
                    Some(std::cmp::Ordering::Greater) => {
                        return Err(format!("range {low}..{high} is inverted"));
                    }
                    Some(_) => {}
                    None => return Err("range bounds must be of the same kind".to_string()),
                }
                BuiltinRule::InRange { low, high }
            }
            "is_array" => BuiltinRule::IsArray,
            "is_hash" => BuiltinRule::IsHash,
            "is_json" => BuiltinRule::IsJson,
            "is_a" => BuiltinRule::IsA(kinds(arg)?),
            "array_of_hashes" => {
                let nested = RuleSet::from_value(arg).map_err(|e| e.to_string())?;
                BuiltinRule::ArrayOfHashes(nested)
            }
            _ => return Ok(None),
        };
        Ok(Some(rule))
    }
}

fn collection(arg: &Value) -> Result<Vec<Value>, String> {
    arg.as_array()
        .cloned()
        .ok_or_else(|| "expected a list of values".to_string())
}

fn count(arg: &Value) -> Result<usize, String> {
    arg.as_u64()
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| format!("expected a non-negative integer, got {arg}"))
}

fn bound(arg: &Value) -> Result<Bound, String> {
    Bound::from_value(arg).ok_or_else(|| format!("expected a number or string, got {arg}"))
}

/// Split a range argument written as `[low, high]` or
/// `{"low": .., "high": ..}`.
fn range_parts(arg: &Value) -> Result<(&Value, &Value), String> {
    match arg {
        Value::Array(items) if items.len() == 2 => Ok((&items[0], &items[1])),
        Value::Object(map) => match (map.get("low"), map.get("high")) {
            (Some(low), Some(high)) => Ok((low, high)),
            _ => Err("expected {\"low\": .., \"high\": ..}".to_string()),
        },
        _ => Err("expected a range [low, high]".to_string()),
    }
}

fn kinds(arg: &Value) -> Result<Vec<ValueKind>, String> {
    let kind = |v: &Value| -> Result<ValueKind, String> {
        let name = v.as_str().ok_or_else(|| format!("expected a type name, got {v}"))?;
        match ValueKind::from_name(name) {
            Some(ValueKind::Null) => Err("null never matches; use `absent` instead".to_string()),
            Some(kind) => Ok(kind),
            None => Err(format!("unknown type '{name}'")),
        }
    };
    match arg {
        Value::Array(items) if !items.is_empty() => items.iter().map(kind).collect(),
        Value::Array(_) => Err("expected at least one type name".to_string()),
        other => Ok(vec![kind(other)?]),
    }
}

/// How a rule is evaluated.
#[derive(Debug, Clone)]
pub enum RuleKind {
    /// A built-in rule, dispatched by exhaustive match.
    Builtin(BuiltinRule),
    /// A rule resolved by name in the registry at evaluation time.
    Custom,
}

/// One named rule with its argument.
#[derive(Debug, Clone)]
pub struct Rule {
    name: String,
    arg: Value,
    kind: RuleKind,
}

impl Rule {
    /// Compile a rule. `key` is used only for error context.
    pub fn compile(key: &str, name: &str, arg: Value) -> Result<Self, RuleSetError> {
        let kind = match BuiltinRule::compile(name, &arg) {
            Ok(Some(builtin)) => RuleKind::Builtin(builtin),
            Ok(None) => RuleKind::Custom,
            Err(reason) => {
                return Err(RuleSetError::InvalidArgument {
                    key: key.to_string(),
                    rule: name.to_string(),
                    reason,
                })
            }
        };
        Ok(Self {
            name: name.to_string(),
            arg,
            kind,
        })
    }

    /// Rule name as written in the rule set.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The argument as written in the rule set.
    pub fn arg(&self) -> &Value {
        &self.arg
    }

    /// How this rule is evaluated.
    pub fn kind(&self) -> &RuleKind {
        &self.kind
    }
}

/// The rules applied to one field.
#[derive(Debug, Clone, Default)]
pub struct RuleSpec {
    rules: Vec<Rule>,
    message: Option<String>,
}

impl RuleSpec {
    /// Compile a rule spec from a map of rule names to arguments.
    pub fn from_map(key: &str, map: &Map<String, Value>) -> Result<Self, RuleSetError> {
        let mut spec = RuleSpec::default();
        for (name, arg) in map {
            if name == MESSAGE_KEY {
                let message = arg
                    .as_str()
                    .ok_or_else(|| RuleSetError::MessageNotAString {
                        key: key.to_string(),
                    })?;
                spec.message = Some(message.to_string());
                continue;
            }
            spec.rules.push(Rule::compile(key, name, arg.clone())?);
        }
        Ok(spec)
    }

    /// Rules in declaration order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Literal message override, applied to every failing rule.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Whether a `required` rule is declared. Its argument is not
    /// consulted.
    pub fn is_required(&self) -> bool {
        self.rules.iter().any(|r| r.name == "required")
    }
}

/// Field key and its rule spec.
#[derive(Debug, Clone)]
pub struct FieldRules {
    /// Field the spec applies to.
    pub key: FieldKey,
    /// Rules for the field.
    pub spec: RuleSpec,
}

/// A compiled rule set.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(try_from = "Value")]
pub struct RuleSet {
    fields: Vec<FieldRules>,
}

impl RuleSet {
    /// Compile a rule set from a map of field keys to rule specs.
    ///
    /// # Errors
    ///
    /// Returns `RuleSetError` if the value is not a map, a spec is not a
    /// map, a message override is not a string, or a built-in rule's
    /// argument has the wrong shape.
    pub fn from_value(value: &Value) -> Result<Self, RuleSetError> {
        let map = value.as_object().ok_or_else(|| RuleSetError::NotAMap {
            found: ValueKind::of(value).to_string(),
        })?;
        let mut fields = Vec::with_capacity(map.len());
        for (key, spec) in map {
            let spec_map = spec.as_object().ok_or_else(|| RuleSetError::SpecNotAMap {
                key: key.clone(),
                found: ValueKind::of(spec).to_string(),
            })?;
            fields.push(FieldRules {
                key: FieldKey::parse(key),
                spec: RuleSpec::from_map(key, spec_map)?,
            });
        }
        Ok(Self { fields })
    }

    /// Compile a rule set from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self, RuleSetError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| RuleSetError::Parse(format!("invalid JSON: {e}")))?;
        Self::from_value(&value)
    }

    /// Compile a rule set from YAML text. Numeric and boolean keys are
    /// stringified.
    pub fn from_yaml_str(text: &str) -> Result<Self, RuleSetError> {
        let value = yaml_str_to_data(text).map_err(RuleSetError::Parse)?;
        Self::from_value(&value)
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[FieldRules] {
        &self.fields
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the rule set declares no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Every custom rule, including those in nested rule sets, as
    /// `(field, rule name)` pairs in declaration order.
    pub fn custom_rules(&self) -> Vec<(&FieldKey, &str)> {
        let mut out = Vec::new();
        for field in &self.fields {
            for rule in field.spec.rules() {
                match rule.kind() {
                    RuleKind::Custom => out.push((&field.key, rule.name())),
                    RuleKind::Builtin(BuiltinRule::ArrayOfHashes(nested)) => {
                        out.extend(nested.custom_rules());
                    }
                    RuleKind::Builtin(_) => {}
                }
            }
        }
        out
    }
}

impl TryFrom<Value> for RuleSet {
    type Error = RuleSetError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(&value)
    }
}

impl TryFrom<&Value> for RuleSet {
    type Error = RuleSetError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}
