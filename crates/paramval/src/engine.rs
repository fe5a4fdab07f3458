//! # Validation Engine
//!
//! Evaluates a compiled [`RuleSet`] against data, collecting every
//! violated rule into one [`ValidationError`].
//!
//! ## Evaluation Order
//!
//! For each field, in declaration order:
//!
//! 1. Resolve the field value. `root` resolves to the whole data value;
//!    any other key is an exact lookup in the data map, and a missing key
//!    resolves to null.
//! 2. If the value is null and the field declares no `required` rule, the
//!    field is skipped entirely.
//! 3. Otherwise every rule on the field runs, in declaration order. A
//!    failing rule records a [`Failure`] and evaluation continues with the
//!    next rule; a field can therefore report several failures.
//!
//! Unknown rule names are skipped by default. With
//! [`UnknownRulePolicy::Reject`] they are reported as
//! [`Error::UnknownRule`] before any data is evaluated.
//!
//! ## Structural Recursion
//!
//! `array_of_hashes` validates the whole data value: it must be an array,
//! and each element is validated independently against the nested rule
//! set. Each failing element is kept, with its index, on the outer
//! failure; the outer message is the first failing element's combined
//! message.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::builtin::{self, Verdict};
use crate::error::{ElementFailure, Error, Failure, ValidationError};
use crate::registry::{MessageContext, RuleRegistry};
use crate::rule::{FieldKey, Rule, RuleKind, RuleSet, RuleSpec};
use crate::value::to_data;

static NULL: Value = Value::Null;

/// What to do with rule names that are neither built in nor registered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownRulePolicy {
    /// Skip the rule silently (logged at `debug`).
    #[default]
    Skip,
    /// Refuse to evaluate the rule set.
    Reject,
}

/// Engine configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineOptions {
    /// Handling of unknown rule names.
    pub unknown_rules: UnknownRulePolicy,
}

impl EngineOptions {
    /// Strict options: unknown rule names are configuration errors.
    pub fn strict() -> Self {
        Self {
            unknown_rules: UnknownRulePolicy::Reject,
        }
    }

    /// Load options from YAML (or JSON) text.
    pub fn from_yaml_str(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }
}

/// Outcome of one rule evaluation.
enum Outcome {
    Pass,
    Fail,
    /// Structural recursion failed on one or more elements.
    Elements(Vec<ElementFailure>),
}

/// The validation engine. Holds nothing but a registry reference and its
/// options, so it is cheap to construct per call and safe to share.
#[derive(Debug, Clone, Copy)]
pub struct Engine<'r> {
    registry: &'r RuleRegistry,
    options: EngineOptions,
}

impl<'r> Engine<'r> {
    /// A lenient engine: unknown rule names are skipped.
    pub fn new(registry: &'r RuleRegistry) -> Self {
        Self::with_options(registry, EngineOptions::default())
    }

    /// An engine with explicit options.
    pub fn with_options(registry: &'r RuleRegistry, options: EngineOptions) -> Self {
        Self { registry, options }
    }

    /// The registry this engine evaluates against.
    pub fn registry(&self) -> &'r RuleRegistry {
        self.registry
    }

    /// The engine's options.
    pub fn options(&self) -> EngineOptions {
        self.options
    }

    /// Validate data against a rule set.
    ///
    /// # Errors
    ///
    /// Returns `Error::Invalid` carrying every failure when the data
    /// violates any rule, and `Error::UnknownRule` when the engine rejects
    /// unknown rules and the rule set names one.
    pub fn validate(&self, data: &Value, rules: &RuleSet) -> Result<(), Error> {
        if self.options.unknown_rules == UnknownRulePolicy::Reject {
            self.check_known(rules)?;
        }

        let span = tracing::debug_span!("validate", fields = rules.len());
        let _guard = span.enter();

        let failures = self.collect(data, rules);
        match ValidationError::from_failures(failures) {
            None => Ok(()),
            Some(report) => {
                tracing::debug!(failures = report.len(), "validation failed");
                Err(report.into())
            }
        }
    }

    /// Validate any serializable value. Map keys are normalised to strings
    /// before evaluation.
    ///
    /// # Errors
    ///
    /// As [`Engine::validate`], plus `Error::Data` if the value cannot be
    /// represented as validation data.
    pub fn validate_value<T: Serialize + ?Sized>(
        &self,
        data: &T,
        rules: &RuleSet,
    ) -> Result<(), Error> {
        let data = to_data(data)?;
        self.validate(&data, rules)
    }

    /// Compile `rules` and validate `data` against it.
    ///
    /// # Errors
    ///
    /// As [`Engine::validate`], plus `Error::RuleSet` if `rules` does not
    /// compile.
    pub fn validate_json(&self, data: &Value, rules: &Value) -> Result<(), Error> {
        let rules = RuleSet::from_value(rules)?;
        self.validate(data, &rules)
    }

    fn check_known(&self, rules: &RuleSet) -> Result<(), Error> {
        match rules
            .custom_rules()
            .into_iter()
            .find(|(_, name)| !self.registry.knows(name))
        {
            Some((key, rule)) => Err(Error::UnknownRule {
                key: key.clone(),
                rule: rule.to_string(),
            }),
            None => Ok(()),
        }
    }

    fn collect(&self, data: &Value, rules: &RuleSet) -> Vec<Failure> {
        let mut failures = Vec::new();
        for field in rules.fields() {
            let value = resolve(data, &field.key);
            if value.is_null() && !field.spec.is_required() {
                tracing::trace!(key = %field.key, "absent and not required, skipping");
                continue;
            }
            for rule in field.spec.rules() {
                let elements = match self.evaluate(rule, value, data) {
                    Some(Outcome::Pass) => continue,
                    Some(Outcome::Fail) => Vec::new(),
                    Some(Outcome::Elements(elements)) => elements,
                    None => {
                        tracing::debug!(
                            key = %field.key,
                            rule = rule.name(),
                            "unknown rule, skipping"
                        );
                        continue;
                    }
                };
                let message = self.message(&field.key, &field.spec, rule, value, data, &elements);
                tracing::trace!(key = %field.key, rule = rule.name(), %message, "rule failed");
                failures.push(Failure {
                    key: field.key.clone(),
                    value: value.clone(),
                    rule: rule.name().to_string(),
                    message,
                    elements,
                });
            }
        }
        failures
    }

    /// Evaluate one rule. `None` means the rule is unknown. A registered
    /// validator takes precedence over the built-in of the same name.
    fn evaluate(&self, rule: &Rule, value: &Value, data: &Value) -> Option<Outcome> {
        if let Some(validator) = self.registry.validator(rule.name()) {
            return Some(if validator(value, rule.arg(), data) {
                Outcome::Pass
            } else {
                Outcome::Fail
            });
        }
        match rule.kind() {
            RuleKind::Builtin(compiled) => {
                let parser = self.registry.json_parser();
                let outcome = match builtin::evaluate(compiled, value, parser) {
                    Verdict::Valid => Outcome::Pass,
                    Verdict::Invalid => Outcome::Fail,
                    Verdict::Nested(nested) => self.validate_elements(data, nested),
                };
                Some(outcome)
            }
            RuleKind::Custom => None,
        }
    }

    fn validate_elements(&self, data: &Value, nested: &RuleSet) -> Outcome {
        let Some(items) = data.as_array() else {
            return Outcome::Fail;
        };
        let empty = Value::Object(Map::new());
        let elements: Vec<ElementFailure> = items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| {
                let element = if item.is_object() { item } else { &empty };
                let failures = self.collect(element, nested);
                if failures.is_empty() {
                    None
                } else {
                    Some(ElementFailure { index, failures })
                }
            })
            .collect();
        if elements.is_empty() {
            Outcome::Pass
        } else {
            Outcome::Elements(elements)
        }
    }

    fn message(
        &self,
        key: &FieldKey,
        spec: &RuleSpec,
        rule: &Rule,
        value: &Value,
        data: &Value,
        elements: &[ElementFailure],
    ) -> String {
        if let Some(message) = spec.message() {
            return message.to_string();
        }
        if let Some(first) = elements.first() {
            return first
                .failures
                .iter()
                .map(|f| f.message.as_str())
                .collect::<Vec<_>>()
                .join("\n");
        }
        let ctx = MessageContext {
            key,
            data,
            value,
            arg: rule.arg(),
        };
        self.registry.format_message(rule.name(), &ctx)
    }
}

/// Resolve a field key against data.
fn resolve<'d>(data: &'d Value, key: &FieldKey) -> &'d Value {
    match key {
        FieldKey::Root => data,
        FieldKey::Field(name) => data.get(name.as_str()).unwrap_or(&NULL),
    }
}
