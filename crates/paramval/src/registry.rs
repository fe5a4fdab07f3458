//! # Rule Registry
//!
//! Holds the name-keyed tables the engine consults while evaluating a
//! rule set:
//!
//! - **Validators.** Custom predicates `(value, argument, data) -> bool`
//!   registered by callers. Built-in rules are typed variants of
//!   [`BuiltinRule`]; a validator registered under a built-in name
//!   replaces it.
//! - **Messages.** Formatting functions producing the failure message for
//!   a rule, pre-populated with a default for every built-in rule. Any
//!   entry, built-in or custom, can be replaced.
//! - **JSON parser.** The collaborator used by the `is_json` rule.
//!
//! ## Thread Safety
//!
//! `RuleRegistry` is `Send + Sync`. Build it once at startup, then share it
//! read-only across threads. The process-wide registry in
//! [`crate::global`] guards late registration with a read-write lock.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::builtin;
use crate::error::RegistryError;
use crate::rule::{BuiltinRule, FieldKey, MESSAGE_KEY};

/// A custom rule predicate: `(value, argument, data) -> valid`.
pub type ValidatorFn = Arc<dyn Fn(&Value, &Value, &Value) -> bool + Send + Sync>;

/// A message formatter invoked when a rule fails and the field declares
/// no literal message override.
pub type MessageFn = Arc<dyn Fn(&MessageContext<'_>) -> String + Send + Sync>;

/// Everything a message formatter may refer to.
#[derive(Debug, Clone, Copy)]
pub struct MessageContext<'a> {
    /// Field the failing rule was declared on.
    pub key: &'a FieldKey,
    /// The full data value passed to `validate`.
    pub data: &'a Value,
    /// The resolved field value.
    pub value: &'a Value,
    /// The rule's argument as written in the rule set.
    pub arg: &'a Value,
}

/// JSON-text parsing collaborator used by the `is_json` rule.
///
/// Only success or failure matters to validation; the reason is logged
/// at `trace` and never surfaces in failure messages.
pub trait JsonParser: Send + Sync {
    /// Parse `text`, returning a description of the problem on failure.
    fn parse(&self, text: &str) -> Result<(), String>;
}

/// Default JSON parser backed by `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerdeJsonParser {
    documents_only: bool,
}

impl SerdeJsonParser {
    /// A parser that accepts any JSON value, scalars included.
    pub fn new() -> Self {
        Self::default()
    }

    /// A parser that additionally requires the top-level value to be an
    /// object or an array.
    pub fn documents_only() -> Self {
        Self {
            documents_only: true,
        }
    }
}

impl JsonParser for SerdeJsonParser {
    fn parse(&self, text: &str) -> Result<(), String> {
        let value: Value = serde_json::from_str(text).map_err(|e| e.to_string())?;
        if self.documents_only && !(value.is_object() || value.is_array()) {
            return Err("top-level value must be an object or an array".to_string());
        }
        Ok(())
    }
}

/// Validator and message tables plus the JSON-parsing collaborator.
#[derive(Clone)]
pub struct RuleRegistry {
    validators: BTreeMap<String, ValidatorFn>,
    messages: BTreeMap<String, MessageFn>,
    json_parser: Arc<dyn JsonParser>,
}

impl RuleRegistry {
    /// A registry holding the built-in rules and their default messages.
    pub fn new() -> Self {
        let messages = BuiltinRule::NAMES
            .iter()
            .map(|name| (name.to_string(), builtin::default_message(name)))
            .collect();
        Self {
            validators: BTreeMap::new(),
            messages,
            json_parser: Arc::new(SerdeJsonParser::new()),
        }
    }

    /// Replace the JSON-parsing collaborator.
    pub fn with_json_parser(mut self, parser: impl JsonParser + 'static) -> Self {
        self.json_parser = Arc::new(parser);
        self
    }

    /// Insert or replace a validator. Registering a built-in name
    /// overrides the built-in predicate; its argument is still checked
    /// when the rule set is compiled.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::InvalidName` for an empty name or `message`.
    pub fn register_validator<F>(
        &mut self,
        name: impl Into<String>,
        validator: F,
    ) -> Result<(), RegistryError>
    where
        F: Fn(&Value, &Value, &Value) -> bool + Send + Sync + 'static,
    {
        let name = checked_name(name.into())?;
        if BuiltinRule::is_builtin(&name) {
            tracing::debug!(rule = %name, "overriding built-in validator");
        } else {
            tracing::debug!(rule = %name, "registered validator");
        }
        self.validators.insert(name, Arc::new(validator));
        Ok(())
    }

    /// Insert or replace the message formatter for a rule.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::InvalidName` for an empty name or `message`.
    pub fn register_message<F>(
        &mut self,
        name: impl Into<String>,
        message: F,
    ) -> Result<(), RegistryError>
    where
        F: Fn(&MessageContext<'_>) -> String + Send + Sync + 'static,
    {
        let name = checked_name(name.into())?;
        tracing::debug!(rule = %name, "registered message");
        self.messages.insert(name, Arc::new(message));
        Ok(())
    }

    /// Look up a registered validator, including overrides of built-ins.
    pub fn validator(&self, name: &str) -> Option<&ValidatorFn> {
        self.validators.get(name)
    }

    /// Look up a message formatter.
    pub fn message(&self, name: &str) -> Option<&MessageFn> {
        self.messages.get(name)
    }

    /// Returns true if `name` is a built-in or registered rule.
    pub fn knows(&self, name: &str) -> bool {
        BuiltinRule::is_builtin(name) || self.validators.contains_key(name)
    }

    /// The JSON-parsing collaborator.
    pub fn json_parser(&self) -> &dyn JsonParser {
        self.json_parser.as_ref()
    }

    /// Names of every rule, built-in and custom, sorted.
    pub fn validator_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = BuiltinRule::NAMES
            .iter()
            .copied()
            .chain(self.validators.keys().map(String::as_str))
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    /// Names of every registered message, sorted.
    pub fn message_names(&self) -> Vec<&str> {
        self.messages.keys().map(String::as_str).collect()
    }

    /// Format the failure message for `rule`. Rules without a registered
    /// message fall back to a generic one.
    pub fn format_message(&self, rule: &str, ctx: &MessageContext<'_>) -> String {
        match self.messages.get(rule) {
            Some(message) => message(ctx),
            None => format!("{} is invalid", ctx.key),
        }
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleRegistry")
            .field("validators", &self.validators.keys().collect::<Vec<_>>())
            .field("messages", &self.messages.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

fn checked_name(name: String) -> Result<String, RegistryError> {
    if name.is_empty() || name == MESSAGE_KEY {
        Err(RegistryError::InvalidName(name))
    } else {
        Ok(name)
    }
}
