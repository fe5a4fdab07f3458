//! # Error Types
//!
//! Defines the error types produced by rule-set compilation, registry
//! mutation, and validation. All errors use `thiserror` for derive-based
//! `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - Data-validation outcomes are values: a failed `validate` call yields
//!   a [`ValidationError`] carrying every violated rule, in discovery order.
//! - Malformed rule sets and unknown rule names under strict mode are
//!   configuration errors, reported separately from data failures.
//! - Structural recursion failures keep the index of each failing element.

use std::fmt;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::rule::FieldKey;

/// Top-level error returned by a `validate` call.
#[derive(Error, Debug)]
pub enum Error {
    /// The data violated one or more rules.
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    /// The rule set could not be compiled.
    #[error("rule set error: {0}")]
    RuleSet(#[from] RuleSetError),

    /// The data could not be converted into a validation value.
    #[error("cannot convert data: {0}")]
    Data(#[from] serde_json::Error),

    /// A rule name has no built-in or registered validator and the engine
    /// rejects unknown rules.
    #[error("unknown rule '{rule}' on field '{key}'")]
    UnknownRule {
        /// Field the rule was declared on.
        key: FieldKey,
        /// The unregistered rule name.
        rule: String,
    },
}

impl Error {
    /// Returns the validation report if this error is a data failure.
    pub fn as_invalid(&self) -> Option<&ValidationError> {
        match self {
            Error::Invalid(report) => Some(report),
            _ => None,
        }
    }

    /// Consumes the error, returning the validation report if this error
    /// is a data failure.
    pub fn into_invalid(self) -> Option<ValidationError> {
        match self {
            Error::Invalid(report) => Some(report),
            _ => None,
        }
    }
}

/// A rule set that cannot be compiled.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuleSetError {
    /// The rule set itself is not a map of field keys to rule specs.
    #[error("rule set must be a map of field keys to rule specs, got {found}")]
    NotAMap {
        /// Runtime type of the offending value.
        found: String,
    },

    /// A field's rule spec is not a map of rule names to arguments.
    #[error("rules for '{key}' must be a map of rule names to arguments, got {found}")]
    SpecNotAMap {
        /// Field whose spec is malformed.
        key: String,
        /// Runtime type of the offending value.
        found: String,
    },

    /// The reserved `message` entry is not a string.
    #[error("message override for '{key}' must be a string")]
    MessageNotAString {
        /// Field whose message override is malformed.
        key: String,
    },

    /// A built-in rule received an argument of the wrong shape.
    #[error("invalid argument for rule '{rule}' on '{key}': {reason}")]
    InvalidArgument {
        /// Field the rule was declared on.
        key: String,
        /// Rule name.
        rule: String,
        /// What was wrong with the argument.
        reason: String,
    },

    /// The rule set source text could not be parsed.
    #[error("cannot parse rule set: {0}")]
    Parse(String),
}

/// Registry mutation rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Rule names must be non-empty and must not collide with the
    /// reserved `message` entry.
    #[error("invalid rule name '{0}'")]
    InvalidName(String),
}

/// One failing element of a structural recursion rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElementFailure {
    /// Position of the element in the validated sequence.
    pub index: usize,
    /// Every failure the element produced against the nested rule set.
    pub failures: Vec<Failure>,
}

/// One violated rule on one field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Failure {
    /// Field the rule was declared on.
    pub key: FieldKey,
    /// Value the rule was evaluated against (null when absent).
    pub value: Value,
    /// Name of the violated rule.
    pub rule: String,
    /// Resolved human-readable message.
    pub message: String,
    /// Failing elements, for structural recursion rules.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub elements: Vec<ElementFailure>,
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Aggregated report of every rule violated by one `validate` call.
///
/// Never empty: the engine only constructs a report when at least one
/// rule failed. `Display` renders the combined message, one failure
/// message per line in discovery order.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    failures: Vec<Failure>,
}

impl ValidationError {
    /// Build a report from collected failures. Returns `None` when there
    /// are no failures.
    pub fn from_failures(failures: Vec<Failure>) -> Option<Self> {
        if failures.is_empty() {
            None
        } else {
            Some(Self { failures })
        }
    }

    /// Returns the number of failures.
    pub fn len(&self) -> usize {
        self.failures.len()
    }

    /// Returns true if there are no failures. Never true for a report
    /// built by the engine.
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// Returns all failures in discovery order.
    pub fn failures(&self) -> &[Failure] {
        &self.failures
    }

    /// Returns the first failure discovered.
    pub fn first(&self) -> Option<&Failure> {
        self.failures.first()
    }

    /// Consumes self and returns the inner Vec.
    pub fn into_failures(self) -> Vec<Failure> {
        self.failures
    }

    /// The combined message: each failure's message on its own line.
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Structured report suitable for JSON responses.
    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "message": self.message(),
            "failures": self.failures,
        })
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, failure) in self.failures.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{failure}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Convenience error for callers that look up a record after validating
/// its parameters. The engine never produces it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct RecordNotFound {
    /// Human-readable message.
    pub message: String,
}

impl RecordNotFound {
    /// Default message when none is supplied.
    pub const DEFAULT_MESSAGE: &'static str = "record not found";

    /// Create a not-found error with a custom message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Default for RecordNotFound {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MESSAGE)
    }
}
