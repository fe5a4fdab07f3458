//! # paramval: Declarative Parameter Validation
//!
//! Validates dynamically-typed data (a map of field names to values, or
//! a sequence of such maps) against declarative per-field rule sets, and
//! reports every violated rule in one pass.
//!
//! ```
//! use paramval::{Engine, RuleRegistry, RuleSet};
//! use serde_json::json;
//!
//! let registry = RuleRegistry::new();
//! let rules = RuleSet::from_value(&json!({
//!     "amount": { "required": true, "min": 0, "max": 10000 },
//! }))
//! .unwrap();
//!
//! let engine = Engine::new(&registry);
//! assert!(engine.validate(&json!({ "amount": 50 }), &rules).is_ok());
//!
//! let err = engine.validate(&json!({ "amount": 20000 }), &rules).unwrap_err();
//! assert_eq!(err.to_string(), "amount must be at most 10000");
//! ```
//!
//! ## Modules
//!
//! - [`rule`]: compiles rule sets into typed rules.
//! - [`builtin`]: built-in predicates and default messages.
//! - [`registry`]: custom validators, message formatters, and the JSON
//!   parser used by `is_json`.
//! - [`engine`]: field resolution, rule dispatch, structural recursion,
//!   and failure aggregation.
//! - [`global`]: an optional process-wide registry.
//! - [`value`]: runtime types, lengths, ordering, and data conversion.
//!
//! ## Crate Policy
//!
//! - Validation never mutates or coerces the data it checks.
//! - Data failures are values ([`ValidationError`]); malformed rule sets
//!   are [`RuleSetError`]s.
//! - No `unsafe` code. No `panic!()` or `.unwrap()` outside tests.

pub mod builtin;
pub mod engine;
pub mod error;
pub mod global;
pub mod registry;
pub mod rule;
pub mod value;

// Re-export primary types for ergonomic imports.
pub use engine::{Engine, EngineOptions, UnknownRulePolicy};
pub use error::{
    ElementFailure, Error, Failure, RecordNotFound, RegistryError, RuleSetError, ValidationError,
};
pub use global::{list_messages, list_validators, register_message, register_validator, validate};
pub use registry::{
    JsonParser, MessageContext, MessageFn, RuleRegistry, SerdeJsonParser, ValidatorFn,
};
pub use rule::{BuiltinRule, FieldKey, Rule, RuleKind, RuleSet, RuleSpec};
pub use value::{to_data, yaml_to_data, ValueKind};
