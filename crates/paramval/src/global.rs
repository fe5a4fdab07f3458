//! # Process-Wide Registry
//!
//! A shared [`RuleRegistry`] for applications that register custom rules
//! once and validate from anywhere. Explicit registries passed to
//! [`Engine`] remain the preferred interface for tests and libraries.
//!
//! ## Locking
//!
//! The registry is stored as an `Arc` behind a `parking_lot::RwLock`.
//! Registration takes the write lock and updates a private copy when the
//! current registry is still shared. Validation clones the `Arc` under the
//! read lock and releases it before evaluating, so custom validators may
//! call back into this module.

use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use serde_json::Value;

use crate::engine::{Engine, EngineOptions};
use crate::error::{Error, RegistryError};
use crate::registry::{MessageContext, RuleRegistry};
use crate::rule::RuleSet;

static REGISTRY: OnceLock<RwLock<Arc<RuleRegistry>>> = OnceLock::new();

fn registry() -> &'static RwLock<Arc<RuleRegistry>> {
    REGISTRY.get_or_init(|| RwLock::new(Arc::new(RuleRegistry::new())))
}

/// The current registry contents. Later registrations do not affect the
/// returned snapshot.
pub fn snapshot() -> Arc<RuleRegistry> {
    Arc::clone(&registry().read())
}

/// Insert or replace a custom validator in the process-wide registry.
///
/// # Errors
///
/// See [`RuleRegistry::register_validator`].
pub fn register_validator<F>(name: impl Into<String>, validator: F) -> Result<(), RegistryError>
where
    F: Fn(&Value, &Value, &Value) -> bool + Send + Sync + 'static,
{
    let mut guard = registry().write();
    Arc::make_mut(&mut guard).register_validator(name, validator)
}

/// Insert or replace a message formatter in the process-wide registry.
///
/// # Errors
///
/// See [`RuleRegistry::register_message`].
pub fn register_message<F>(name: impl Into<String>, message: F) -> Result<(), RegistryError>
where
    F: Fn(&MessageContext<'_>) -> String + Send + Sync + 'static,
{
    let mut guard = registry().write();
    Arc::make_mut(&mut guard).register_message(name, message)
}

/// Names of every rule known to the process-wide registry, sorted.
pub fn list_validators() -> Vec<String> {
    snapshot().validator_names().into_iter().map(String::from).collect()
}

/// Names of every message in the process-wide registry, sorted.
pub fn list_messages() -> Vec<String> {
    snapshot().message_names().into_iter().map(String::from).collect()
}

/// Validate data against the process-wide registry, skipping unknown
/// rules.
///
/// # Errors
///
/// See [`Engine::validate`].
pub fn validate(data: &Value, rules: &RuleSet) -> Result<(), Error> {
    validate_with(data, rules, EngineOptions::default())
}

/// Validate data against the process-wide registry with explicit options.
///
/// # Errors
///
/// See [`Engine::validate`].
pub fn validate_with(data: &Value, rules: &RuleSet, options: EngineOptions) -> Result<(), Error> {
    let registry = snapshot();
    Engine::with_options(&registry, options).validate(data, rules)
}
