//! Caller-supplied predicates for `custom` rules.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::models::Record;

/// Predicate signature: `Ok(())` passes, `Err(message)` fails with that message.
pub type CustomPredicate =
    dyn Fn(&Value, &Record) -> std::result::Result<(), String> + Send + Sync;

/// Registry of named predicates referenced by `custom` rules.
///
/// Rules are data, so they refer to predicates by name; the registry is
/// handed to the analyzer by the embedding application.
#[derive(Clone, Default)]
pub struct CustomValidators {
    predicates: BTreeMap<String, Arc<CustomPredicate>>,
}

impl CustomValidators {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to register a predicate under `name`.
    ///
    /// Registering the same name twice replaces the earlier predicate.
    pub fn register<F>(mut self, name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Value, &Record) -> std::result::Result<(), String> + Send + Sync + 'static,
    {
        self.predicates.insert(name.into(), Arc::new(predicate));
        self
    }

    /// Looks up a predicate.
    pub fn get(&self, name: &str) -> Option<&CustomPredicate> {
        self.predicates.get(name).map(Arc::as_ref)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.predicates.keys().map(String::as_str)
    }

    /// Number of registered predicates.
    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}

impl fmt::Debug for CustomValidators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomValidators")
            .field("predicates", &self.predicates.keys().collect::<Vec<_>>())
            .finish()
    }
}
