//! Key/value state database backing the restart read/write hook.
//!
//! The layout of a strategy's persisted state is private to that strategy;
//! the integrator only sees opaque keys under a namespace it supplies.

use indexmap::IndexMap;
use std::fmt;

/// A single persisted value.
#[derive(Clone, Debug, PartialEq)]
pub enum StateValue {
    /// A boolean flag.
    Bool(bool),
    /// A signed integer.
    Int(i64),
    /// A floating-point scalar.
    Float(f64),
    /// A flat array of floats (e.g., packed point coordinates).
    FloatVec(Vec<f64>),
}

impl fmt::Display for StateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::FloatVec(v) => write!(f, "[{} floats]", v.len()),
        }
    }
}

/// Ordered key/value store passed to the restart save/load hooks.
///
/// Keys are caller-namespaced strings; iteration order is insertion order
/// so that a saved database round-trips deterministically.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StateDatabase {
    entries: IndexMap<String, StateValue>,
}

impl StateDatabase {
    /// Create an empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a value under `key`.
    pub fn put(&mut self, key: impl Into<String>, value: StateValue) {
        self.entries.insert(key.into(), value);
    }

    /// Look up a value by key.
    pub fn get(&self, key: &str) -> Option<&StateValue> {
        self.entries.get(key)
    }

    /// Convenience accessor for a float vector entry.
    pub fn get_float_vec(&self, key: &str) -> Option<&[f64]> {
        match self.entries.get(key) {
            Some(StateValue::FloatVec(v)) => Some(v),
            _ => None,
        }
    }

    /// Convenience accessor for a float scalar entry.
    pub fn get_float(&self, key: &str) -> Option<f64> {
        match self.entries.get(key) {
            Some(StateValue::Float(v)) => Some(*v),
            _ => None,
        }
    }

    /// Convenience accessor for an integer entry.
    pub fn get_int(&self, key: &str) -> Option<i64> {
        match self.entries.get(key) {
            Some(StateValue::Int(v)) => Some(*v),
            _ => None,
        }
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the database holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &StateValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}
