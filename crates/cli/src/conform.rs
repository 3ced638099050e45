//! YAML parameter normalization.
//!
//! A decoded YAML document may key its mappings with integers, floats or
//! booleans. Action parameters travel as objects with string keys, so every
//! mapping key is rendered to a string and the tree is converted into a
//! [`tether_core::Value`].

use std::collections::BTreeMap;

use serde_yaml::{Mapping, Number};
use tether_core::Value;
use thiserror::Error;

/// A YAML tree that cannot be expressed with string keys
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConformError {
    /// Key is null, a collection or a tagged value
    #[error("map keyed with invalid key {key}")]
    InvalidKey { key: String },

    /// Two keys render to the same string, e.g. `3` and `"3"`
    #[error("duplicate key {key:?} after converting keys to strings")]
    DuplicateKey { key: String },

    /// `.nan` or `.inf`; JSON has no encoding for either
    #[error("non-finite number {value} is not a valid parameter value")]
    NonFinite { value: String },
}

/// Normalize a decoded YAML tree.
pub fn conform(input: &serde_yaml::Value) -> Result<Value, ConformError> {
    match input {
        serde_yaml::Value::Null => Ok(Value::Null),
        serde_yaml::Value::Bool(b) => Ok(Value::Bool(*b)),
        serde_yaml::Value::Number(n) => number(n),
        serde_yaml::Value::String(s) => Ok(Value::String(s.clone())),
        serde_yaml::Value::Sequence(items) => items
            .iter()
            .map(conform)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        serde_yaml::Value::Mapping(map) => conform_mapping(map),
        serde_yaml::Value::Tagged(tagged) => conform(&tagged.value),
    }
}

fn conform_mapping(map: &Mapping) -> Result<Value, ConformError> {
    let mut out = BTreeMap::new();
    for (key, value) in map {
        let key = key_string(key)?;
        let value = conform(value)?;
        if out.insert(key.clone(), value).is_some() {
            return Err(ConformError::DuplicateKey { key });
        }
    }
    Ok(Value::Object(out))
}

fn key_string(key: &serde_yaml::Value) -> Result<String, ConformError> {
    match key {
        serde_yaml::Value::String(s) => Ok(s.clone()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        other => Err(ConformError::InvalidKey {
            key: describe(other),
        }),
    }
}

fn number(n: &Number) -> Result<Value, ConformError> {
    if let Some(i) = n.as_i64() {
        return Ok(Value::Int(i));
    }
    match n.as_f64() {
        Some(f) if f.is_finite() => Ok(Value::Float(f)),
        _ => Err(ConformError::NonFinite {
            value: n.to_string(),
        }),
    }
}

fn describe(key: &serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::Null => "null".to_string(),
        serde_yaml::Value::Sequence(_) => "of type sequence".to_string(),
        serde_yaml::Value::Mapping(_) => "of type mapping".to_string(),
        serde_yaml::Value::Tagged(tagged) => format!("tagged {}", tagged.tag),
        other => format!("{:?}", other),
    }
}
