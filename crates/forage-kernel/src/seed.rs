//! Generation seed: the parameter mapping handed to a generation's creator.
//!
//! A seed is immutable once a generation starts; the reducer produces the
//! successor seed as a fresh value rather than editing in place, so an old
//! generation's seed stays inspectable after the next one begins.

use crate::answer::unwrap_float;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Errors raised while reading or overwriting seed parameters.
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("seed has no parameter named {0:?}")]
    UnknownKey(String),

    #[error("seed parameter {key:?} is not a float: {value}")]
    NotAFloat { key: String, value: Value },
}

/// Named parameters for one generation.
///
/// Keys are fixed for the lifetime of a chain: successor seeds overwrite
/// values but never add or drop keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeedDefinition {
    entries: BTreeMap<String, Value>,
}

impl SeedDefinition {
    pub fn from_entries(entries: impl IntoIterator<Item = (String, Value)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Iterate parameter names in deterministic order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Replace the value of an existing parameter.
    ///
    /// Refuses unknown keys: growing a seed mid-chain would change the key
    /// set the next generation inherits.
    pub fn overwrite(&mut self, key: &str, value: Value) -> Result<(), SeedError> {
        match self.entries.get_mut(key) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(SeedError::UnknownKey(key.to_string())),
        }
    }

    /// Read a slider parameter as a float.
    ///
    /// Unwraps the legacy one-element array wrap; anything else non-numeric
    /// is an error rather than a guess.
    pub fn slider(&self, dimension: &str) -> Result<f64, SeedError> {
        let value = self
            .get(dimension)
            .ok_or_else(|| SeedError::UnknownKey(dimension.to_string()))?;
        unwrap_float(value).ok_or_else(|| SeedError::NotAFloat {
            key: dimension.to_string(),
            value: value.clone(),
        })
    }
}
