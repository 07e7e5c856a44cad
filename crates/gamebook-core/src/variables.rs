//! The story variable store.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::rng::DeterministicRng;
use crate::value::Value;

const NAMESPACE: &str = "Variables.";

/// Flat, mutable name-to-value map holding story state.
///
/// Names may be written with or without the `Variables.` prefix; the prefix is
/// stripped before every read and write.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Variables(BTreeMap<String, Value>);

impl Variables {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Strips the `Variables.` prefix. Returns `None` for a blank name.
    #[must_use]
    pub fn trim_name(name: &str) -> Option<&str> {
        let trimmed = name.trim();
        let trimmed = trimmed.strip_prefix(NAMESPACE).unwrap_or(trimmed);
        (!trimmed.is_empty()).then_some(trimmed)
    }

    /// Reads a variable. Absent variables are `None`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(Self::trim_name(name)?)
    }

    /// Writes a variable, creating it on first write.
    pub fn set(&mut self, name: &str, value: Value) {
        if let Some(name) = Self::trim_name(name) {
            self.0.insert(name.to_owned(), value);
        }
    }

    /// Removes a variable.
    pub fn unset(&mut self, name: &str) -> Option<Value> {
        self.0.remove(Self::trim_name(name)?)
    }

    /// Writes `Some(value)` or removes the variable for `None`.
    pub fn assign(&mut self, name: &str, value: Option<Value>) {
        match value {
            Some(value) => self.set(name, value),
            None => {
                self.unset(name);
            }
        }
    }

    /// Sets `name` to a random integer in `[0, choices)`, or `0` when there is
    /// nothing to choose between.
    pub fn set_random(&mut self, name: &str, choices: i64, rng: &mut dyn DeterministicRng) {
        let result = match u32::try_from(choices) {
            Ok(choices) if choices > 1 => rng.next_u32_range(0, choices - 1),
            _ => 0,
        };
        self.set(name, Value::Number(f64::from(result)));
    }

    /// Adds `amount` to the current value. A zero or `NaN` amount does nothing;
    /// a previous value that is not numeric counts as zero.
    pub fn add(&mut self, name: &str, amount: f64) {
        if amount == 0.0 || amount.is_nan() {
            return;
        }
        let previous = self.get(name).map_or(0.0, Value::to_number);
        let previous = if previous.is_nan() { 0.0 } else { previous };
        self.set(name, Value::Number(previous + amount));
    }

    /// Drops every variable.
    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Replaces the whole store.
    pub fn replace(&mut self, other: Variables) {
        self.0 = other.0;
    }

    /// Iterates variables in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Number of variables held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
