//! Scenario state
//!
//! Cross-step memory of extracted identifiers and tokens. One value per
//! run, passed into the runner and handed back when it finishes.

use std::collections::BTreeMap;

use serde_json::Value;

/// Slot holding the bearer token of a role
pub fn token_slot(role: &str) -> String {
    format!("{}_token", role)
}

/// A slot value counts only when it is present, non-null and non-empty
pub fn is_satisfied(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

/// Text form used when a value is spliced into a string
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Resolve a dotted path such as `result.items.0.id`
pub fn lookup<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(root, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Named slots written by setup and extractions
#[derive(Debug, Default, Clone)]
pub struct ScenarioState {
    slots: BTreeMap<String, Value>,
}

impl ScenarioState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, slot: impl Into<String>, value: Value) {
        self.slots.insert(slot.into(), value);
    }

    pub fn get(&self, slot: &str) -> Option<&Value> {
        self.slots.get(slot)
    }

    /// Whether the slot holds a usable value
    pub fn is_satisfied(&self, slot: &str) -> bool {
        self.get(slot).is_some_and(is_satisfied)
    }

    /// First slot in `slots` that is not satisfied
    pub fn first_missing<'a>(&self, slots: &'a [String]) -> Option<&'a str> {
        slots
            .iter()
            .find(|slot| !self.is_satisfied(slot))
            .map(String::as_str)
    }

    /// Text form of a slot, for URLs and headers
    pub fn text(&self, slot: &str) -> Option<String> {
        self.get(slot).map(value_text)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.slots.iter()
    }
}
