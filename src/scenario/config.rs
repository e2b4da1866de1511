//! Scenario configuration types
//!
//! Defines the data structures for deserializing YAML scenarios and the
//! checks a scenario must pass before it is run.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::common::config::Config;
use crate::common::{Error, Result};
use crate::http::Method;
use crate::ledger::StepId;

use super::state::token_slot;
use super::template::placeholders;

/// A complete scenario loaded from a YAML file
#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    /// Name of the scenario
    pub name: String,
    /// Optional description of what the scenario verifies
    pub description: Option<String>,
    /// Roles whose credentials must be obtained before any step runs
    #[serde(default)]
    pub roles: Vec<String>,
    /// Categories, executed in declared order
    pub categories: Vec<Category>,
}

/// A named group of steps
#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct Category {
    pub name: String,
    /// Tag printed before each step (defaults to the category name)
    pub label: Option<String>,
    pub steps: Vec<StepSpec>,
}

/// A single request/validate/extract step
#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct StepSpec {
    pub name: String,
    /// Overrides the category label for this step
    pub label: Option<String>,
    pub method: Method,
    /// Configured service the path is relative to
    pub service: Option<String>,
    /// Path template, may carry a query string
    pub path: Option<String>,
    /// Absolute URL template, used instead of service + path
    pub url: Option<String>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// JSON body template
    pub body: Option<Value>,
    /// Role whose bearer token authorizes the request
    pub auth: Option<String>,
    /// Slots that must be satisfied for the step to run
    #[serde(default)]
    pub requires: Vec<String>,
    /// Declared but disabled; always recorded as skipped with this reason
    pub skip: Option<String>,
    /// Exact status the response must carry (default: any 2xx)
    pub expect_status: Option<u16>,
    /// Slot name -> dotted JSON path written to state on success
    #[serde(default)]
    pub extract: BTreeMap<String, String>,
    /// Payload assertions checked after extraction
    #[serde(default, rename = "assert")]
    pub asserts: Vec<FieldAssertion>,
}

/// Assertion on a field of the JSON response
#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct FieldAssertion {
    /// Dotted JSON path (numeric segments index arrays)
    pub path: String,
    /// Expected value (exact match)
    pub equals: Option<Value>,
    /// Expected substring of the value's text form
    pub contains: Option<String>,
    /// Field must be present and non-empty
    #[serde(default)]
    pub exists: bool,
}

impl StepSpec {
    /// Slots this step depends on, in the order they are checked
    pub fn required_slots(&self) -> Vec<String> {
        let mut slots = Vec::with_capacity(self.requires.len() + 1);
        if let Some(role) = &self.auth {
            slots.push(token_slot(role));
        }
        for slot in &self.requires {
            if !slots.contains(slot) {
                slots.push(slot.clone());
            }
        }
        slots
    }

    /// Every template placeholder used by the request
    fn referenced_slots(&self) -> Vec<String> {
        let mut found = Vec::new();
        for template in self.path.iter().chain(self.url.iter()).chain(self.headers.values()) {
            found.extend(placeholders(template));
        }
        if let Some(body) = &self.body {
            collect_body_placeholders(body, &mut found);
        }
        found
    }
}

fn collect_body_placeholders(value: &Value, found: &mut Vec<String>) {
    match value {
        Value::String(s) => found.extend(placeholders(s)),
        Value::Array(items) => items.iter().for_each(|v| collect_body_placeholders(v, found)),
        Value::Object(map) => map.values().for_each(|v| collect_body_placeholders(v, found)),
        _ => {}
    }
}

impl Scenario {
    /// Load and parse a scenario file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::from_yaml(&content)
    }

    /// Parse a scenario from YAML text
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| Error::scenario(format!("Failed to parse scenario: {}", e)))
    }

    /// Total number of declared steps
    pub fn step_count(&self) -> usize {
        self.categories.iter().map(|c| c.steps.len()).sum()
    }

    /// Steps in execution order with their identities
    pub fn steps(&self) -> impl Iterator<Item = (StepId, &StepSpec)> {
        self.categories
            .iter()
            .flat_map(|category| category.steps.iter().map(move |step| (category, step)))
            .enumerate()
            .map(|(index, (category, step))| {
                let label = step
                    .label
                    .clone()
                    .or_else(|| category.label.clone())
                    .unwrap_or_else(|| category.name.clone());
                let id = StepId {
                    category: category.name.clone(),
                    label,
                    ordinal: index + 1,
                    name: step.name.clone(),
                };
                (id, step)
            })
    }

    /// Check the scenario is runnable against the given configuration
    pub fn validate(&self, config: &Config) -> Result<()> {
        if self.step_count() == 0 {
            return Err(Error::scenario(format!("'{}' declares no steps", self.name)));
        }

        let mut categories = HashSet::new();
        for category in &self.categories {
            if !categories.insert(category.name.as_str()) {
                return Err(Error::scenario(format!(
                    "Duplicate category '{}'",
                    category.name
                )));
            }
        }

        for role in &self.roles {
            if config.account(role).is_none() {
                return Err(Error::scenario(format!(
                    "Role '{}' has no configured account",
                    role
                )));
            }
        }

        let mut names = HashSet::new();
        for (id, step) in self.steps() {
            if !names.insert(step.name.as_str()) {
                return Err(Error::scenario(format!("Duplicate step name '{}'", step.name)));
            }
            validate_step(self, config, &id, step)?;
        }

        Ok(())
    }
}

fn validate_step(scenario: &Scenario, config: &Config, id: &StepId, step: &StepSpec) -> Result<()> {
    let fail = |message: String| Err(Error::scenario(format!("{}: {}", id, message)));

    match (&step.url, &step.service, &step.path) {
        (Some(_), None, None) => {}
        (None, Some(service), Some(_)) => {
            if config.service_url(service).is_err() {
                return fail(format!("unknown service '{}'", service));
            }
        }
        _ => return fail("set either 'url' or both 'service' and 'path'".to_string()),
    }

    if let Some(role) = &step.auth {
        if !scenario.roles.contains(role) {
            return fail(format!("auth role '{}' is not declared in roles", role));
        }
    }

    if let Some(status) = step.expect_status {
        if !(100..=599).contains(&status) {
            return fail(format!("invalid expect_status {}", status));
        }
    }

    for (slot, path) in &step.extract {
        if slot.is_empty() || path.is_empty() {
            return fail("extraction slot and path must be non-empty".to_string());
        }
    }

    for assertion in &step.asserts {
        if assertion.path.is_empty() {
            return fail("assertion path must be non-empty".to_string());
        }
        if assertion.equals.is_none() && assertion.contains.is_none() && !assertion.exists {
            return fail(format!(
                "assertion on '{}' needs one of equals, contains, exists",
                assertion.path
            ));
        }
    }

    // Every slot read by a template must gate the step, so a missing
    // upstream value skips it instead of sending a half-rendered request.
    let required = step.required_slots();
    for slot in step.referenced_slots() {
        if !required.contains(&slot) {
            return fail(format!("uses '{{{{{}}}}}' without requiring it", slot));
        }
    }

    Ok(())
}
