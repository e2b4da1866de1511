//! Scenario runner
//!
//! Executes steps strictly in declared order. Each step is either skipped
//! (disabled or missing a dependency) or executed exactly once, and its
//! outcome is appended to the ledger.

use std::fmt;

use colored::Colorize;
use serde_json::Value;

use crate::common::config::Config;
use crate::common::Result;
use crate::fixture::{self, CredentialProvider};
use crate::http::{classify_status, HttpExecutor, HttpResponse, RequestSpec, TransportError};
use crate::ledger::{Ledger, Outcome, StepId};

use super::config::{FieldAssertion, Scenario, StepSpec};
use super::state::{is_satisfied, lookup, token_slot, value_text, ScenarioState};
use super::template::{render_str, render_url, render_value};

/// Why an executed step failed
#[derive(Debug)]
enum StepFailure {
    /// The request could not be built
    Request(String),
    /// No response was received
    Transport(TransportError),
    /// The status broke the step's status contract
    Status(String),
    /// A field needed for extraction or an assertion is absent
    MissingField(String),
    /// A field is present but has the wrong value
    Assertion {
        path: String,
        expected: String,
        actual: String,
    },
}

impl fmt::Display for StepFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepFailure::Request(message) => write!(f, "invalid request: {}", message),
            StepFailure::Transport(err) => write!(f, "request failed: {}", err),
            StepFailure::Status(message) => f.write_str(message),
            StepFailure::MissingField(path) => {
                write!(f, "missing expected field in response: {}", path)
            }
            StepFailure::Assertion {
                path,
                expected,
                actual,
            } => write!(
                f,
                "assertion failed at {}: expected {}, got {}",
                path, expected, actual
            ),
        }
    }
}

/// Obtain credentials for every role, then run the scenario
///
/// Fails only when credential acquisition fails; in that case no step has
/// been executed.
pub async fn run(
    scenario: &Scenario,
    config: &Config,
    executor: &dyn HttpExecutor,
    provider: &dyn CredentialProvider,
) -> Result<(Ledger, ScenarioState)> {
    let state = fixture::acquire(provider, &scenario.roles).await?;
    Ok(run_scenario(scenario, config, executor, state).await)
}

/// Run every step of the scenario against the given state
pub async fn run_scenario(
    scenario: &Scenario,
    config: &Config,
    executor: &dyn HttpExecutor,
    mut state: ScenarioState,
) -> (Ledger, ScenarioState) {
    let mut ledger = Ledger::new();
    let mut current_category: Option<String> = None;

    for (id, step) in scenario.steps() {
        if current_category.as_deref() != Some(id.category.as_str()) {
            println!("\n{}", format!("# {}", id.category).cyan().bold());
            current_category = Some(id.category.clone());
        }

        let outcome = match eligibility(step, &state) {
            Some(reason) => Outcome::Skipped(reason),
            None => match execute_step(step, config, executor, &mut state).await {
                Ok(()) => Outcome::Passed,
                Err(failure) => Outcome::Failed(failure.to_string()),
            },
        };

        print_outcome(&id, &outcome);
        ledger.record(id, outcome);
    }

    (ledger, state)
}

/// Reason to skip the step, if any
fn eligibility(step: &StepSpec, state: &ScenarioState) -> Option<String> {
    if let Some(reason) = &step.skip {
        return Some(reason.clone());
    }
    state
        .first_missing(&step.required_slots())
        .map(|slot| format!("missing dependency: {}", slot))
}

fn print_outcome(id: &StepId, outcome: &Outcome) {
    match outcome {
        Outcome::Passed => {
            tracing::debug!(step = id.ordinal, name = %id.name, "Step passed");
            println!("  {} {}", "✓".green(), id);
        }
        Outcome::Failed(reason) => {
            tracing::debug!(step = id.ordinal, name = %id.name, %reason, "Step failed");
            println!("  {} {} {}", "✗".red(), id, format!("({})", reason).red());
        }
        Outcome::Skipped(reason) => {
            tracing::debug!(step = id.ordinal, name = %id.name, %reason, "Step skipped");
            println!("  {} {} {}", "⏭".yellow(), id, format!("({})", reason).dimmed());
        }
    }
}

/// Render the step's request from current state
fn build_request(
    step: &StepSpec,
    config: &Config,
    state: &ScenarioState,
) -> std::result::Result<RequestSpec, StepFailure> {
    let url = match (&step.url, &step.service, &step.path) {
        (Some(url), _, _) => render_url(url, state),
        (None, Some(service), Some(path)) => {
            let base = config
                .service_url(service)
                .map_err(|e| StepFailure::Request(e.to_string()))?;
            let path = render_url(path, state);
            format!(
                "{}/{}",
                base.trim_end_matches('/'),
                path.trim_start_matches('/')
            )
        }
        _ => {
            return Err(StepFailure::Request(
                "step has neither url nor service and path".to_string(),
            ))
        }
    };

    let mut request = RequestSpec::new(step.method, url, config.timeouts.request());
    if let Some(role) = &step.auth {
        let token = state
            .text(&token_slot(role))
            .ok_or_else(|| StepFailure::Request(format!("no token for role '{}'", role)))?;
        request = request.with_bearer(&token);
    }
    for (name, value) in &step.headers {
        request = request.with_header(name.clone(), render_str(value, state));
    }
    if let Some(body) = &step.body {
        request = request.with_json(render_value(body, state));
    }
    Ok(request)
}

/// Execute one eligible step, writing its extractions on success
async fn execute_step(
    step: &StepSpec,
    config: &Config,
    executor: &dyn HttpExecutor,
    state: &mut ScenarioState,
) -> std::result::Result<(), StepFailure> {
    let request = build_request(step, config, state)?;
    let response = executor
        .execute(&request)
        .await
        .map_err(StepFailure::Transport)?;

    classify_status(step.expect_status, response.status).map_err(StepFailure::Status)?;

    let extracted = extract_values(step, &response)?;
    for assertion in &step.asserts {
        check_assertion(assertion, &response)?;
    }

    // Only a passed step may feed later steps
    for (slot, value) in extracted {
        tracing::debug!(%slot, value = %value_text(&value), "Extracted value");
        state.set(slot, value);
    }

    Ok(())
}

/// Collect every declared extraction; all of them or none
fn extract_values(
    step: &StepSpec,
    response: &HttpResponse,
) -> std::result::Result<Vec<(String, Value)>, StepFailure> {
    let mut values = Vec::with_capacity(step.extract.len());
    for (slot, path) in &step.extract {
        let value = response
            .body
            .json()
            .and_then(|body| lookup(body, path))
            .filter(|value| is_satisfied(value))
            .ok_or_else(|| StepFailure::MissingField(path.clone()))?;
        values.push((slot.clone(), value.clone()));
    }
    Ok(values)
}

fn check_assertion(
    assertion: &FieldAssertion,
    response: &HttpResponse,
) -> std::result::Result<(), StepFailure> {
    let actual = response
        .body
        .json()
        .and_then(|body| lookup(body, &assertion.path))
        .ok_or_else(|| StepFailure::MissingField(assertion.path.clone()))?;

    if assertion.exists && !is_satisfied(actual) {
        return Err(StepFailure::MissingField(assertion.path.clone()));
    }

    if let Some(expected) = &assertion.equals {
        let matches = match expected {
            Value::String(text) if !actual.is_string() => value_text(actual) == *text,
            _ => expected == actual,
        };
        if !matches {
            return Err(StepFailure::Assertion {
                path: assertion.path.clone(),
                expected: expected.to_string(),
                actual: actual.to_string(),
            });
        }
    }

    if let Some(fragment) = &assertion.contains {
        if !value_text(actual).contains(fragment.as_str()) {
            return Err(StepFailure::Assertion {
                path: assertion.path.clone(),
                expected: format!("value containing \"{}\"", fragment),
                actual: actual.to_string(),
            });
        }
    }

    Ok(())
}
