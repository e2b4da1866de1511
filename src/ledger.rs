//! Result ledger
//!
//! Append-only record of every declared step's outcome, in execution order.

use std::fmt;

use serde::Serialize;

/// Identity of a step within a scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepId {
    /// Category the step is declared in
    pub category: String,
    /// Short role tag printed before the step (e.g. "ADMIN")
    pub label: String,
    /// 1-based position across the whole scenario
    pub ordinal: usize,
    pub name: String,
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] Test {}: {}", self.label, self.ordinal, self.name)
    }
}

/// Result of a single step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum Outcome {
    Passed,
    Failed(String),
    Skipped(String),
}

impl Outcome {
    pub fn is_passed(&self) -> bool {
        matches!(self, Outcome::Passed)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Outcome::Skipped(_))
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Outcome::Passed => None,
            Outcome::Failed(reason) | Outcome::Skipped(reason) => Some(reason),
        }
    }
}

/// Ordered (step, outcome) record of one run
#[derive(Debug, Default, Clone)]
pub struct Ledger {
    entries: Vec<(StepId, Outcome)>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the outcome of a step
    pub fn record(&mut self, id: StepId, outcome: Outcome) {
        debug_assert!(
            !self.entries.iter().any(|(existing, _)| existing.ordinal == id.ordinal),
            "step {} recorded twice",
            id.ordinal
        );
        self.entries.push((id, outcome));
    }

    pub fn entries(&self) -> &[(StepId, Outcome)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn passed(&self) -> impl Iterator<Item = &StepId> {
        self.entries
            .iter()
            .filter(|(_, outcome)| outcome.is_passed())
            .map(|(id, _)| id)
    }

    pub fn failed(&self) -> impl Iterator<Item = (&StepId, &str)> {
        self.entries.iter().filter_map(|(id, outcome)| match outcome {
            Outcome::Failed(reason) => Some((id, reason.as_str())),
            _ => None,
        })
    }

    pub fn skipped(&self) -> impl Iterator<Item = (&StepId, &str)> {
        self.entries.iter().filter_map(|(id, outcome)| match outcome {
            Outcome::Skipped(reason) => Some((id, reason.as_str())),
            _ => None,
        })
    }

    /// Outcome recorded for the step with the given name
    pub fn outcome_of(&self, name: &str) -> Option<&Outcome> {
        self.entries
            .iter()
            .find(|(id, _)| id.name == name)
            .map(|(_, outcome)| outcome)
    }
}
