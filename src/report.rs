//! Run summary and exit status

use std::fmt::Write as _;

use chrono::{DateTime, Local};
use colored::Colorize;
use serde::Serialize;

use crate::common::Error;
use crate::ledger::{Ledger, StepId};

const RULE_WIDTH: usize = 70;

/// Process exit status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// Every executed step passed
    Success,
    /// At least one step failed
    Failures,
    /// Credentials could not be obtained; no step ran
    SetupAborted,
    /// Configuration or scenario could not be loaded
    Invalid,
}

impl ExitStatus {
    pub fn code(self) -> i32 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::Failures => 1,
            ExitStatus::SetupAborted => 2,
            ExitStatus::Invalid => 3,
        }
    }

    /// Exit status for an error that ended the run early
    pub fn from_error(error: &Error) -> Self {
        if error.is_setup() {
            ExitStatus::SetupAborted
        } else {
            ExitStatus::Invalid
        }
    }
}

/// A failed or skipped step with its reason
#[derive(Debug, Clone, Serialize)]
pub struct ReportEntry {
    #[serde(flatten)]
    pub step: StepId,
    pub reason: String,
}

/// Aggregated counts of a finished run
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub scenario: String,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub total: usize,
    pub failures: Vec<ReportEntry>,
    pub skips: Vec<ReportEntry>,
}

fn entries<'a>(items: impl Iterator<Item = (&'a StepId, &'a str)>) -> Vec<ReportEntry> {
    items
        .map(|(step, reason)| ReportEntry {
            step: step.clone(),
            reason: reason.to_string(),
        })
        .collect()
}

impl Summary {
    pub fn from_ledger(scenario: &str, ledger: &Ledger) -> Self {
        let failures = entries(ledger.failed());
        let skips = entries(ledger.skipped());
        let passed = ledger.passed().count();
        Self {
            scenario: scenario.to_string(),
            passed,
            failed: failures.len(),
            skipped: skips.len(),
            total: ledger.len(),
            failures,
            skips,
        }
    }

    pub fn exit_status(&self) -> ExitStatus {
        if self.failed > 0 {
            ExitStatus::Failures
        } else {
            ExitStatus::Success
        }
    }

    /// Human-readable summary block
    pub fn render(&self) -> String {
        let rule = "=".repeat(RULE_WIDTH);
        let mut out = String::new();

        let _ = writeln!(out, "\n{}", rule);
        let _ = writeln!(out, "{}", "TEST SUMMARY".bold());
        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(out, "{} {}", "PASSED: ".green(), self.passed);
        let _ = writeln!(out, "{} {}", "FAILED: ".red(), self.failed);
        let _ = writeln!(out, "{} {}", "SKIPPED:".yellow(), self.skipped);
        let _ = writeln!(out, "{} {}", "TOTAL:  ".bold(), self.total);

        if !self.failures.is_empty() {
            let _ = writeln!(out, "\n{}", "Failed Tests:".red());
            for entry in &self.failures {
                let _ = writeln!(out, "   - {} ({})", entry.step.name, entry.reason);
            }
        }

        if !self.skips.is_empty() {
            let _ = writeln!(out, "\n{}", "Skipped Tests:".yellow());
            for entry in &self.skips {
                let _ = writeln!(out, "   - {} ({})", entry.step.name, entry.reason);
            }
        }

        let _ = write!(out, "\n{}", rule);
        out
    }
}

/// Banner printed before setup
pub fn print_header(scenario: &str, description: Option<&str>, started: DateTime<Local>) {
    let rule = "=".repeat(RULE_WIDTH);
    println!("\n{}", rule);
    println!("{}", scenario.to_uppercase().white().bold());
    if let Some(description) = description {
        println!("{}", description.dimmed());
    }
    println!("Started at: {}", started.format("%Y-%m-%d %H:%M:%S"));
    println!("{}", rule);
}

pub fn print_completed(finished: DateTime<Local>) {
    println!("\nCompleted at: {}", finished.format("%Y-%m-%d %H:%M:%S"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Outcome;

    fn ledger() -> Ledger {
        let mut ledger = Ledger::new();
        let step = |ordinal: usize, name: &str| StepId {
            category: "Book Borrow".to_string(),
            label: "USER".to_string(),
            ordinal,
            name: name.to_string(),
        };
        ledger.record(step(1, "Borrow Book"), Outcome::Passed);
        ledger.record(step(2, "Get Active Borrows"), Outcome::Failed("HTTP 400".to_string()));
        ledger.record(
            step(3, "Return Book"),
            Outcome::Skipped("missing dependency: borrow_id".to_string()),
        );
        ledger.record(step(4, "Get Borrow History"), Outcome::Passed);
        ledger
    }

    #[test]
    fn test_counts_account_for_every_step() {
        let summary = Summary::from_ledger("Books", &ledger());
        assert_eq!(summary.passed, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.passed + summary.failed + summary.skipped, summary.total);
        assert_eq!(summary.failures[0].step.name, "Get Active Borrows");
        assert_eq!(summary.failures[0].reason, "HTTP 400");
        assert_eq!(summary.skips[0].step.ordinal, 3);
        assert_eq!(summary.exit_status(), ExitStatus::Failures);
    }

    #[test]
    fn test_skips_alone_do_not_fail_the_run() {
        let mut ledger = Ledger::new();
        ledger.record(
            StepId {
                category: "Admin".to_string(),
                label: "ADMIN".to_string(),
                ordinal: 1,
                name: "Delete Book".to_string(),
            },
            Outcome::Skipped("deferred".to_string()),
        );
        let summary = Summary::from_ledger("Books", &ledger);
        assert_eq!(summary.exit_status(), ExitStatus::Success);
        assert_eq!(summary.exit_status().code(), 0);
    }

    #[test]
    fn test_render_lists_failures_and_skips() {
        colored::control::set_override(false);
        let rendered = Summary::from_ledger("Books", &ledger()).render();
        assert!(rendered.contains("PASSED:  2"), "{}", rendered);
        assert!(rendered.contains("TOTAL:   4"), "{}", rendered);
        assert!(rendered.contains("   - Get Active Borrows (HTTP 400)"));
        assert!(rendered.contains("   - Return Book (missing dependency: borrow_id)"));
    }

    #[test]
    fn test_json_entries_are_flat() {
        let summary = Summary::from_ledger("Books", &ledger());
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["failures"][0]["ordinal"], 2);
        assert_eq!(json["failures"][0]["category"], "Book Borrow");
        assert_eq!(json["failures"][0]["reason"], "HTTP 400");
        assert_eq!(json["total"], 4);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(ExitStatus::from_error(&Error::setup("admin", "down")).code(), 2);
        assert_eq!(ExitStatus::from_error(&Error::Config("bad".to_string())).code(), 3);
        assert_eq!(ExitStatus::Failures.code(), 1);
    }
}
