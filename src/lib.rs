//! apiprobe - sequential API conformance runner
//!
//! This library runs declarative HTTP scenarios one step at a time,
//! threading extracted values between steps and skipping steps whose
//! dependencies were never satisfied.

pub mod cli;
pub mod commands;
pub mod common;
pub mod fixture;
pub mod http;
pub mod ledger;
pub mod report;
pub mod scenario;
pub mod suites;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use ledger::{Ledger, Outcome, StepId};
