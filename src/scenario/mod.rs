//! Scenario graph
//!
//! Reads YAML scenarios of ordered, categorized steps and runs them one
//! at a time. Later steps consume values extracted by earlier ones through
//! the scenario state, and steps whose dependencies were never satisfied
//! are skipped instead of failing.

mod config;
mod runner;
pub mod state;
pub mod template;

pub use config::*;
pub use runner::{run, run_scenario};
pub use state::ScenarioState;
