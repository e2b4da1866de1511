//! Built-in scenarios

use crate::common::Result;
use crate::scenario::Scenario;

/// Book service suite, embedded at build time
pub const BOOK_SERVICE: &str = include_str!("../scenarios/book_service.yaml");

/// Scenario used when no scenario file is given
pub fn default_scenario() -> Result<Scenario> {
    Scenario::from_yaml(BOOK_SERVICE)
}
