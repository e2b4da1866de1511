//! Credential setup
//!
//! Tokens for every role a scenario declares are obtained before the first
//! step runs. Any failure here aborts the whole run.

mod identity;

pub use identity::IdentityCredentials;

use async_trait::async_trait;
use colored::Colorize;
use serde_json::Value;

use crate::common::{truncate_chars, Result};
use crate::scenario::state::token_slot;
use crate::scenario::ScenarioState;

/// Characters of a token shown in the setup output
const TOKEN_PREVIEW_CHARS: usize = 16;

/// Source of bearer tokens, one per role
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn obtain_credentials(&self, role: &str) -> Result<String>;
}

/// Obtain a token for each role and seed a fresh scenario state with them
pub async fn acquire(provider: &dyn CredentialProvider, roles: &[String]) -> Result<ScenarioState> {
    let mut state = ScenarioState::new();
    if roles.is_empty() {
        return Ok(state);
    }

    println!("\n{}", "Setup:".cyan());
    for role in roles {
        match provider.obtain_credentials(role).await {
            Ok(token) => {
                println!(
                    "  {} {} token: {}...",
                    "✓".green(),
                    role,
                    truncate_chars(&token, TOKEN_PREVIEW_CHARS).dimmed()
                );
                state.set(token_slot(role), Value::String(token));
            }
            Err(e) => {
                println!("  {} {} token: {}", "✗".red(), role, e);
                return Err(e);
            }
        }
    }

    Ok(state)
}
