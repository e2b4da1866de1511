//! Identity service credentials
//!
//! Registers the role's account (ignoring "already exists" and every other
//! failure), then logs in. Only the login result decides success.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::json;

use crate::common::config::{AccountConfig, Config, Timeouts};
use crate::common::{Error, Result};
use crate::http::{HttpExecutor, Method, RequestSpec};
use crate::scenario::state::lookup;

use super::CredentialProvider;

const REGISTRATION_PATH: &str = "/identity/users/registration";
const LOGIN_PATH: &str = "/identity/auth/token";
const TOKEN_PATH: &str = "result.token";

/// Credential provider backed by the identity service
pub struct IdentityCredentials<'a> {
    executor: &'a dyn HttpExecutor,
    base_url: String,
    accounts: BTreeMap<String, AccountConfig>,
    timeouts: &'a Timeouts,
}

impl<'a> IdentityCredentials<'a> {
    /// Build a provider for the `identity` service of the configuration
    pub fn from_config(config: &'a Config, executor: &'a dyn HttpExecutor) -> Result<Self> {
        let base_url = config
            .service_url("identity")?
            .trim_end_matches('/')
            .to_string();
        Ok(Self {
            executor,
            base_url,
            accounts: config.accounts.clone(),
            timeouts: &config.timeouts,
        })
    }

    /// Best-effort registration; the outcome is only logged
    async fn register(&self, role: &str, account: &AccountConfig) {
        let request = RequestSpec::new(
            Method::Post,
            format!("{}{}", self.base_url, REGISTRATION_PATH),
            self.timeouts.registration(),
        )
        .with_json(json!({
            "username": account.username,
            "password": account.password,
            "email": account.email,
            "firstName": account.first_name,
            "lastName": account.last_name,
        }));

        match self.executor.execute(&request).await {
            Ok(response) if (200..300).contains(&response.status) => {
                tracing::debug!(%role, username = %account.username, "Registered account");
            }
            Ok(response) => {
                tracing::debug!(
                    %role,
                    status = response.status,
                    "Registration rejected, assuming the account exists"
                );
            }
            Err(e) => {
                tracing::debug!(%role, error = %e, "Registration request failed, continuing to login");
            }
        }
    }

    async fn login(&self, role: &str, account: &AccountConfig) -> Result<String> {
        let request = RequestSpec::new(
            Method::Post,
            format!("{}{}", self.base_url, LOGIN_PATH),
            self.timeouts.request(),
        )
        .with_json(json!({
            "username": account.username,
            "password": account.password,
        }));

        let response = self
            .executor
            .execute(&request)
            .await
            .map_err(|e| Error::setup(role, format!("login request failed: {}", e)))?;

        if response.status != 200 {
            return Err(Error::setup(
                role,
                format!("login returned HTTP {}", response.status),
            ));
        }

        response
            .body
            .json()
            .and_then(|body| lookup(body, TOKEN_PATH))
            .and_then(|token| token.as_str())
            .filter(|token| !token.is_empty())
            .map(str::to_string)
            .ok_or_else(|| Error::setup(role, format!("login response has no {}", TOKEN_PATH)))
    }
}

#[async_trait]
impl CredentialProvider for IdentityCredentials<'_> {
    async fn obtain_credentials(&self, role: &str) -> Result<String> {
        let account = self
            .accounts
            .get(role)
            .ok_or_else(|| Error::setup(role, "no account configured"))?;

        self.register(role, account).await;
        self.login(role, account).await
    }
}
