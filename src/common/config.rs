//! Configuration file handling

use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use super::paths::config_path;
use super::{Error, Result};

/// Prefix for environment variables overriding service base URLs
const SERVICE_ENV_PREFIX: &str = "APIPROBE_SERVICE_";

/// Main configuration structure
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Base URLs of the services under test, by name (merged over defaults)
    #[serde(default = "default_services", deserialize_with = "merge_services")]
    pub services: BTreeMap<String, String>,

    /// Accounts used to obtain credentials, by role (merged over defaults)
    #[serde(default = "default_accounts", deserialize_with = "merge_accounts")]
    pub accounts: BTreeMap<String, AccountConfig>,

    /// Timeout settings
    #[serde(default)]
    pub timeouts: Timeouts,

    /// Response preview settings
    #[serde(default)]
    pub preview: PreviewConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            services: default_services(),
            accounts: default_accounts(),
            timeouts: Timeouts::default(),
            preview: PreviewConfig::default(),
        }
    }
}

fn default_services() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("identity".to_string(), "http://localhost:8080".to_string()),
        ("book".to_string(), "http://localhost:8086".to_string()),
    ])
}

fn default_accounts() -> BTreeMap<String, AccountConfig> {
    BTreeMap::from([
        (
            "admin".to_string(),
            AccountConfig {
                username: "admin_test".to_string(),
                password: "Admin@123".to_string(),
                email: "admin@test.com".to_string(),
                first_name: "Admin".to_string(),
                last_name: "User".to_string(),
            },
        ),
        (
            "user".to_string(),
            AccountConfig {
                username: "user_test".to_string(),
                password: "User@123".to_string(),
                email: "user@test.com".to_string(),
                first_name: "Regular".to_string(),
                last_name: "User".to_string(),
            },
        ),
    ])
}

fn merge_services<'de, D>(deserializer: D) -> std::result::Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let mut services = default_services();
    services.extend(BTreeMap::<String, String>::deserialize(deserializer)?);
    Ok(services)
}

fn merge_accounts<'de, D>(
    deserializer: D,
) -> std::result::Result<BTreeMap<String, AccountConfig>, D::Error>
where
    D: Deserializer<'de>,
{
    let mut accounts = default_accounts();
    accounts.extend(BTreeMap::<String, AccountConfig>::deserialize(deserializer)?);
    Ok(accounts)
}

/// Account registered with and logged into the identity service
#[derive(Debug, Deserialize, Clone)]
pub struct AccountConfig {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

/// Timeout settings in seconds
#[derive(Debug, Deserialize)]
pub struct Timeouts {
    /// Timeout for every scenario request and the login call
    #[serde(default = "default_request")]
    pub request_secs: u64,

    /// Timeout for the best-effort registration call
    #[serde(default = "default_registration")]
    pub registration_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            request_secs: default_request(),
            registration_secs: default_registration(),
        }
    }
}

fn default_request() -> u64 {
    10
}
fn default_registration() -> u64 {
    5
}

impl Timeouts {
    pub fn request(&self) -> Duration {
        Duration::from_secs(self.request_secs)
    }

    pub fn registration(&self) -> Duration {
        Duration::from_secs(self.registration_secs)
    }
}

/// Response preview limits, in characters
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct PreviewConfig {
    /// Maximum characters of pretty-printed JSON bodies
    #[serde(default = "default_json_chars")]
    pub json_chars: usize,

    /// Maximum characters of non-JSON bodies
    #[serde(default = "default_text_chars")]
    pub text_chars: usize,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            json_chars: default_json_chars(),
            text_chars: default_text_chars(),
        }
    }
}

fn default_json_chars() -> usize {
    500
}
fn default_text_chars() -> usize {
    200
}

impl Config {
    /// Load configuration from an explicit path or the default config file
    ///
    /// Returns default configuration if no file exists. Environment
    /// overrides are applied in both cases.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        config.apply_env(std::env::vars());
        Ok(config)
    }

    /// Parse a configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::ConfigParse(e.to_string()))
    }

    /// Apply base URL overrides from environment variables
    ///
    /// `APIPROBE_IDENTITY_URL` and `APIPROBE_BOOK_URL` are shorthands for
    /// `APIPROBE_SERVICE_IDENTITY` and `APIPROBE_SERVICE_BOOK`.
    pub fn apply_env<I>(&mut self, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            let service = match key.as_str() {
                "APIPROBE_IDENTITY_URL" => "identity".to_string(),
                "APIPROBE_BOOK_URL" => "book".to_string(),
                other => match other.strip_prefix(SERVICE_ENV_PREFIX) {
                    Some(name) if !name.is_empty() => name.to_ascii_lowercase(),
                    _ => continue,
                },
            };
            tracing::debug!(%service, url = %value, "Service URL overridden from environment");
            self.services.insert(service, value);
        }
    }

    /// Get the base URL of a named service
    pub fn service_url(&self, name: &str) -> Result<&str> {
        self.services
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| Error::Config(format!("Unknown service '{}'", name)))
    }

    /// Get the account configured for a role
    pub fn account(&self, role: &str) -> Option<&AccountConfig> {
        self.accounts.get(role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_local_services() {
        let config = Config::default();
        assert_eq!(config.service_url("identity").unwrap(), "http://localhost:8080");
        assert_eq!(config.service_url("book").unwrap(), "http://localhost:8086");
        assert_eq!(config.timeouts.request_secs, 10);
        assert_eq!(config.timeouts.registration_secs, 5);
        assert_eq!(config.account("admin").unwrap().username, "admin_test");
        assert_eq!(config.account("user").unwrap().username, "user_test");
    }

    #[test]
    fn test_partial_file_keeps_section_defaults() {
        let config = Config::parse(
            r#"
            [timeouts]
            request_secs = 3

            [preview]
            json_chars = 80
            "#,
        )
        .unwrap();
        assert_eq!(config.timeouts.request_secs, 3);
        assert_eq!(config.timeouts.registration_secs, 5);
        assert_eq!(config.preview.json_chars, 80);
        assert_eq!(config.preview.text_chars, 200);
        assert!(config.services.contains_key("book"));
    }

    #[test]
    fn test_tables_merge_over_defaults() {
        let config = Config::parse(
            r#"
            [services]
            catalog = "http://catalog:9000"

            [accounts.reader]
            username = "reader"
            password = "secret"
            "#,
        )
        .unwrap();
        assert_eq!(config.service_url("catalog").unwrap(), "http://catalog:9000");
        assert_eq!(config.service_url("book").unwrap(), "http://localhost:8086");
        let reader = config.account("reader").unwrap();
        assert_eq!(reader.password, "secret");
        assert!(reader.email.is_empty());
        assert_eq!(config.account("user").unwrap().username, "user_test");
    }

    #[test]
    fn test_file_entry_overrides_default_role() {
        let config = Config::parse(
            r#"
            [services]
            book = "http://book.internal"

            [accounts.admin]
            username = "ops"
            password = "pw"
            "#,
        )
        .unwrap();
        assert_eq!(config.service_url("book").unwrap(), "http://book.internal");
        assert_eq!(config.service_url("identity").unwrap(), "http://localhost:8080");
        assert_eq!(config.account("admin").unwrap().username, "ops");
        assert_eq!(config.account("user").unwrap().username, "user_test");
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_env(vec![
            ("APIPROBE_BOOK_URL".to_string(), "http://book:1".to_string()),
            ("APIPROBE_SERVICE_CATALOG".to_string(), "http://cat:2".to_string()),
            ("APIPROBE_SERVICE_".to_string(), "ignored".to_string()),
            ("HOME".to_string(), "/root".to_string()),
        ]);
        assert_eq!(config.service_url("book").unwrap(), "http://book:1");
        assert_eq!(config.service_url("catalog").unwrap(), "http://cat:2");
        assert_eq!(config.services.len(), 3);
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let err = Config::parse("services = 3").unwrap_err();
        assert!(matches!(err, Error::ConfigParse(_)));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[services]\nbook = \"http://127.0.0.1:1\"").unwrap();
        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.service_url("book").unwrap(), "http://127.0.0.1:1");

        let missing = Config::from_file(Path::new("/nonexistent/apiprobe.toml"));
        assert!(matches!(missing, Err(Error::FileRead { .. })));
    }
}
