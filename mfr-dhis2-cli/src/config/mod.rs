//! Application configuration
//!
//! Layered as built-in defaults, then an optional TOML file, then
//! environment variables (a `.env` file is loaded by `main` beforehand).
//! The resolved [`Config`] is passed explicitly to whatever needs it.

pub mod repository;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::api::{ResilienceConfig, RetryConfig};

const APP_DIR: &str = "mfr-dhis2";
const CONFIG_FILE: &str = "config.toml";
const QUEUE_DB_FILE: &str = "failed_queue.db";

/// Default datastore namespace for MFR approval records
pub const DEFAULT_APPROVAL_NAMESPACE: &str = "Dhis2-MFRApproval";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub dhis2: Dhis2Config,
    pub retry: RetrySettings,
    pub http: HttpSettings,
    pub queue: QueueSettings,
    pub approval: ApprovalSettings,
}

/// DHIS2 connection settings
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Dhis2Config {
    /// API base URL, e.g. `https://dhis2.example.org/api`
    pub base_url: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        let retry = RetryConfig::default();
        Self {
            max_attempts: retry.max_attempts,
            delay_ms: retry.delay.as_millis() as u64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub timeout_secs: u64,
    pub request_logging: bool,
    /// Trace-log JSON request bodies
    pub log_bodies: bool,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            request_logging: true,
            log_bodies: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueSettings {
    /// SQLite file backing the failed queue; defaults under the user data dir
    pub database_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApprovalSettings {
    pub namespace: String,
}

impl Default for ApprovalSettings {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_APPROVAL_NAMESPACE.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from `path` (or the default location if it exists)
    /// and the process environment.
    ///
    /// Not validated here; commands that talk to DHIS2 call [`Config::validate`].
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid configuration TOML")
    }

    /// Override settings from environment-style variables
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("DHIS2_HOST") {
            self.dhis2.base_url = host;
        }
        if let Some(user) = lookup("DHIS2_USER") {
            self.dhis2.username = user;
        }
        if let Some(password) = lookup("DHIS2_PASSWORD") {
            self.dhis2.password = password;
        }
        if let Some(attempts) = lookup("DHIS2_RETRY_MAX_ATTEMPTS") {
            self.retry.max_attempts = attempts
                .trim()
                .parse()
                .with_context(|| format!("DHIS2_RETRY_MAX_ATTEMPTS is not a number: {}", attempts))?;
        }
        if let Some(delay) = lookup("DHIS2_RETRY_DELAY_MS") {
            self.retry.delay_ms = delay
                .trim()
                .parse()
                .with_context(|| format!("DHIS2_RETRY_DELAY_MS is not a number: {}", delay))?;
        }
        if let Some(timeout) = lookup("DHIS2_TIMEOUT_SECS") {
            self.http.timeout_secs = timeout
                .trim()
                .parse()
                .with_context(|| format!("DHIS2_TIMEOUT_SECS is not a number: {}", timeout))?;
        }
        if let Some(path) = lookup("MFR_DHIS2_QUEUE_DB") {
            self.queue.database_path = Some(PathBuf::from(path));
        }
        if let Some(namespace) = lookup("DHIS2_APPROVAL_NAMESPACE") {
            self.approval.namespace = namespace;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.dhis2.base_url.trim().is_empty() {
            anyhow::bail!("DHIS2 base URL is not configured (set DHIS2_HOST or [dhis2].base_url)");
        }
        if !self.dhis2.base_url.starts_with("http://") && !self.dhis2.base_url.starts_with("https://") {
            anyhow::bail!("DHIS2 base URL must start with http:// or https://: {}", self.dhis2.base_url);
        }
        if self.dhis2.username.is_empty() || self.dhis2.password.is_empty() {
            anyhow::bail!("DHIS2 credentials are not configured (set DHIS2_USER and DHIS2_PASSWORD)");
        }
        if self.retry.max_attempts == 0 {
            anyhow::bail!("retry.max_attempts must be at least 1");
        }
        if self.approval.namespace.trim().is_empty() {
            anyhow::bail!("approval.namespace must not be empty");
        }
        Ok(())
    }

    pub fn resilience(&self) -> ResilienceConfig {
        ResilienceConfig::builder()
            .max_attempts(self.retry.max_attempts)
            .retry_delay(Duration::from_millis(self.retry.delay_ms))
            .request_timeout(Duration::from_secs(self.http.timeout_secs))
            .request_logging(self.http.request_logging)
            .log_bodies(self.http.log_bodies)
            .build()
    }

    /// Failed queue database location, falling back to the user data dir
    pub fn queue_database_path(&self) -> PathBuf {
        self.queue.database_path.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .map(|dir| dir.join(APP_DIR).join(QUEUE_DB_FILE))
                .unwrap_or_else(|| PathBuf::from(QUEUE_DB_FILE))
        })
    }
}

/// `<config dir>/mfr-dhis2/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}
