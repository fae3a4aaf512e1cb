//! Client configuration.
//!
//! # Design
//! `ClientConfig` is plain data with vendor defaults filled in. It is checked
//! once, when a `TurnitinClient` is built, and never changes afterwards.

use std::time::Duration;

use serde::Deserialize;

use crate::error::TurnitinError;

pub const DEFAULT_HOST: &str = "api.turnitin.com";
pub const DEFAULT_ENDPOINT: &str = "/api.asp";
pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 30;

/// Connection and account settings for the remote service.
///
/// `account_id` and `shared_secret` are required; an empty value is rejected
/// by [`ClientConfig::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub account_id: String,
    pub shared_secret: String,
    /// Host name, optionally with `:port`.
    pub host: String,
    pub endpoint: String,
    /// HTTPS on port 443 when true; plain HTTP is only meant for local mocks.
    pub use_tls: bool,
    /// Testing mode: deterministic ids, `diagnostic=1`, results suppressed.
    pub testing: bool,
    pub read_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            account_id: String::new(),
            shared_secret: String::new(),
            host: DEFAULT_HOST.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            use_tls: true,
            testing: false,
            read_timeout_secs: DEFAULT_READ_TIMEOUT_SECS,
        }
    }
}

impl ClientConfig {
    pub fn new(account_id: &str, shared_secret: &str) -> Self {
        Self {
            account_id: account_id.to_string(),
            shared_secret: shared_secret.to_string(),
            ..Self::default()
        }
    }

    pub fn with_host(mut self, host: &str) -> Self {
        self.host = host.trim_end_matches('/').to_string();
        self
    }

    pub fn with_tls(mut self, use_tls: bool) -> Self {
        self.use_tls = use_tls;
        self
    }

    pub fn with_testing(mut self, testing: bool) -> Self {
        self.testing = testing;
        self
    }

    /// Load from `TURNITIN_*` environment variables. Unset optional variables
    /// keep their defaults.
    pub fn from_env() -> Result<Self, TurnitinError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, TurnitinError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let account_id = lookup("TURNITIN_ACCOUNT_ID").ok_or(TurnitinError::MissingAccountId)?;
        let shared_secret =
            lookup("TURNITIN_SHARED_SECRET").ok_or(TurnitinError::MissingSharedSecret)?;
        let mut config = Self::new(&account_id, &shared_secret);
        if let Some(host) = lookup("TURNITIN_HOST") {
            config = config.with_host(&host);
        }
        if let Some(endpoint) = lookup("TURNITIN_ENDPOINT") {
            config.endpoint = endpoint;
        }
        if let Some(value) = lookup("TURNITIN_USE_TLS") {
            config.use_tls = parse_bool("TURNITIN_USE_TLS", &value)?;
        }
        if let Some(value) = lookup("TURNITIN_TESTING") {
            config.testing = parse_bool("TURNITIN_TESTING", &value)?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), TurnitinError> {
        if self.account_id.trim().is_empty() {
            return Err(TurnitinError::MissingAccountId);
        }
        if self.shared_secret.is_empty() {
            return Err(TurnitinError::MissingSharedSecret);
        }
        if self.host.trim().is_empty() {
            return Err(TurnitinError::InvalidConfig("host must not be empty".to_string()));
        }
        if !self.endpoint.starts_with('/') {
            return Err(TurnitinError::InvalidConfig(format!(
                "endpoint must start with '/': {}",
                self.endpoint
            )));
        }
        Ok(())
    }

    /// `https://host` or `http://host`.
    pub fn base_url(&self) -> String {
        let scheme = if self.use_tls { "https" } else { "http" };
        format!("{scheme}://{}", self.host)
    }

    /// Full URL of the API endpoint, without a query string.
    pub fn endpoint_url(&self) -> String {
        format!("{}{}", self.base_url(), self.endpoint)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool, TurnitinError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(TurnitinError::InvalidConfig(format!("{name}: not a boolean: {other}"))),
    }
}
