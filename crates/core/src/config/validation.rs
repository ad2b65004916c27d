//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `app_name` or `version` is empty or contains whitespace
    /// - `origin` is not an http(s) origin without a path
    /// - a `precache` entry does not start with `/` or resolves to another origin
    /// - `offline_page` is not part of `precache`
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [("app_name", &self.app_name), ("version", &self.version)] {
            if value.is_empty() {
                return Err(ConfigError::Invalid { field: field.into(), reason: "must not be empty".into() });
            }
            if value.chars().any(char::is_whitespace) {
                return Err(ConfigError::Invalid { field: field.into(), reason: "must not contain whitespace".into() });
            }
        }

        let origin = self.origin_url()?;
        if !matches!(origin.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid {
                field: "origin".into(),
                reason: format!("unsupported scheme: {}", origin.scheme()),
            });
        }
        if origin.path() != "/" || origin.query().is_some() {
            return Err(ConfigError::Invalid { field: "origin".into(), reason: "must not carry a path or query".into() });
        }

        if let Some(path) = self.precache.iter().find(|p| !p.starts_with('/')) {
            return Err(ConfigError::Invalid {
                field: "precache".into(),
                reason: format!("entry must start with '/': {path}"),
            });
        }

        self.precache_urls()?;

        if !self.precache.contains(&self.offline_page) {
            return Err(ConfigError::Invalid {
                field: "offline_page".into(),
                reason: format!("{} must be listed in precache", self.offline_page),
            });
        }

        if self.max_bytes == 0 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must be greater than 0".into() });
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must not exceed 50MB".into() });
        }

        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        if !self.skip_waiting {
            tracing::debug!(
                version = %self.version,
                "skip_waiting disabled; new versions wait for activation or a SKIP_WAITING message"
            );
        }

        Ok(())
    }
}
