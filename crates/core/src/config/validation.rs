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
    /// - `app_name` is empty or contains whitespace
    /// - `cache_version` is empty or does not start with `v` or a digit
    /// - `origin` is not an absolute http(s) URL
    /// - `timeout_ms` is set below 100ms or above 5 minutes
    /// - `user_agent` is empty
    /// - a `precache_urls` entry is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.app_name.is_empty() || self.app_name.chars().any(char::is_whitespace) {
            return Err(ConfigError::Invalid {
                field: "app_name".into(),
                reason: "must be non-empty and contain no whitespace".into(),
            });
        }

        if self.cache_version.is_empty() {
            return Err(ConfigError::Invalid { field: "cache_version".into(), reason: "must not be empty".into() });
        }

        if !self.cache_version.starts_with(|c: char| c == 'v' || c.is_ascii_digit()) {
            return Err(ConfigError::Invalid {
                field: "cache_version".into(),
                reason: "must start with 'v' or a digit".into(),
            });
        }

        match url::Url::parse(&self.origin) {
            Ok(origin) if matches!(origin.scheme(), "http" | "https") => {}
            Ok(origin) => {
                return Err(ConfigError::Invalid {
                    field: "origin".into(),
                    reason: format!("unsupported scheme: {}", origin.scheme()),
                });
            }
            Err(e) => return Err(ConfigError::Invalid { field: "origin".into(), reason: e.to_string() }),
        }

        if let Some(timeout_ms) = self.timeout_ms {
            if timeout_ms < 100 {
                return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
            }
            if timeout_ms > 300_000 {
                return Err(ConfigError::Invalid {
                    field: "timeout_ms".into(),
                    reason: "must not exceed 5 minutes (300000ms)".into(),
                });
            }
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        if self.precache_urls.iter().any(|url| url.trim().is_empty()) {
            return Err(ConfigError::Invalid {
                field: "precache_urls".into(),
                reason: "entries must not be empty".into(),
            });
        }

        if !self.precache_urls.contains(&self.offline_path) {
            tracing::warn!(
                offline_path = %self.offline_path,
                "offline page is not in the precache manifest; \
                 HTML fallback will degrade to a 503 response"
            );
        }

        Ok(())
    }
}
