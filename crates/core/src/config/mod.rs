//! Worker configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (LUMINA_SW_*)
//! 2. TOML config file (if LUMINA_SW_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Worker configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (LUMINA_SW_*)
/// 2. TOML config file (if LUMINA_SW_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application name, the prefix of every cache namespace.
    ///
    /// Set via LUMINA_SW_APP_NAME environment variable.
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// Cache version. Bumping it is the only way to invalidate caches across deploys.
    ///
    /// Set via LUMINA_SW_CACHE_VERSION environment variable.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// Origin that relative URLs are resolved against.
    ///
    /// Set via LUMINA_SW_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Path to SQLite cache database.
    ///
    /// Set via LUMINA_SW_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Paths stored on install. All of them must fetch successfully.
    #[serde(default = "default_precache_urls")]
    pub precache_urls: Vec<String>,

    /// Offline page served to HTML navigations when nothing else is available.
    #[serde(default = "default_offline_path")]
    pub offline_path: String,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via LUMINA_SW_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Optional HTTP timeout in milliseconds. Unset means fetches may hang.
    ///
    /// Set via LUMINA_SW_TIMEOUT_MS environment variable.
    #[serde(default)]
    pub timeout_ms: Option<u64>,

    /// Session cookie attached to requests whose credentials mode allows it.
    ///
    /// Set via LUMINA_SW_SESSION_COOKIE environment variable.
    #[serde(default)]
    pub session_cookie: Option<String>,

    #[serde(default = "default_notification_title")]
    pub notification_title: String,

    /// Body used when a push arrives without payload.
    #[serde(default = "default_notification_body")]
    pub notification_body: String,

    #[serde(default = "default_notification_tag")]
    pub notification_tag: String,

    #[serde(default = "default_notification_icon")]
    pub notification_icon: String,

    #[serde(default = "default_notification_badge")]
    pub notification_badge: String,
}

fn default_app_name() -> String {
    "lumina-reader".into()
}

fn default_cache_version() -> String {
    "v1.0.0".into()
}

fn default_origin() -> String {
    "http://localhost:8000".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./lumina-sw-cache.sqlite")
}

fn default_precache_urls() -> Vec<String> {
    [
        "/",
        "/static/css/output.css",
        "/static/js/htmx.min.js",
        "/static/js/alpine.min.js",
        "/static/favicon.svg",
        "/static/manifest.json",
        "/offline/",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_offline_path() -> String {
    "/offline/".into()
}

fn default_user_agent() -> String {
    "lumina-sw/0.1".into()
}

fn default_notification_title() -> String {
    "Lumina Reader".into()
}

fn default_notification_body() -> String {
    "New notification".into()
}

fn default_notification_tag() -> String {
    "lumina-notification".into()
}

fn default_notification_icon() -> String {
    "/static/icons/icon-192.png".into()
}

fn default_notification_badge() -> String {
    "/static/icons/badge-72.png".into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
            cache_version: default_cache_version(),
            origin: default_origin(),
            db_path: default_db_path(),
            precache_urls: default_precache_urls(),
            offline_path: default_offline_path(),
            user_agent: default_user_agent(),
            timeout_ms: None,
            session_cookie: None,
            notification_title: default_notification_title(),
            notification_body: default_notification_body(),
            notification_tag: default_notification_tag(),
            notification_icon: default_notification_icon(),
            notification_badge: default_notification_badge(),
        }
    }
}

impl AppConfig {
    /// Name of the current namespace: `<app_name>-<cache_version>`.
    pub fn cache_name(&self) -> String {
        format!("{}-{}", self.app_name, self.cache_version)
    }

    /// Prefix shared by every namespace of this application.
    pub fn namespace_prefix(&self) -> String {
        format!("{}-", self.app_name)
    }

    /// Timeout as Duration for use with reqwest, if configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `LUMINA_SW_`
    /// 2. TOML file from `LUMINA_SW_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("LUMINA_SW_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("LUMINA_SW_")
                .ignore(&["config_file"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.app_name, "lumina-reader");
        assert_eq!(config.cache_version, "v1.0.0");
        assert_eq!(config.db_path, PathBuf::from("./lumina-sw-cache.sqlite"));
        assert_eq!(config.offline_path, "/offline/");
        assert_eq!(config.precache_urls.len(), 7);
        assert!(config.precache_urls.contains(&"/offline/".to_string()));
        assert!(config.timeout_ms.is_none());
        assert!(config.session_cookie.is_none());
        assert_eq!(config.notification_tag, "lumina-notification");
    }

    #[test]
    fn test_cache_name() {
        let config = AppConfig::default();
        assert_eq!(config.cache_name(), "lumina-reader-v1.0.0");
        assert_eq!(config.namespace_prefix(), "lumina-reader-");
        assert!(config.cache_name().starts_with(&config.namespace_prefix()));
    }

    #[test]
    fn test_timeout_duration() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), None);

        let config = AppConfig { timeout_ms: Some(5_000), ..Default::default() };
        assert_eq!(config.timeout(), Some(Duration::from_millis(5_000)));
    }

    #[test]
    fn test_load_from_toml_and_env() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "sw.toml",
                r#"
                cache_version = "v2.0.0"
                precache_urls = ["/", "/offline/"]
                "#,
            )?;
            jail.set_env("LUMINA_SW_CONFIG_FILE", "sw.toml");
            jail.set_env("LUMINA_SW_APP_NAME", "shelf");

            let config = AppConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.cache_name(), "shelf-v2.0.0");
            assert_eq!(config.precache_urls, vec!["/".to_string(), "/offline/".to_string()]);
            Ok(())
        });
    }
}
