//! Worker configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (STOWAWAY_*)
//! 2. TOML config file (if STOWAWAY_CONFIG_FILE set)
//! 3. Built-in defaults
//!
//! The loaded value is injected into the worker at process start; nothing in
//! the worker reads the cache name or version from global state.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

mod validation;

pub use validation::ConfigError;

/// Worker configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (STOWAWAY_*)
/// 2. TOML config file (if STOWAWAY_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application prefix of every cache name.
    ///
    /// Set via STOWAWAY_APP_NAME environment variable.
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// Cache version; bumping it retires every older cache at activation.
    ///
    /// Set via STOWAWAY_VERSION environment variable.
    #[serde(default = "default_version")]
    pub version: String,

    /// Origin served by the worker, e.g. `https://blog.example.com`.
    ///
    /// Set via STOWAWAY_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Paths fetched and stored during install.
    ///
    /// Set via STOWAWAY_PRECACHE environment variable (`["/", "/about/"]`).
    #[serde(default = "default_precache")]
    pub precache: Vec<String>,

    /// Page returned for document requests when both network and cache miss.
    ///
    /// Set via STOWAWAY_OFFLINE_PAGE environment variable.
    #[serde(default = "default_offline_page")]
    pub offline_page: String,

    /// Path to SQLite cache database.
    ///
    /// Set via STOWAWAY_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via STOWAWAY_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per request.
    ///
    /// Set via STOWAWAY_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via STOWAWAY_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Activate right after a successful install instead of waiting.
    ///
    /// Set via STOWAWAY_SKIP_WAITING environment variable.
    #[serde(default = "default_true")]
    pub skip_waiting: bool,

    /// Run the install phase when the process starts.
    ///
    /// Set via STOWAWAY_INSTALL_ON_START environment variable.
    #[serde(default = "default_true")]
    pub install_on_start: bool,
}

fn default_app_name() -> String {
    "sherlock-ramos".into()
}

fn default_version() -> String {
    "v1.0.0".into()
}

fn default_origin() -> String {
    "http://localhost:1313".into()
}

fn default_precache() -> Vec<String> {
    vec!["/".into(), "/posts/".into(), "/about/".into(), "/offline.html".into()]
}

fn default_offline_page() -> String {
    "/offline.html".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./stowaway-cache.sqlite")
}

fn default_user_agent() -> String {
    "stowaway/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
            version: default_version(),
            origin: default_origin(),
            precache: default_precache(),
            offline_page: default_offline_page(),
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
            skip_waiting: true,
            install_on_start: true,
        }
    }
}

impl AppConfig {
    /// Cache name derived from app name and version: `<app>-<version>`.
    pub fn cache_name(&self) -> String {
        format!("{}-{}", self.app_name, self.version)
    }

    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Parsed serving origin.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the origin is not an absolute URL.
    pub fn origin_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.origin)
            .map_err(|e| ConfigError::Invalid { field: "origin".into(), reason: e.to_string() })
    }

    /// Resolve a site path (e.g. `/posts/`) against the serving origin.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the origin or the path cannot be
    /// parsed, or if the path resolves to another origin (`//host/x`).
    pub fn resolve(&self, path: &str) -> Result<Url, ConfigError> {
        let origin = self.origin_url()?;
        let url = origin
            .join(path)
            .map_err(|e| ConfigError::Invalid { field: "precache".into(), reason: format!("{path}: {e}") })?;

        if url.origin() != origin.origin() {
            return Err(ConfigError::Invalid {
                field: "precache".into(),
                reason: format!("{path} resolves outside {}", origin.origin().ascii_serialization()),
            });
        }
        Ok(url)
    }

    /// Absolute URLs of the precache set, in declaration order.
    pub fn precache_urls(&self) -> Result<Vec<Url>, ConfigError> {
        self.precache.iter().map(|path| self.resolve(path)).collect()
    }

    /// Absolute URL of the offline fallback page.
    pub fn offline_url(&self) -> Result<Url, ConfigError> {
        self.resolve(&self.offline_page)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `STOWAWAY_`
    /// 2. TOML file from `STOWAWAY_CONFIG_FILE` (if set)
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

        if let Ok(config_path) = std::env::var("STOWAWAY_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("STOWAWAY_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
