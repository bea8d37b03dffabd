//! Runtime configuration
//!
//! Read from `~/.courier/config.yaml` (or the file named by `COURIER_CONFIG`),
//! then overridden field by field from `COURIER_*` environment variables.
//! Anything missing falls back to the defaults in [`crate::constants`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_HTTP_URL, DEFAULT_SANDBOX_ORIGIN, DEFAULT_TICK_INTERVAL_MS, DEFAULT_TIMEOUT_SECS,
};
use crate::models::Backend;

pub const CONFIG_PATH_ENV_VAR: &str = "COURIER_CONFIG";
pub const TIMEOUT_ENV_VAR: &str = "COURIER_TIMEOUT_SECS";
pub const BACKEND_ENV_VAR: &str = "COURIER_BACKEND";
pub const ORIGIN_ENV_VAR: &str = "COURIER_ORIGIN";
pub const DOWNLOAD_DIR_ENV_VAR: &str = "COURIER_DOWNLOAD_DIR";
pub const LOG_DIR_ENV_VAR: &str = "COURIER_LOG_DIR";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub request_timeout_secs: u64,
    /// Backend selected at startup; toggling it at runtime is not saved
    pub default_backend: Backend,
    /// Origin the sandboxed backend pretends to be served from
    pub sandbox_origin: String,
    pub download_dir: PathBuf,
    pub log_dir: PathBuf,
    pub tick_interval_ms: u64,
    pub default_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            default_backend: Backend::Native,
            sandbox_origin: DEFAULT_SANDBOX_ORIGIN.to_string(),
            download_dir: PathBuf::from("."),
            log_dir: PathBuf::from("."),
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            default_url: DEFAULT_HTTP_URL.to_string(),
        }
    }
}

impl Config {
    /// Load the config file (if any) and apply environment overrides.
    /// A broken file is reported and ignored.
    pub fn load() -> Self {
        let path = config_path();
        let mut config = match path.as_deref().filter(|p| p.exists()) {
            Some(p) => match Config::from_file(p) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!(path = %p.display(), error = %e, "Ignoring unreadable config file");
                    Config::default()
                }
            },
            None => Config::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Config::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Config::default());
        }
        serde_yaml::from_str(content).context("parsing config YAML")
    }

    /// Override fields from environment-style lookups. Unparseable values are skipped.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(secs) = lookup(TIMEOUT_ENV_VAR).and_then(|v| v.trim().parse().ok()) {
            self.request_timeout_secs = secs;
        }
        if let Some(backend) = lookup(BACKEND_ENV_VAR).and_then(|v| Backend::parse(&v)) {
            self.default_backend = backend;
        }
        if let Some(origin) = lookup(ORIGIN_ENV_VAR).filter(|v| !v.is_empty()) {
            self.sandbox_origin = origin;
        }
        if let Some(dir) = lookup(DOWNLOAD_DIR_ENV_VAR).filter(|v| !v.is_empty()) {
            self.download_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup(LOG_DIR_ENV_VAR).filter(|v| !v.is_empty()) {
            self.log_dir = PathBuf::from(dir);
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}

fn config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV_VAR) {
        return Some(PathBuf::from(path));
    }
    dirs::home_dir().map(|home| home.join(".courier").join("config.yaml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = Config::from_yaml("request_timeout_secs: 5\ndefault_backend: sandboxed\n").unwrap();
        assert_eq!(config.request_timeout_secs, 5);
        assert_eq!(config.default_backend, Backend::Sandboxed);
        assert_eq!(config.sandbox_origin, DEFAULT_SANDBOX_ORIGIN);
        assert_eq!(config.tick_interval_ms, DEFAULT_TICK_INTERVAL_MS);
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(Config::from_yaml("  \n").unwrap(), Config::default());
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        assert!(Config::from_yaml("request_timeout_secs: [not a number").is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (TIMEOUT_ENV_VAR, "12"),
            (BACKEND_ENV_VAR, "browser"),
            (ORIGIN_ENV_VAR, "https://app.example.com"),
            (DOWNLOAD_DIR_ENV_VAR, "/tmp/downloads"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.request_timeout_secs, 12);
        assert_eq!(config.default_backend, Backend::Sandboxed);
        assert_eq!(config.sandbox_origin, "https://app.example.com");
        assert_eq!(config.download_dir, PathBuf::from("/tmp/downloads"));
        assert_eq!(config.log_dir, PathBuf::from("."));
    }

    #[test]
    fn test_bad_env_values_are_skipped() {
        let mut config = Config::default();
        config.apply_env(|key| match key {
            TIMEOUT_ENV_VAR => Some("soon".to_string()),
            BACKEND_ENV_VAR => Some("carrier-pigeon".to_string()),
            _ => None,
        });
        assert_eq!(config, Config::default());
    }
}
