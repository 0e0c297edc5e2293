//! Tracing / logging initialisation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log level per component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Global default level: "trace" | "debug" | "info" | "warn" | "error"
    #[serde(default = "default_level")]
    pub level: String,
    /// Per-component overrides, e.g. `starkcodec-rpc → debug`.
    #[serde(default)]
    pub components: BTreeMap<String, String>,
    /// JSON lines (true) or human-readable text (false).
    #[serde(default)]
    pub json: bool,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            components: BTreeMap::new(),
            json: false,
        }
    }
}

impl LogConfig {
    pub fn level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Override the level of one crate. Package names (`starkcodec-rpc`) and
    /// target names (`starkcodec_rpc`) address the same component.
    pub fn component(mut self, name: impl Into<String>, level: impl Into<String>) -> Self {
        self.components.insert(name.into().replace('-', "_"), level.into());
        self
    }

    pub fn json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    /// The `EnvFilter` directive string, e.g. `"info,starkcodec_rpc=debug"`.
    pub fn directives(&self) -> String {
        let mut directives = self.level.clone();
        for (component, level) in &self.components {
            directives.push(',');
            directives.push_str(&component.replace('-', "_"));
            directives.push('=');
            directives.push_str(level);
        }
        directives
    }
}

#[derive(Debug, Error)]
pub enum InitError {
    #[error("invalid log filter `{directives}`: {reason}")]
    Filter { directives: String, reason: String },

    #[error("a global tracing subscriber is already installed")]
    AlreadyInstalled,
}

/// Install the global subscriber. Call once at startup.
pub fn init_tracing(config: &LogConfig) -> Result<(), InitError> {
    let directives = config.directives();
    let filter = EnvFilter::try_new(&directives).map_err(|e| InitError::Filter {
        directives: directives.clone(),
        reason: e.to_string(),
    })?;

    let installed = if config.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .try_init()
    };
    installed.map_err(|_| InitError::AlreadyInstalled)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directives_include_components() {
        let config = LogConfig::default()
            .level("warn")
            .component("starkcodec-rpc", "debug")
            .component("starkcodec_batch", "trace");
        assert_eq!(config.directives(), "warn,starkcodec_batch=trace,starkcodec_rpc=debug");
    }

    #[test]
    fn component_spellings_merge() {
        let config = LogConfig::default()
            .level("info")
            .component("starkcodec-rpc", "debug")
            .component("starkcodec_rpc", "trace");
        assert_eq!(config.components.len(), 1);
        assert_eq!(config.directives(), "info,starkcodec_rpc=trace");
    }

    #[test]
    fn config_defaults_from_json() {
        let config: LogConfig = serde_json::from_str(r#"{"json":true}"#).unwrap();
        assert_eq!(config.level, "info");
        assert!(config.components.is_empty());
        assert!(config.json);
    }

    #[test]
    fn bad_filter_is_rejected() {
        let config = LogConfig::default().level("info,starkcodec_rpc=loud");
        assert!(matches!(init_tracing(&config), Err(InitError::Filter { .. })));
    }

    #[test]
    fn second_install_fails() {
        let config = LogConfig::default().level("off");
        let first = init_tracing(&config);
        let second = init_tracing(&config);
        assert!(first.is_ok() || matches!(first, Err(InitError::AlreadyInstalled)));
        assert!(matches!(second, Err(InitError::AlreadyInstalled)));
    }
}
