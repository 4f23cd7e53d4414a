//! Configuration management for the mailer binary
//!
//! Values come from an optional config file and `MAILER__`-prefixed
//! environment variables (`MAILER__PROVIDER__HOST=smtp.example.com`).

use crate::domain::EmailProviderConfig;
use crate::email::EmailTemplate;
use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

/// Base name of the config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "mailer";

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Send parameters in loose form; validated when the mailer is built
    #[serde(default)]
    pub send_params: Option<Value>,
    /// Delivery provider
    #[serde(default)]
    pub provider: EmailProviderConfig,
    /// Template used when none is given on the command line
    #[serde(default)]
    pub template: EmailTemplate,
    /// Application name shown in template footers
    #[serde(default = "default_app_name")]
    pub app_name: String,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    /// "text" or "json"
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_format: default_log_format(),
        }
    }
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_app_name() -> String {
    "GitEvents".to_string()
}

impl Config {
    /// Load from `path` (or `mailer.{toml,yaml,json}` if present) plus the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        Self::from_builder(config::Config::builder().add_source(file))
    }

    /// Load from an in-memory document plus the environment
    pub fn from_document(contents: &str, format: config::FileFormat) -> Result<Self> {
        Self::from_builder(
            config::Config::builder().add_source(config::File::from_str(contents, format)),
        )
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self> {
        builder
            .add_source(
                config::Environment::with_prefix("MAILER")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")
    }
}
