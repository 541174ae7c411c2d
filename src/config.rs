//! Framework configuration, loaded from TOML.
//!
//! Every field has a default, so an empty file (or no file at all) is a
//! valid configuration:
//!
//! ```toml
//! [namespaces]
//! api_gateway = "apigateway"
//! storage = "s3"
//!
//! [log]
//! level = "info"
//! ```

use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {}", .0.join(", "))]
    Invalid(Vec<String>),
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub namespaces: Namespaces,
    pub log: LogConfig,
}

/// First segment of the target path, per event type.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Namespaces {
    pub api_gateway: String,
    pub storage: String,
    pub auth_trigger: String,
    pub scheduled: String,
    pub change_stream: String,
    pub email: String,
    /// Record sources without a namespace of their own.
    pub other: String,
}

impl Default for Namespaces {
    fn default() -> Self {
        Self {
            api_gateway:   "apigateway".to_owned(),
            storage:       "s3".to_owned(),
            auth_trigger:  "cognito".to_owned(),
            scheduled:     "crons".to_owned(),
            change_stream: "streams".to_owned(),
            email:         "ses".to_owned(),
            other:         "records".to_owned(),
        }
    }
}

impl Namespaces {
    fn entries(&self) -> [(&'static str, &str); 7] {
        [
            ("api_gateway",   self.api_gateway.as_str()),
            ("storage",       self.storage.as_str()),
            ("auth_trigger",  self.auth_trigger.as_str()),
            ("scheduled",     self.scheduled.as_str()),
            ("change_stream", self.change_stream.as_str()),
            ("email",         self.email.as_str()),
            ("other",         self.other.as_str()),
        ]
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    /// Filter directive used when `RUST_LOG` is unset, e.g. `"info"` or
    /// `"lamina=debug,warn"`.
    pub level: String,
    pub ansi: bool,
    pub timestamps: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { level: "info".to_owned(), ansi: false, timestamps: true }
    }
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();
        for (field, value) in self.namespaces.entries() {
            if value.is_empty() {
                errors.push(format!("namespaces.{field} must not be empty"));
            } else if value.contains('/') {
                errors.push(format!("namespaces.{field} must not contain '/'"));
            }
        }
        if self.log.level.trim().is_empty() {
            errors.push("log.level must not be empty".to_owned());
        }
        if errors.is_empty() { Ok(()) } else { Err(ConfigError::Invalid(errors)) }
    }
}
