//! Configuration types for pathguard
//!
//! This module defines the configuration structure that can be loaded from
//! TOML files and/or environment variables.

use crate::descriptor::DEFAULT_DESCRIPTOR_NAME;
use serde::Deserialize;
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Access control settings
    pub acl: AclConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Access control configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AclConfig {
    /// Root of the governed directory tree
    pub root: PathBuf,

    /// Identity with unconditional access to the whole tree
    pub owner: String,

    /// File name of permission descriptors
    pub descriptor_name: String,

    /// What to do with a descriptor that fails to parse
    pub on_invalid: OnInvalidDescriptor,
}

impl Default for AclConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            owner: String::new(),
            descriptor_name: DEFAULT_DESCRIPTOR_NAME.to_string(),
            on_invalid: OnInvalidDescriptor::default(),
        }
    }
}

/// Handling of invalid descriptors while loading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnInvalidDescriptor {
    /// Fail the whole load and keep the previous tree
    #[default]
    Abort,
    /// Log a warning and leave that directory without rules
    Skip,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Output format (pretty, json)
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable output
    #[default]
    Pretty,
    /// JSON structured output
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.acl.root, PathBuf::from("."));
        assert_eq!(config.acl.descriptor_name, ".permissions.toml");
        assert_eq!(config.acl.on_invalid, OnInvalidDescriptor::Abort);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_deserialize_on_invalid() {
        let policy: OnInvalidDescriptor = serde_json::from_str(r#""skip""#).unwrap();
        assert_eq!(policy, OnInvalidDescriptor::Skip);

        let policy: OnInvalidDescriptor = serde_json::from_str(r#""abort""#).unwrap();
        assert_eq!(policy, OnInvalidDescriptor::Abort);

        assert!(serde_json::from_str::<OnInvalidDescriptor>(r#""ignore""#).is_err());
    }

    #[test]
    fn test_deserialize_log_format() {
        let format: LogFormat = serde_json::from_str(r#""json""#).unwrap();
        assert_eq!(format, LogFormat::Json);
    }
}
