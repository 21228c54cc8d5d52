//! Configuration loader with layered sources
//!
//! Loads configuration from multiple sources with the following precedence
//! (highest to lowest):
//! 1. Environment variables (PATHGUARD_*)
//! 2. Configuration file (TOML)
//! 3. Default values

use crate::config::types::AppConfig;
use crate::error::ConfigError;
use config::{Config, Environment, File, FileFormat};
use std::path::{Path, PathBuf};

/// Default configuration file paths to check (in order)
const DEFAULT_CONFIG_PATHS: &[&str] = &[
    "pathguard.toml",
    ".pathguard.toml",
    "~/.config/pathguard/config.toml",
    "/etc/pathguard/config.toml",
];

/// Load configuration from a TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::from_str(toml_str, FileFormat::Toml))
        .build()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    let app_config: AppConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// Load configuration from files and environment
pub fn load_config(config_path: Option<&str>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. Start with defaults (handled by serde defaults on AppConfig)

    // 2. Add configuration file
    if let Some(path) = config_path {
        // Explicit path provided - must exist
        if !Path::new(path).exists() {
            return Err(ConfigError::Load(format!(
                "Configuration file not found: {}",
                path
            )));
        }
        builder = builder.add_source(File::new(path, FileFormat::Toml));
    } else {
        // Try default paths (first existing one wins)
        for path in DEFAULT_CONFIG_PATHS {
            let expanded = shellexpand::tilde(path);
            if Path::new(expanded.as_ref()).exists() {
                builder = builder.add_source(File::new(&expanded, FileFormat::Toml));
                break;
            }
        }
    }

    // 3. Add environment variables with PATHGUARD_ prefix
    // e.g., PATHGUARD__ACL__OWNER, PATHGUARD__LOGGING__LEVEL
    // Double underscore (__) maps to nested keys (acl.owner)
    builder = builder.add_source(
        Environment::with_prefix("PATHGUARD")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder
        .build()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    let mut app_config: AppConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    app_config.acl.root = expand_path(&app_config.acl.root);

    validate_config(&app_config)?;

    Ok(app_config)
}

/// Expand a leading `~` in a configured path
fn expand_path(path: &Path) -> PathBuf {
    match path.to_str() {
        Some(s) => PathBuf::from(shellexpand::tilde(s).as_ref()),
        None => path.to_path_buf(),
    }
}

/// Validate configuration values
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.acl.owner.trim().is_empty() {
        return Err(ConfigError::Missing {
            field: "acl.owner (set PATHGUARD__ACL__OWNER environment variable)".to_string(),
        });
    }

    let name = &config.acl.descriptor_name;
    if name.is_empty() || name.contains('/') || name == "." || name == ".." {
        return Err(ConfigError::Invalid {
            message: format!(
                "acl.descriptor_name must be a plain file name, got: '{}'",
                name
            ),
        });
    }

    if config.acl.root.as_os_str().is_empty() {
        return Err(ConfigError::Missing {
            field: "acl.root".to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::{LogFormat, OnInvalidDescriptor};

    #[test]
    fn test_load_config_from_str_basic() {
        let toml = r#"
[acl]
root = "/srv/shared"
owner = "owner@example.com"
"#;

        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.acl.root, PathBuf::from("/srv/shared"));
        assert_eq!(config.acl.owner, "owner@example.com");
        assert_eq!(config.acl.descriptor_name, ".permissions.toml");
    }

    #[test]
    fn test_load_config_from_str_full() {
        let toml = r#"
[acl]
root = "/srv/shared"
owner = "owner@example.com"
descriptor_name = "ACCESS.toml"
on_invalid = "skip"

[logging]
level = "debug"
format = "json"
"#;

        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.acl.descriptor_name, "ACCESS.toml");
        assert_eq!(config.acl.on_invalid, OnInvalidDescriptor::Skip);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_missing_owner_error() {
        let toml = r#"
[acl]
root = "/srv/shared"
"#;

        let result = load_config_from_str(toml);
        assert!(matches!(result, Err(ConfigError::Missing { .. })));
    }

    #[test]
    fn test_invalid_descriptor_name() {
        let toml = r#"
[acl]
owner = "owner@example.com"
descriptor_name = "nested/perm.toml"
"#;

        let result = load_config_from_str(toml);
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_invalid_on_invalid_value() {
        let toml = r#"
[acl]
owner = "owner@example.com"
on_invalid = "ignore"
"#;

        let result = load_config_from_str(toml);
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }
}
