//! Error types for pathguard
//!
//! This module defines the error hierarchy used throughout the crate.
//! Query-time misses are never errors: a request with no governing rule is
//! simply denied. Errors are reserved for bad input at construction or
//! load time.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Access control error: {0}")]
    Acl(#[from] AclError),

    #[error("Descriptor error: {0}")]
    Descriptor(#[from] DescriptorError),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(String),

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {field}")]
    Missing { field: String },
}

/// Errors raised while building rules or handling raw queries
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AclError {
    #[error("Unsupported template '{{{{{token}}}}}' in pattern '{pattern}'")]
    UnsupportedTemplate { pattern: String, token: String },

    #[error("Invalid glob pattern '{pattern}': {reason}")]
    InvalidGlob { pattern: String, reason: String },

    #[error("Invalid access level '{0}' (expected read, write or admin)")]
    InvalidAccessLevel(String),
}

/// Errors raised while locating or parsing permission descriptor files
#[derive(Error, Debug)]
pub enum DescriptorError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed descriptor {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("Invalid rule in descriptor {path}: {source}")]
    Rule {
        path: PathBuf,
        #[source]
        source: AclError,
    },

    #[error("Descriptor {path} is outside of root {root}")]
    OutsideRoot { path: PathBuf, root: PathBuf },
}

impl DescriptorError {
    /// Path of the descriptor file the error refers to
    pub fn path(&self) -> &PathBuf {
        match self {
            DescriptorError::Io { path, .. }
            | DescriptorError::Parse { path, .. }
            | DescriptorError::Rule { path, .. }
            | DescriptorError::OutsideRoot { path, .. } => path,
        }
    }
}

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, AppError>;

/// Result type alias for rule construction and raw queries
pub type AclResult<T> = std::result::Result<T, AclError>;
