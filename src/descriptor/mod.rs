//! Permission descriptor files
//!
//! Locates descriptor files under a governed root and parses them into
//! [`RuleSet`](crate::access_control::RuleSet)s. One descriptor governs its
//! containing directory.

pub mod parser;
pub mod scanner;

pub use parser::{load_descriptor, parse_descriptor};
pub use scanner::{load_rulesets, scan_descriptors};

/// Default file name of a permission descriptor
pub const DEFAULT_DESCRIPTOR_NAME: &str = ".permissions.toml";
