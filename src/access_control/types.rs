//! Access control types
//!
//! Core types used by the access control system.

use crate::error::AclError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Requested access level
///
/// Levels form a fixed hierarchy: `Admin` implies `Write` implies `Read`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    Read,
    Write,
    Admin,
}

impl AccessLevel {
    /// Get the level name as a string
    pub const fn as_str(&self) -> &'static str {
        match self {
            AccessLevel::Read => "read",
            AccessLevel::Write => "write",
            AccessLevel::Admin => "admin",
        }
    }

    /// Check whether holding `self` also grants `other`
    pub fn implies(&self, other: AccessLevel) -> bool {
        *self >= other
    }

    /// Get all levels, lowest first
    pub fn all() -> &'static [AccessLevel] {
        &[AccessLevel::Read, AccessLevel::Write, AccessLevel::Admin]
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AccessLevel {
    type Err = AclError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "read" => Ok(AccessLevel::Read),
            "write" => Ok(AccessLevel::Write),
            "admin" => Ok(AccessLevel::Admin),
            _ => Err(AclError::InvalidAccessLevel(s.to_string())),
        }
    }
}

/// A requesting identity (usually an email address, compared case-sensitively)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct User {
    pub id: String,
}

impl User {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// A single access query: may `user` access `path` at `level`?
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AclRequest {
    /// Path relative to the governed root
    pub path: String,
    pub level: AccessLevel,
    pub user: User,
}

impl AclRequest {
    pub fn new(path: impl Into<String>, level: AccessLevel, user: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            level,
            user: User::new(user),
        }
    }

    /// Same request with a different level
    pub fn with_level(&self, level: AccessLevel) -> Self {
        Self {
            path: self.path.clone(),
            level,
            user: self.user.clone(),
        }
    }
}

/// Split a relative path into its non-empty segments
pub(crate) fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Normalize a relative path: no leading, trailing or doubled slashes
pub(crate) fn normalize_path(path: &str) -> String {
    segments(path).collect::<Vec<_>>().join("/")
}

/// Lexically resolve `.` and `..` segments in a request path
///
/// Returns `None` when the path climbs above the root.
pub(crate) fn resolve_path(path: &str) -> Option<String> {
    let mut resolved: Vec<&str> = Vec::new();
    for segment in segments(path) {
        match segment {
            "." => {}
            ".." => {
                resolved.pop()?;
            }
            other => resolved.push(other),
        }
    }
    Some(resolved.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_roundtrip() {
        for level in AccessLevel::all() {
            let parsed: AccessLevel = level.as_str().parse().unwrap();
            assert_eq!(*level, parsed);
        }
    }

    #[test]
    fn test_level_parse_case_insensitive() {
        assert_eq!("ADMIN".parse::<AccessLevel>().unwrap(), AccessLevel::Admin);
        assert_eq!("Write".parse::<AccessLevel>().unwrap(), AccessLevel::Write);
    }

    #[test]
    fn test_level_parse_unknown() {
        let err = "execute".parse::<AccessLevel>().unwrap_err();
        assert_eq!(err, AclError::InvalidAccessLevel("execute".into()));
    }

    #[test]
    fn test_level_implication() {
        assert!(AccessLevel::Admin.implies(AccessLevel::Write));
        assert!(AccessLevel::Admin.implies(AccessLevel::Read));
        assert!(AccessLevel::Write.implies(AccessLevel::Read));
        assert!(!AccessLevel::Write.implies(AccessLevel::Admin));
        assert!(!AccessLevel::Read.implies(AccessLevel::Write));
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/a//b/"), "a/b");
        assert_eq!(normalize_path(""), "");
        assert_eq!(normalize_path("/"), "");
    }

    #[test]
    fn test_resolve_path() {
        assert_eq!(resolve_path("a/./b").as_deref(), Some("a/b"));
        assert_eq!(resolve_path("a/../b").as_deref(), Some("b"));
        assert_eq!(resolve_path("./a/b/..").as_deref(), Some("a"));
        assert_eq!(resolve_path("a/..").as_deref(), Some(""));
        assert_eq!(resolve_path("..").as_deref(), None);
        assert_eq!(resolve_path("a/../../b").as_deref(), None);
        assert_eq!(resolve_path("a..b/.c").as_deref(), Some("a..b/.c"));
    }
}
