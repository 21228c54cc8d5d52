//! Access diagnostics
//!
//! Read-only projection of a decision for operator-facing output: who owns
//! the tree, which descriptor governs a path, which rule matched, and the
//! outcome at each level.

use crate::access_control::service::AclService;
use crate::access_control::types::{AccessLevel, AclRequest};
use serde::Serialize;
use std::fmt;

/// Why a user can or cannot access a path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessReport {
    pub path: String,
    pub user: String,
    pub is_owner: bool,
    /// The path is itself a permission descriptor
    pub is_descriptor: bool,
    /// Directory of the governing ruleset
    pub ruleset_path: Option<String>,
    /// Descriptor file of the governing ruleset
    pub descriptor: Option<String>,
    pub terminal: bool,
    /// Pattern of the matching rule, as written
    pub matched_pattern: Option<String>,
    pub read: bool,
    pub write: bool,
    pub admin: bool,
}

impl AccessReport {
    pub fn allows(&self, level: AccessLevel) -> bool {
        match level {
            AccessLevel::Read => self.read,
            AccessLevel::Write => self.write,
            AccessLevel::Admin => self.admin,
        }
    }
}

impl fmt::Display for AccessReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let yes_no = |b: bool| if b { "yes" } else { "no" };

        writeln!(f, "path:        {}", self.path)?;
        writeln!(f, "user:        {}", self.user)?;
        writeln!(f, "owner:       {}", yes_no(self.is_owner))?;
        if self.is_descriptor {
            writeln!(f, "descriptor:  this path is a descriptor (admin required)")?;
        }
        match &self.descriptor {
            Some(descriptor) => {
                let terminal = if self.terminal { " (terminal)" } else { "" };
                writeln!(f, "governed by: {}{}", descriptor, terminal)?;
            }
            None => writeln!(f, "governed by: none")?,
        }
        writeln!(
            f,
            "rule:        {}",
            self.matched_pattern.as_deref().unwrap_or("none")
        )?;
        write!(
            f,
            "read: {}  write: {}  admin: {}",
            yes_no(self.read),
            yes_no(self.write),
            yes_no(self.admin)
        )
    }
}

impl AclService {
    /// Explain the decision for every level on one path
    pub fn explain(&self, path: &str, user: &str) -> AccessReport {
        let tree = self.snapshot();
        let request = AclRequest::new(path, AccessLevel::Read, user);
        let resolution = tree.resolve(&request);

        let ruleset_path = resolution.as_ref().map(|r| r.node.path().to_string());
        let descriptor = ruleset_path.as_ref().map(|dir| {
            if dir.is_empty() {
                self.descriptor_name().to_string()
            } else {
                format!("{}/{}", dir, self.descriptor_name())
            }
        });
        let terminal = resolution.as_ref().is_some_and(|r| r.node.is_terminal());
        let matched_pattern = resolution
            .and_then(|r| r.rule)
            .map(|rule| rule.source);

        let allowed = |level| self.can_access(&request.with_level(level));

        AccessReport {
            path: path.to_string(),
            user: user.to_string(),
            is_owner: user == self.owner(),
            is_descriptor: self.is_descriptor(path),
            ruleset_path,
            descriptor,
            terminal,
            matched_pattern,
            read: allowed(AccessLevel::Read),
            write: allowed(AccessLevel::Write),
            admin: allowed(AccessLevel::Admin),
        }
    }
}
