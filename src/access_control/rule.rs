//! Declarative rule model
//!
//! `Rule` and `RuleSet` are what a permission descriptor parses into. A rule
//! is validated when it is built, so a `RuleSet` in hand never carries an
//! unsupported template.

use crate::access_control::patterns::{self, Matcher};
use crate::access_control::types::normalize_path;
use crate::error::AclError;
use serde::{Deserialize, Serialize};

/// Placeholder in access lists that resolves to the requesting user
pub const USER_TOKEN: &str = "USER";

/// User patterns granted at each level
///
/// Each entry is an exact identity, a domain wildcard (`*@example.com`),
/// the universal wildcard (`*`), or `USER`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Access {
    pub admin: Vec<String>,
    pub write: Vec<String>,
    pub read: Vec<String>,
}

impl Access {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn admin<I, S>(mut self, users: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.admin = users.into_iter().map(Into::into).collect();
        self
    }

    pub fn write<I, S>(mut self, users: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.write = users.into_iter().map(Into::into).collect();
        self
    }

    pub fn read<I, S>(mut self, users: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.read = users.into_iter().map(Into::into).collect();
        self
    }

    /// Check whether no level grants anything
    pub fn is_empty(&self) -> bool {
        self.admin.is_empty() && self.write.is_empty() && self.read.is_empty()
    }
}

/// Unvalidated rule as it appears in a descriptor
#[derive(Debug, Clone, Deserialize)]
struct RawRule {
    pattern: String,
    #[serde(default)]
    access: Access,
}

/// A pattern and the access it grants
///
/// The pattern is compiled once here; only the user binding happens per
/// request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawRule")]
pub struct Rule {
    pattern: String,
    access: Access,
    #[serde(skip_serializing)]
    matcher: Matcher,
}

impl Rule {
    /// Build a rule, rejecting unsupported templates and malformed globs
    pub fn new(pattern: impl Into<String>, access: Access) -> Result<Self, AclError> {
        let pattern = pattern.into();
        let matcher = Matcher::new(&pattern)?;
        Ok(Self {
            pattern,
            access,
            matcher,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn access(&self) -> &Access {
        &self.access
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    pub fn is_templated(&self) -> bool {
        patterns::has_user_template(&self.pattern)
    }
}

impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern && self.access == other.access
    }
}

impl Eq for Rule {}

impl TryFrom<RawRule> for Rule {
    type Error = AclError;

    fn try_from(raw: RawRule) -> Result<Self, Self::Error> {
        Rule::new(raw.pattern, raw.access)
    }
}

/// Rules parsed from one descriptor, governing one directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleSet {
    pub rules: Vec<Rule>,
    /// Descendant descriptors are never consulted below a terminal set
    pub terminal: bool,
    /// Governed directory relative to the root, `""` for the root
    pub path: String,
}

impl RuleSet {
    pub fn new(path: impl AsRef<str>, rules: Vec<Rule>) -> Self {
        Self {
            rules,
            terminal: false,
            path: normalize_path(path.as_ref()),
        }
    }

    pub fn terminal(mut self, terminal: bool) -> Self {
        self.terminal = terminal;
        self
    }
}
