//! Rule compiler
//!
//! Binds a [`Rule`] to one requesting user. Compilation resolves the `USER`
//! placeholder in the access lists and pairs the rule with its matcher. The
//! result depends on the identity, so it is built per request and never
//! cached.

use crate::access_control::patterns::{Matcher, USER_TEMPLATE};
use crate::access_control::rule::{Access, Rule, USER_TOKEN};
use crate::access_control::types::{AccessLevel, AclRequest};
use serde::Serialize;

/// Universal user wildcard
pub const ANY_USER: &str = "*";

/// Access lists with every `USER` entry replaced by a concrete value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolvedAccess {
    pub admin: Vec<String>,
    pub write: Vec<String>,
    pub read: Vec<String>,
}

impl ResolvedAccess {
    /// Replace `USER` entries with `replacement`
    fn resolve(access: &Access, replacement: &str) -> Self {
        let resolve_list = |list: &[String]| {
            list.iter()
                .map(|entry| {
                    if entry == USER_TOKEN {
                        replacement.to_string()
                    } else {
                        entry.clone()
                    }
                })
                .collect()
        };

        Self {
            admin: resolve_list(&access.admin),
            write: resolve_list(&access.write),
            read: resolve_list(&access.read),
        }
    }
}

/// Check a user against one access list
///
/// Entries match by exact equality, `*@domain` suffix or `*`.
fn list_contains(list: &[String], user: &str) -> bool {
    list.iter().any(|entry| {
        if entry == ANY_USER {
            return true;
        }
        if let Some(domain) = entry.strip_prefix('*')
            && domain.starts_with('@')
        {
            return user.ends_with(domain);
        }
        entry == user
    })
}

/// A rule bound to one requesting user
#[derive(Debug, Clone)]
pub struct CompiledRule {
    /// Pattern with the user template substituted
    pub pattern: String,
    /// Pattern as written in the descriptor
    pub source: String,
    pub access: ResolvedAccess,
    matcher: Matcher,
    user: String,
}

impl CompiledRule {
    /// Check whether this rule applies to a path relative to its ruleset
    pub fn matches(&self, relative_path: &str) -> bool {
        self.matcher.matches(relative_path, Some(&self.user))
    }

    pub fn has_admin(&self, user: &str) -> bool {
        list_contains(&self.access.admin, user)
    }

    pub fn has_write(&self, user: &str) -> bool {
        self.has_admin(user) || list_contains(&self.access.write, user)
    }

    pub fn has_read(&self, user: &str) -> bool {
        self.has_write(user) || list_contains(&self.access.read, user)
    }

    /// Check whether the request's user holds the request's level
    pub fn check_access(&self, request: &AclRequest) -> bool {
        let user = request.user.id.as_str();
        match request.level {
            AccessLevel::Admin => self.has_admin(user),
            AccessLevel::Write => self.has_write(user),
            AccessLevel::Read => self.has_read(user),
        }
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }
}

/// Compile a rule for one requesting user
///
/// Templated rules resolve `USER` to `user`; all other rules resolve it to
/// `*`, i.e. any authenticated user. The rule's matcher was compiled when the
/// rule was built, so this cannot fail.
pub fn compile(rule: &Rule, user: &str) -> CompiledRule {
    let source = rule.pattern();
    let (pattern, replacement) = if rule.is_templated() {
        (source.replace(USER_TEMPLATE, user), user)
    } else {
        (source.to_string(), ANY_USER)
    };

    CompiledRule {
        pattern,
        source: source.to_string(),
        access: ResolvedAccess::resolve(rule.access(), replacement),
        matcher: rule.matcher().clone(),
        user: user.to_string(),
    }
}
