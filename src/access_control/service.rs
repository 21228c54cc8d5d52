//! ACL service
//!
//! Front door for access queries. Applies the owner bypass and descriptor
//! self-protection, then delegates to the current [`AclTree`] snapshot.
//!
//! The tree is held as an immutable `Arc` snapshot. Every mutation builds a
//! new tree and swaps the reference, so a query in flight sees either the
//! old tree or the new one, never a half-built one.

use crate::access_control::rule::RuleSet;
use crate::access_control::tree::AclTree;
use crate::access_control::types::{AccessLevel, AclRequest, resolve_path, segments};
use crate::config::{AclConfig, OnInvalidDescriptor};
use crate::descriptor::{DEFAULT_DESCRIPTOR_NAME, load_rulesets};
use crate::error::{AclError, DescriptorError};
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info, trace};

/// Access control service over one governed directory tree
#[derive(Debug)]
pub struct AclService {
    /// Identity with unconditional access
    owner: String,
    /// File name of permission descriptors
    descriptor_name: String,
    on_invalid: OnInvalidDescriptor,
    tree: RwLock<Arc<AclTree>>,
}

impl AclService {
    /// Create a service with an empty tree
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            descriptor_name: DEFAULT_DESCRIPTOR_NAME.to_string(),
            on_invalid: OnInvalidDescriptor::default(),
            tree: RwLock::new(Arc::new(AclTree::new())),
        }
    }

    /// Create a service from the `[acl]` configuration section
    ///
    /// The tree starts empty; call
    /// [`load_permissions_from_filesystem`](Self::load_permissions_from_filesystem)
    /// to populate it.
    pub fn from_config(config: &AclConfig) -> Self {
        Self::new(config.owner.clone())
            .with_descriptor_name(config.descriptor_name.clone())
            .with_on_invalid(config.on_invalid)
    }

    pub fn with_descriptor_name(mut self, name: impl Into<String>) -> Self {
        self.descriptor_name = name.into();
        self
    }

    pub fn with_on_invalid(mut self, policy: OnInvalidDescriptor) -> Self {
        self.on_invalid = policy;
        self
    }

    /// Build a service directly from a ruleset collection
    pub fn with_rulesets(
        owner: impl Into<String>,
        rulesets: impl IntoIterator<Item = RuleSet>,
    ) -> Self {
        let service = Self::new(owner);
        service.replace_tree(AclTree::from_rulesets(rulesets));
        service
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn descriptor_name(&self) -> &str {
        &self.descriptor_name
    }

    /// Current immutable tree snapshot
    pub fn snapshot(&self) -> Arc<AclTree> {
        self.tree
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Swap in a new tree
    pub fn replace_tree(&self, tree: AclTree) {
        *self.tree.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(tree);
    }

    /// Apply a mutation to a copy of the current tree, then swap it in
    fn update_tree<R>(&self, f: impl FnOnce(&mut AclTree) -> R) -> R {
        let mut guard = self.tree.write().unwrap_or_else(PoisonError::into_inner);
        let mut tree = AclTree::clone(&guard);
        let result = f(&mut tree);
        *guard = Arc::new(tree);
        result
    }

    /// Register a ruleset, replacing any previous one at the same path
    pub fn add_ruleset(&self, ruleset: RuleSet) {
        self.update_tree(|tree| tree.add_ruleset(ruleset));
    }

    /// Clear the ruleset registered at `path`
    pub fn remove_ruleset(&self, path: &str) -> Option<RuleSet> {
        self.update_tree(|tree| tree.remove_ruleset(path))
    }

    /// Rebuild the whole tree from the descriptors found under `root`
    ///
    /// The previous tree is discarded. On error the previous tree stays in
    /// place. Returns the number of registered rulesets.
    pub fn load_permissions_from_filesystem(
        &self,
        root: impl AsRef<Path>,
    ) -> Result<usize, DescriptorError> {
        let root = root.as_ref();
        let rulesets = load_rulesets(root, &self.descriptor_name, self.on_invalid)?;
        let tree = AclTree::from_rulesets(rulesets);
        let count = tree.ruleset_count();
        self.replace_tree(tree);

        info!(root = %root.display(), rulesets = count, "Loaded permissions");
        Ok(count)
    }

    /// Check whether a path names a permission descriptor file
    pub fn is_descriptor(&self, path: &str) -> bool {
        resolve_path(path)
            .is_some_and(|path| segments(&path).last() == Some(self.descriptor_name.as_str()))
    }

    /// Decide whether a request is permitted
    ///
    /// Anything without a matching rule is denied, and so is any path that
    /// climbs above the root, even for the owner.
    pub fn can_access(&self, request: &AclRequest) -> bool {
        if resolve_path(&request.path).is_none() {
            debug!(path = %request.path, user = %request.user, "Path escapes the root, denying");
            return false;
        }

        if request.user.id == self.owner {
            trace!(path = %request.path, "Owner bypass");
            return true;
        }

        let tree = self.snapshot();
        let Some(rule) = tree.get_compiled_rule(request) else {
            debug!(
                path = %request.path,
                level = %request.level,
                user = %request.user,
                "No matching rule, denying"
            );
            return false;
        };

        // Touching a descriptor requires admin on its scope
        let allowed = if self.is_descriptor(&request.path) {
            rule.check_access(&request.with_level(AccessLevel::Admin))
        } else {
            rule.check_access(request)
        };

        debug!(
            path = %request.path,
            level = %request.level,
            user = %request.user,
            pattern = %rule.source,
            allowed,
            "Access decision"
        );
        allowed
    }

    /// Decide a raw query, rejecting unknown access levels up front
    pub fn check(&self, path: &str, level: &str, user: &str) -> Result<bool, AclError> {
        let level: AccessLevel = level.parse()?;
        Ok(self.can_access(&AclRequest::new(path, level, user)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access_control::rule::{Access, Rule};

    const OWNER: &str = "owner@test.com";

    fn service(rulesets: Vec<RuleSet>) -> AclService {
        AclService::with_rulesets(OWNER, rulesets)
    }

    fn ruleset(path: &str, pattern: &str, access: Access) -> RuleSet {
        RuleSet::new(path, vec![Rule::new(pattern, access).unwrap()])
    }

    #[test]
    fn test_owner_bypass_without_rulesets() {
        let svc = service(vec![]);
        for level in AccessLevel::all() {
            assert!(svc.can_access(&AclRequest::new("any/path", *level, OWNER)));
        }
    }

    #[test]
    fn test_default_deny() {
        let svc = service(vec![]);
        assert!(!svc.can_access(&AclRequest::new("a.txt", AccessLevel::Read, "user@test.com")));
    }

    #[test]
    fn test_descriptor_requires_admin() {
        let svc = service(vec![ruleset("", "**", Access::new().write(["*"]))]);
        assert!(svc.can_access(&AclRequest::new("data.txt", AccessLevel::Read, "u@test.com")));
        assert!(!svc.can_access(&AclRequest::new(
            ".permissions.toml",
            AccessLevel::Read,
            "u@test.com"
        )));
        assert!(!svc.can_access(&AclRequest::new(
            "sub/.permissions.toml",
            AccessLevel::Read,
            "u@test.com"
        )));

        let svc = service(vec![ruleset("", "**", Access::new().admin(["u@test.com"]))]);
        assert!(svc.can_access(&AclRequest::new(
            ".permissions.toml",
            AccessLevel::Read,
            "u@test.com"
        )));
    }

    #[test]
    fn test_descriptor_reached_through_dot_segments() {
        let svc = service(vec![ruleset("", "**", Access::new().write(["*"]))]);
        let read = |path: &str| svc.can_access(&AclRequest::new(path, AccessLevel::Read, "u"));
        assert!(!read("./.permissions.toml"));
        assert!(!read("sub/../.permissions.toml"));
        assert!(!read("sub/.permissions.toml/."));
        assert!(read(".permissions.toml/../data.txt"));
    }

    #[test]
    fn test_escaping_path_denied_even_for_owner() {
        let svc = service(vec![ruleset("", "**", Access::new().admin(["*"]))]);
        assert!(!svc.can_access(&AclRequest::new("../etc/passwd", AccessLevel::Read, OWNER)));
        assert!(!svc.can_access(&AclRequest::new("a/../../b", AccessLevel::Read, "u")));
        assert!(svc.can_access(&AclRequest::new("a/../b", AccessLevel::Read, "u")));
    }

    #[test]
    fn test_custom_descriptor_name() {
        let svc = AclService::new(OWNER).with_descriptor_name("ACL");
        svc.add_ruleset(ruleset("", "**", Access::new().write(["*"])));
        assert!(!svc.can_access(&AclRequest::new("ACL", AccessLevel::Read, "u")));
        assert!(svc.can_access(&AclRequest::new(".permissions.toml", AccessLevel::Read, "u")));
    }

    #[test]
    fn test_check_rejects_unknown_level() {
        let svc = service(vec![]);
        assert_eq!(
            svc.check("a", "execute", OWNER),
            Err(AclError::InvalidAccessLevel("execute".into()))
        );
        assert_eq!(svc.check("a", "read", OWNER), Ok(true));
    }

    #[test]
    fn test_add_and_remove_ruleset() {
        let svc = service(vec![]);
        let request = AclRequest::new("a/b.txt", AccessLevel::Read, "u");
        assert!(!svc.can_access(&request));

        svc.add_ruleset(ruleset("a", "*.txt", Access::new().read(["*"])));
        assert!(svc.can_access(&request));

        assert!(svc.remove_ruleset("a").is_some());
        assert!(!svc.can_access(&request));
    }

    #[test]
    fn test_snapshot_is_isolated_from_updates() {
        let svc = service(vec![ruleset("", "**", Access::new().read(["*"]))]);
        let before = svc.snapshot();
        svc.remove_ruleset("");
        assert_eq!(before.ruleset_count(), 1);
        assert_eq!(svc.snapshot().ruleset_count(), 0);
    }
}
