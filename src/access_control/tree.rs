//! ACL tree
//!
//! A trie keyed by path segment. Each node may carry the [`RuleSet`] of the
//! descriptor found in that directory. Resolution picks the nearest ruleset
//! on the way down the requested path; the nearest one wins outright and is
//! never merged with its ancestors. A terminal ruleset stops the descent, so
//! nothing below it is ever consulted.

use crate::access_control::compiler::{CompiledRule, compile};
use crate::access_control::patterns::{self, has_wildcards};
use crate::access_control::rule::RuleSet;
use crate::access_control::types::{AclRequest, normalize_path, resolve_path, segments};
use std::cmp::Reverse;
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// Ranking key for rule patterns, higher is more specific
///
/// Fields compare in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Specificity {
    /// Templated patterns outrank all others
    pub templated: bool,
    pub literal_segments: usize,
    pub wildcard_segments: usize,
    /// Fewer `**` segments is more specific
    pub recursive_segments: Reverse<usize>,
    pub total_segments: usize,
}

/// Compute the specificity key of a pattern
pub fn specificity(pattern: &str) -> Specificity {
    let mut literal = 0;
    let mut wildcard = 0;
    let mut recursive = 0;

    for segment in segments(pattern) {
        if segment == "**" {
            recursive += 1;
        } else if has_wildcards(segment) {
            wildcard += 1;
        } else {
            literal += 1;
        }
    }

    Specificity {
        templated: patterns::has_user_template(pattern),
        literal_segments: literal,
        wildcard_segments: wildcard,
        recursive_segments: Reverse(recursive),
        total_segments: literal + wildcard + recursive,
    }
}

/// One directory in the trie
#[derive(Debug, Clone, Default)]
pub struct AclNode {
    children: BTreeMap<String, AclNode>,
    /// Rules pre-sorted most specific first
    ruleset: Option<RuleSet>,
    path: String,
}

impl AclNode {
    fn new(path: String) -> Self {
        Self {
            children: BTreeMap::new(),
            ruleset: None,
            path,
        }
    }

    pub fn ruleset(&self) -> Option<&RuleSet> {
        self.ruleset.as_ref()
    }

    /// Terminal only counts when a ruleset is present
    pub fn is_terminal(&self) -> bool {
        self.ruleset.as_ref().is_some_and(|r| r.terminal)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn children(&self) -> impl Iterator<Item = &AclNode> {
        self.children.values()
    }
}

/// Outcome of resolving a request against the tree
#[derive(Debug, Clone)]
pub struct Resolution<'a> {
    /// Node whose ruleset governs the request
    pub node: &'a AclNode,
    /// Request path relative to the governing directory
    pub relative_path: String,
    /// Most specific matching rule, if any
    pub rule: Option<CompiledRule>,
}

/// Trie of rulesets keyed by directory path
#[derive(Debug, Clone, Default)]
pub struct AclTree {
    root: AclNode,
}

impl AclTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from a collection of rulesets
    pub fn from_rulesets(rulesets: impl IntoIterator<Item = RuleSet>) -> Self {
        let mut tree = Self::new();
        for ruleset in rulesets {
            tree.add_ruleset(ruleset);
        }
        tree
    }

    /// Register a ruleset at its directory, replacing any previous one
    pub fn add_ruleset(&mut self, mut ruleset: RuleSet) {
        ruleset.path = normalize_path(&ruleset.path);
        ruleset
            .rules
            .sort_by_key(|rule| Reverse(specificity(rule.pattern())));

        let mut node = &mut self.root;
        let mut current = String::new();
        for segment in segments(&ruleset.path) {
            if !current.is_empty() {
                current.push('/');
            }
            current.push_str(segment);
            node = node
                .children
                .entry(segment.to_string())
                .or_insert_with(|| AclNode::new(current.clone()));
        }

        trace!(
            path = %ruleset.path,
            rules = ruleset.rules.len(),
            terminal = ruleset.terminal,
            "Registered ruleset"
        );
        node.ruleset = Some(ruleset);
    }

    /// Clear the ruleset at a directory, keeping the trie structure
    ///
    /// Returns the removed ruleset, if one was registered.
    pub fn remove_ruleset(&mut self, path: &str) -> Option<RuleSet> {
        let mut node = &mut self.root;
        for segment in segments(path) {
            node = node.children.get_mut(segment)?;
        }
        node.ruleset.take()
    }

    /// Get the ruleset registered exactly at a directory
    pub fn get_ruleset(&self, path: &str) -> Option<&RuleSet> {
        let mut node = &self.root;
        for segment in segments(path) {
            node = node.children.get(segment)?;
        }
        node.ruleset.as_ref()
    }

    /// Find the node whose ruleset governs `path`
    ///
    /// The deepest node carrying a ruleset wins, unless a terminal ruleset is
    /// met first on the way down.
    pub fn get_nearest_node(&self, path: &str) -> Option<&AclNode> {
        let mut node = &self.root;
        let mut nearest = node.ruleset.is_some().then_some(node);

        for segment in segments(path) {
            if node.is_terminal() {
                trace!(path, governing = %node.path, "Stopped at terminal ruleset");
                return Some(node);
            }
            match node.children.get(segment) {
                Some(child) => {
                    node = child;
                    if node.ruleset.is_some() {
                        nearest = Some(node);
                    }
                }
                None => break,
            }
        }

        nearest
    }

    /// Resolve the governing node and the most specific matching rule
    ///
    /// `.` and `..` segments are resolved first; a path escaping the root
    /// resolves to nothing.
    pub fn resolve(&self, request: &AclRequest) -> Option<Resolution<'_>> {
        let Some(path) = resolve_path(&request.path) else {
            debug!(path = %request.path, "Path escapes the root");
            return None;
        };
        let node = self.get_nearest_node(&path)?;
        let ruleset = node.ruleset.as_ref()?;

        let depth = segments(&node.path).count();
        let relative_path = segments(&path).skip(depth).collect::<Vec<_>>().join("/");

        let user = request.user.id.as_str();
        let rule = ruleset
            .rules
            .iter()
            .map(|rule| compile(rule, user))
            .find(|compiled| compiled.matches(&relative_path));

        trace!(
            path = %request.path,
            governing = %node.path,
            relative = %relative_path,
            matched = rule.as_ref().map(|r| r.source.as_str()),
            "Resolved rule"
        );

        Some(Resolution {
            node,
            relative_path,
            rule,
        })
    }

    /// Get the most specific rule of the governing ruleset that matches
    pub fn get_compiled_rule(&self, request: &AclRequest) -> Option<CompiledRule> {
        self.resolve(request).and_then(|resolution| resolution.rule)
    }

    /// Count registered rulesets
    pub fn ruleset_count(&self) -> usize {
        fn count(node: &AclNode) -> usize {
            usize::from(node.ruleset.is_some()) + node.children.values().map(count).sum::<usize>()
        }
        count(&self.root)
    }

    pub fn root(&self) -> &AclNode {
        &self.root
    }
}
