//! Pattern matching for access control
//!
//! A rule pattern is classified once, from its static shape, into one of
//! three matcher kinds:
//!
//! - **Exact**: no wildcard characters and no template; byte equality.
//! - **Glob**: contains `*`, `?` or `[`; shell glob semantics where `*`
//!   stays within one path segment and `**` spans zero or more segments.
//! - **Template**: contains `{{USER}}`; the placeholder is replaced with the
//!   requesting identity at match time, then matched as a glob or exactly.
//!
//! Candidates are always paths relative to the governing descriptor's
//! directory.

use crate::error::AclError;
use globset::{GlobBuilder, GlobMatcher};
use regex::Regex;
use std::sync::LazyLock;

/// The only template token resolved per request
pub const USER_TEMPLATE: &str = "{{USER}}";

/// Tokens that look like templates but are reserved and rejected
pub const RESERVED_TEMPLATES: &[&str] = &["HASH", "YEAR", "MONTH", "DATE"];

static TEMPLATE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([^{}]*)\}\}").expect("template regex is valid"));

const WILDCARD_CHARS: &[char] = &['*', '?', '['];

/// List every `{{TOKEN}}` occurring in a pattern, in order
pub fn template_tokens(pattern: &str) -> Vec<&str> {
    TEMPLATE_TOKEN
        .captures_iter(pattern)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect()
}

/// Check whether a pattern uses the per-user template
pub fn has_user_template(pattern: &str) -> bool {
    pattern.contains(USER_TEMPLATE)
}

/// Check whether a string carries glob wildcard characters
pub fn has_wildcards(s: &str) -> bool {
    s.contains(WILDCARD_CHARS)
}

/// Reject any template token other than `{{USER}}`
pub fn validate_template(pattern: &str) -> Result<(), AclError> {
    match template_tokens(pattern)
        .into_iter()
        .find(|token| *token != "USER")
    {
        Some(token) => Err(AclError::UnsupportedTemplate {
            pattern: pattern.to_string(),
            token: token.to_string(),
        }),
        None => Ok(()),
    }
}

/// Matcher bound to a single pattern
#[derive(Debug, Clone)]
pub enum Matcher {
    Exact(String),
    Glob(PathGlob),
    Template(TemplateMatcher),
}

impl Matcher {
    /// Classify and compile a pattern
    pub fn new(pattern: &str) -> Result<Self, AclError> {
        validate_template(pattern)?;

        if has_user_template(pattern) {
            Ok(Matcher::Template(TemplateMatcher::new(pattern)?))
        } else if has_wildcards(pattern) {
            Ok(Matcher::Glob(PathGlob::new(pattern)?))
        } else {
            Ok(Matcher::Exact(pattern.to_string()))
        }
    }

    /// Match a relative path, substituting `user` for templated patterns
    ///
    /// Template matchers never match without a user.
    pub fn matches(&self, path: &str, user: Option<&str>) -> bool {
        match self {
            Matcher::Exact(pattern) => pattern == path,
            Matcher::Glob(glob) => glob.matches(path),
            Matcher::Template(template) => match user {
                Some(user) => template.matches(path, user),
                None => false,
            },
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Matcher::Exact(_) => "exact",
            Matcher::Glob(_) => "glob",
            Matcher::Template(_) => "template",
        }
    }
}

/// Compiled glob with path-aware semantics
#[derive(Debug, Clone)]
pub struct PathGlob {
    source: String,
    matcher: GlobMatcher,
    /// Every segment is `**`, so the empty path matches too
    matches_empty: bool,
}

impl PathGlob {
    pub fn new(pattern: &str) -> Result<Self, AclError> {
        let glob = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|e| AclError::InvalidGlob {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })?;

        let matches_empty = pattern
            .split('/')
            .filter(|s| !s.is_empty())
            .all(|s| s == "**");

        Ok(Self {
            source: pattern.to_string(),
            matcher: glob.compile_matcher(),
            matches_empty,
        })
    }

    pub fn matches(&self, path: &str) -> bool {
        if path.is_empty() {
            return self.matches_empty;
        }
        self.matcher.is_match(path)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

/// Pattern containing `{{USER}}`, resolved per request
#[derive(Debug, Clone)]
pub struct TemplateMatcher {
    source: String,
    /// Wildcards outside the placeholder decide glob vs exact matching
    is_glob: bool,
}

impl TemplateMatcher {
    fn new(pattern: &str) -> Result<Self, AclError> {
        let is_glob = has_wildcards(&pattern.replace(USER_TEMPLATE, ""));
        if is_glob {
            // Syntax errors surface now rather than on every request
            PathGlob::new(&pattern.replace(USER_TEMPLATE, "user")).map_err(|_| {
                AclError::InvalidGlob {
                    pattern: pattern.to_string(),
                    reason: "template does not form a valid glob".to_string(),
                }
            })?;
        }
        Ok(Self {
            source: pattern.to_string(),
            is_glob,
        })
    }

    /// Substitute the requesting identity into the pattern
    pub fn resolve(&self, user: &str) -> String {
        self.source.replace(USER_TEMPLATE, user)
    }

    pub fn matches(&self, path: &str, user: &str) -> bool {
        if !self.is_glob {
            return self.resolve(user) == path;
        }

        // The identity is literal text: wildcards in it must not widen the match
        let escaped = self.source.replace(USER_TEMPLATE, &globset::escape(user));
        match PathGlob::new(&escaped) {
            Ok(glob) => glob.matches(path),
            Err(e) => {
                tracing::trace!(pattern = %self.source, user, error = %e, "Template did not compile");
                false
            }
        }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher(pattern: &str) -> Matcher {
        Matcher::new(pattern).unwrap()
    }

    #[test]
    fn test_classification() {
        assert_eq!(matcher("reports/q1.csv").kind(), "exact");
        assert_eq!(matcher("reports/*.csv").kind(), "glob");
        assert_eq!(matcher("file?.txt").kind(), "glob");
        assert_eq!(matcher("[ab].txt").kind(), "glob");
        assert_eq!(matcher("{{USER}}/**").kind(), "template");
        assert_eq!(matcher("{{USER}}.txt").kind(), "template");
    }

    #[test]
    fn test_exact_match() {
        let m = matcher("reports/q1.csv");
        assert!(m.matches("reports/q1.csv", None));
        assert!(!m.matches("reports/q1.csv.bak", None));
        assert!(!m.matches("reports", None));
    }

    #[test]
    fn test_single_star_stays_in_segment() {
        let m = matcher("*.csv");
        assert!(m.matches("data.csv", None));
        assert!(!m.matches("nested/data.csv", None));
    }

    #[test]
    fn test_recursive_wildcard_matches_root_level() {
        let m = matcher("**/*.csv");
        assert!(m.matches("data.csv", None));
        assert!(m.matches("a/data.csv", None));
        assert!(m.matches("a/b/c/data.csv", None));
        assert!(!m.matches("a/b/data.txt", None));
    }

    #[test]
    fn test_double_star_matches_everything() {
        let m = matcher("**");
        assert!(m.matches("x", None));
        assert!(m.matches("a/b/c", None));
    }

    #[test]
    fn test_trailing_recursive_wildcard() {
        let m = matcher("reports/**");
        assert!(m.matches("reports/q1.csv", None));
        assert!(m.matches("reports/2024/q1.csv", None));
        assert!(!m.matches("other/q1.csv", None));
    }

    #[test]
    fn test_empty_path() {
        assert!(matcher("").matches("", None));
        assert!(matcher("**").matches("", None));
        assert!(!matcher("*").matches("", None));
        assert!(!matcher("reports").matches("", None));
    }

    #[test]
    fn test_template_glob() {
        let m = matcher("{{USER}}/**");
        assert!(m.matches("alice@test.com/notes.txt", Some("alice@test.com")));
        assert!(!m.matches("bob@test.com/notes.txt", Some("alice@test.com")));
    }

    #[test]
    fn test_template_exact() {
        let m = matcher("home/{{USER}}");
        assert!(m.matches("home/alice@test.com", Some("alice@test.com")));
        assert!(!m.matches("home/alice@test.com/x", Some("alice@test.com")));
    }

    #[test]
    fn test_template_requires_user() {
        let m = matcher("{{USER}}/**");
        assert!(!m.matches("alice@test.com/notes.txt", None));
    }

    #[test]
    fn test_template_identity_is_literal() {
        let m = matcher("{{USER}}/**");
        assert!(!m.matches("alice@test.com/notes.txt", Some("*")));
        assert!(m.matches("*/notes.txt", Some("*")));
    }

    #[test]
    fn test_unsupported_templates_rejected() {
        for token in RESERVED_TEMPLATES {
            let pattern = format!("{{{{{}}}}}/*.csv", token);
            let err = Matcher::new(&pattern).unwrap_err();
            assert!(matches!(err, AclError::UnsupportedTemplate { .. }));
        }
        assert!(Matcher::new("{{USER}}/{{DATE}}").is_err());
        assert!(Matcher::new("{{whatever}}").is_err());
    }

    #[test]
    fn test_template_tokens() {
        assert_eq!(template_tokens("{{USER}}/{{YEAR}}/x"), vec!["USER", "YEAR"]);
        assert!(template_tokens("plain/path").is_empty());
    }

    #[test]
    fn test_invalid_glob() {
        let err = Matcher::new("reports/[a-").unwrap_err();
        assert!(matches!(err, AclError::InvalidGlob { .. }));

        let err = Matcher::new("{{USER}}/[a-").unwrap_err();
        assert!(matches!(err, AclError::InvalidGlob { .. }));
    }
}
