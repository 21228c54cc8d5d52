//! Descriptor parser
//!
//! A descriptor is a TOML document:
//!
//! ```toml
//! terminal = true          # optional, defaults to false
//!
//! [[rules]]
//! pattern = "reports/**"
//! [rules.access]
//! admin = ["lead@example.com"]
//! write = ["*@example.com"]
//! read = ["*"]
//! ```

use crate::access_control::rule::{Access, Rule, RuleSet};
use crate::error::DescriptorError;
use serde::Deserialize;
use std::fs;
use std::path::{Component, Path};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DescriptorFile {
    #[serde(default)]
    terminal: bool,
    #[serde(default)]
    rules: Vec<DescriptorRule>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DescriptorRule {
    pattern: String,
    #[serde(default)]
    access: Access,
}

/// Parse descriptor text into the ruleset governing `dir`
///
/// `source` is only used for error reporting.
pub fn parse_descriptor(source: &Path, text: &str, dir: &str) -> Result<RuleSet, DescriptorError> {
    let file: DescriptorFile = toml::from_str(text).map_err(|e| DescriptorError::Parse {
        path: source.to_path_buf(),
        reason: e.message().to_string(),
    })?;

    let rules = file
        .rules
        .into_iter()
        .map(|rule| Rule::new(rule.pattern, rule.access))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| DescriptorError::Rule {
            path: source.to_path_buf(),
            source: e,
        })?;

    Ok(RuleSet::new(dir, rules).terminal(file.terminal))
}

/// Read and parse one descriptor file found under `root`
///
/// The ruleset path is the descriptor's directory relative to `root`, empty
/// for a descriptor at the root itself.
pub fn load_descriptor(file: &Path, root: &Path) -> Result<RuleSet, DescriptorError> {
    let dir = relative_dir(file, root)?;
    let text = fs::read_to_string(file).map_err(|e| DescriptorError::Io {
        path: file.to_path_buf(),
        source: e,
    })?;
    parse_descriptor(file, &text, &dir)
}

fn relative_dir(file: &Path, root: &Path) -> Result<String, DescriptorError> {
    let outside = || DescriptorError::OutsideRoot {
        path: file.to_path_buf(),
        root: root.to_path_buf(),
    };

    let parent = file.parent().ok_or_else(outside)?;
    let relative = parent.strip_prefix(root).map_err(|_| outside())?;

    let mut segments = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(segment) => segments.push(segment.to_string_lossy().into_owned()),
            Component::CurDir => {}
            _ => return Err(outside()),
        }
    }
    Ok(segments.join("/"))
}
