//! Descriptor discovery
//!
//! Walks a governed root and collects every descriptor file. Symlinked
//! directories are not followed.

use crate::access_control::rule::RuleSet;
use crate::config::OnInvalidDescriptor;
use crate::descriptor::parser::load_descriptor;
use crate::error::DescriptorError;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Find every file named `name` under `root`, sorted by path
pub fn scan_descriptors(root: &Path, name: &str) -> Result<Vec<PathBuf>, DescriptorError> {
    let mut found = Vec::new();

    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.map_err(|e| DescriptorError::Io {
            path: e.path().unwrap_or(root).to_path_buf(),
            source: io::Error::from(e),
        })?;

        if entry.file_type().is_file() && entry.file_name() == name {
            found.push(entry.into_path());
        }
    }

    found.sort();
    debug!(root = %root.display(), count = found.len(), "Scanned descriptors");
    Ok(found)
}

/// Scan `root` and parse every descriptor into a ruleset
///
/// With [`OnInvalidDescriptor::Abort`] the first bad descriptor fails the
/// whole load. With [`OnInvalidDescriptor::Skip`] it is logged and its
/// directory is left without a ruleset.
pub fn load_rulesets(
    root: &Path,
    name: &str,
    policy: OnInvalidDescriptor,
) -> Result<Vec<RuleSet>, DescriptorError> {
    let mut rulesets = Vec::new();

    for file in scan_descriptors(root, name)? {
        match load_descriptor(&file, root) {
            Ok(ruleset) => rulesets.push(ruleset),
            Err(e) if policy == OnInvalidDescriptor::Skip => {
                warn!(path = %e.path().display(), error = %e, "Skipping invalid descriptor");
            }
            Err(e) => return Err(e),
        }
    }

    Ok(rulesets)
}
