//! Path-scoped access control
//!
//! Decides whether a user may read, write or administer a path inside a
//! governed directory tree. Access is declared by permission descriptors,
//! at most one per directory.
//!
//! ## Features
//!
//! - **Nearest descriptor wins** - the deepest descriptor on a path governs
//!   it outright, nothing is merged from ancestors
//! - **Terminal descriptors** - lock a whole subtree against nested overrides
//! - **Specificity ranking** - exact, glob, recursive glob and per-user
//!   template patterns ranked by a fixed total order
//! - **Per-user templates** - `{{USER}}` in a pattern resolves to the
//!   requesting identity
//! - **Default deny** - anything not granted is denied
//!
//! ## Example
//!
//! ```
//! use pathguard::access_control::{Access, AccessLevel, AclRequest, AclService, Rule, RuleSet};
//!
//! let root = RuleSet::new(
//!     "",
//!     vec![
//!         Rule::new("**", Access::new().read(["*@example.com"])).unwrap(),
//!         Rule::new("{{USER}}/**", Access::new().write(["USER"])).unwrap(),
//!     ],
//! );
//! let acl = AclService::with_rulesets("owner@example.com", [root]);
//!
//! let request = AclRequest::new("alice@example.com/notes.txt", AccessLevel::Write, "alice@example.com");
//! assert!(acl.can_access(&request));
//! ```

pub mod access_control;
pub mod config;
pub mod descriptor;
pub mod error;

// Re-export main types
pub use access_control::{AccessLevel, AclRequest, AclService};
pub use config::{AppConfig, load_config};
pub use error::{AppError, Result};
