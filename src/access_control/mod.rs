//! Access control module
//!
//! Provides path-scoped access control driven by per-directory permission
//! descriptors.
//!
//! ## Access Control Model
//!
//! Every directory may carry one descriptor. A request for a path is decided
//! as follows:
//!
//! 1. **Owner** - the owner of the governed tree is always allowed
//! 2. **Nearest descriptor** - the deepest descriptor on the path governs it,
//!    unless an ancestor descriptor is `terminal`, in which case that ancestor
//!    governs the whole subtree. Descriptors are never merged.
//! 3. **Most specific rule** - within the governing descriptor, rules are
//!    ranked by specificity and the first one whose pattern matches the path
//!    (relative to the descriptor's directory) decides
//! 4. **Level hierarchy** - `admin` implies `write` implies `read`
//!
//! No governing descriptor or no matching rule means deny. Reading or writing
//! a descriptor file itself always requires `admin`.
//!
//! ## Example Descriptor
//!
//! ```toml
//! terminal = false
//!
//! [[rules]]
//! pattern = "{{USER}}/**"          # per-user home directories
//! access = { admin = ["USER"] }
//!
//! [[rules]]
//! pattern = "**"
//! access = { read = ["*@example.com"] }
//! ```

pub mod compiler;
pub mod explain;
pub mod patterns;
pub mod rule;
pub mod service;
pub mod tree;
pub mod types;

pub use compiler::{CompiledRule, ResolvedAccess, compile};
pub use explain::AccessReport;
pub use patterns::Matcher;
pub use rule::{Access, Rule, RuleSet};
pub use service::AclService;
pub use tree::{AclNode, AclTree, Specificity, specificity};
pub use types::{AccessLevel, AclRequest, User};
