//! difftool-all - Open every changed file of a git comparison in a diff viewer.
//!
//! Lists the paths that differ between two revisions (or a revision and the
//! working tree), copies each side into a temporary workspace, and hands the
//! pair to an external two-pane viewer such as `code --diff`.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use difftool_all::prelude::*;
//!
//! let repo = RepoRoot::discover(std::path::Path::new("."))?;
//! let comparison = Comparison::resolve(&repo, "HEAD~1", None)?;
//! let workspace = Workspace::create()?;
//! let session = Session {
//!     repo: &repo,
//!     workspace: &workspace,
//!     comparison: &comparison,
//!     window_policy: WindowPolicy::default(),
//! };
//! session.run(Exclusions::new(), &mut ExternalViewer::default())?;
//! ```

#![deny(missing_docs)]

pub mod cli;
pub mod core;
pub mod metrics;
pub mod prelude;
