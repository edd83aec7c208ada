//! Common re-exports for convenient importing.
//!
//! # Example
//!
//! ```rust,ignore
//! use difftool_all::prelude::*;
//! ```

pub use crate::core::{
    Comparison, Config, Exclusions, ExternalViewer, RelPath, RepoError, RepoRoot, Revision,
    RunSummary, Session, SnapshotPair, Viewer, WindowMode, WindowPolicy, Workspace,
};
