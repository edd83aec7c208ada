//! One run: resolve revisions, enumerate changes, stage and show each path.

use thiserror::Error;

use crate::core::{
    materialize, resolve_revision, ChangeSet, Exclusions, RelPath, RepoError, RepoRoot, Revision,
    Viewer, ViewerError, WindowPolicy, Workspace,
};

/// Errors that abort a run.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    /// Resolution, enumeration, or retrieval failed.
    #[error(transparent)]
    Repo(#[from] RepoError),
    /// The viewer failed for `path`.
    #[error("cannot show {path}")]
    Viewer {
        /// Path being shown when the viewer failed.
        path: RelPath,
        /// Underlying error.
        source: ViewerError,
    },
}

/// Revisions being compared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    /// Left (older) revision.
    pub left: Revision,
    /// Right revision; `None` compares against the working tree.
    pub right: Option<Revision>,
}

impl Comparison {
    /// Resolve the user's references. The right side is optional.
    #[must_use = "this returns a Result that should be checked"]
    pub fn resolve(root: &RepoRoot, left: &str, right: Option<&str>) -> Result<Self, RepoError> {
        let left = resolve_revision(root, left)?;
        let right = right.map(|r| resolve_revision(root, r)).transpose()?;
        Ok(Self { left, right })
    }
}

/// What a completed run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Paths shown, in enumeration order.
    pub shown: Vec<RelPath>,
}

/// Everything a run needs, created once and shared by every path.
#[derive(Debug)]
pub struct Session<'a> {
    /// Repository the revisions belong to.
    pub repo: &'a RepoRoot,
    /// Where snapshots are written.
    pub workspace: &'a Workspace,
    /// Revisions being compared.
    pub comparison: &'a Comparison,
    /// How viewer windows are assigned.
    pub window_policy: WindowPolicy,
}

impl Session<'_> {
    /// Process every changed, non-excluded path in order.
    ///
    /// Stops at the first error; snapshots and windows from earlier paths
    /// are left in place.
    #[must_use = "this returns a Result that should be checked"]
    pub fn run(
        &self,
        exclusions: Exclusions,
        viewer: &mut dyn Viewer,
    ) -> Result<RunSummary, SessionError> {
        let left = &self.comparison.left;
        let right = self.comparison.right.as_ref();

        let changes = ChangeSet::spawn(self.repo, left, right, exclusions)?;
        let mut summary = RunSummary::default();

        for (index, path) in changes.enumerate() {
            let path = path?;
            let pair = materialize(self.repo, self.workspace, &path, left, right)?;
            let mode = self.window_policy.mode_for(index);

            log::info!("[session] {} ({})", path, mode);
            viewer
                .open(&pair, mode)
                .map_err(|source| SessionError::Viewer {
                    path: path.clone(),
                    source,
                })?;
            summary.shown.push(path);
        }

        Ok(summary)
    }
}
