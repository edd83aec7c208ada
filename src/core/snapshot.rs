//! Materializing per-path snapshots into the run's temporary workspace.

use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use crate::core::{RelPath, RepoError, RepoRoot, Revision};
use crate::metrics::Timer;

/// Prefix of the temporary workspace directory.
pub const WORKSPACE_PREFIX: &str = "difftool-";

/// Temporary directory holding every snapshot of one run.
///
/// The directory outlives the process; the user removes it by hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Create a fresh workspace under the system temp directory.
    #[must_use = "this returns a Result that should be checked"]
    pub fn create() -> std::io::Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(WORKSPACE_PREFIX)
            .tempdir()?;
        Ok(Self { root: dir.keep() })
    }

    /// Use an existing directory as the workspace (for testing).
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Workspace root.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Shell command that removes the workspace.
    #[must_use]
    pub fn cleanup_command(&self) -> String {
        let quoted = shell_words::quote(&self.root.to_string_lossy()).into_owned();
        format!("rm -rf {}", quoted)
    }

    /// Mirror the directory of `path` inside the workspace.
    fn ensure_dir(&self, path: &RelPath) -> std::io::Result<PathBuf> {
        let dir = match path.parent() {
            "" => self.root.clone(),
            parent => self.root.join(parent),
        };
        // create_dir_all succeeds when the directory already exists
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }
}

/// Where the right-hand side of a comparison comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RightSide {
    /// Content of an explicit revision, copied into the workspace.
    Snapshot(PathBuf),
    /// The live file in the working tree.
    WorkingTree(PathBuf),
    /// Deleted from the working tree; compared against the null device.
    Absent,
}

impl RightSide {
    /// Filesystem location handed to the viewer.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Snapshot(p) | Self::WorkingTree(p) => p,
            Self::Absent => null_device(),
        }
    }
}

/// The two locations compared for one changed path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotPair {
    /// Repository-relative path being compared.
    pub path: RelPath,
    /// Copy of the file as of the left revision (empty if it did not exist).
    pub left: PathBuf,
    /// Right-hand location.
    pub right: RightSide,
}

/// Platform null device, used as the placeholder for deleted files.
#[must_use]
pub fn null_device() -> &'static Path {
    if cfg!(windows) {
        Path::new("NUL")
    } else {
        Path::new("/dev/null")
    }
}

/// Name of the snapshot file for `path` at `rev`: `<short-id>.<basename>`.
#[must_use]
pub fn snapshot_name(rev: &Revision, path: &RelPath) -> String {
    format!("{}.{}", rev.short_id(), path.file_name())
}

/// Materialize both sides of `path` into `workspace`.
///
/// The left copy is written even when the path is missing at `left` (it is
/// then empty). A missing path at an explicit `right` is an error.
#[must_use = "this returns a Result that should be checked"]
pub fn materialize(
    root: &RepoRoot,
    workspace: &Workspace,
    path: &RelPath,
    left: &Revision,
    right: Option<&Revision>,
) -> Result<SnapshotPair, RepoError> {
    let dir = workspace.ensure_dir(path)?;

    let left_path = dir.join(snapshot_name(left, path));
    write_left(root, left, path, &left_path)?;

    let right = match right {
        Some(rev) => {
            let right_path = dir.join(snapshot_name(rev, path));
            write_right(root, rev, path, &right_path)?;
            RightSide::Snapshot(right_path)
        }
        None => {
            let live = path.to_absolute(root);
            if live.exists() {
                RightSide::WorkingTree(live)
            } else {
                RightSide::Absent
            }
        }
    };

    log::debug!(
        "[snapshot] {}: {} <-> {}",
        path,
        left_path.display(),
        right.path().display()
    );

    Ok(SnapshotPair {
        path: path.clone(),
        left: left_path,
        right,
    })
}

/// Write `rev:path` into `dest`, ignoring a failed lookup.
fn write_left(
    root: &RepoRoot,
    rev: &Revision,
    path: &RelPath,
    dest: &Path,
) -> Result<(), RepoError> {
    let file = File::create(dest)?;
    let _timer = Timer::start("git show (left)");
    let status = root
        .git()
        .arg("show")
        .arg(rev.object(path))
        .stdout(Stdio::from(file))
        .stderr(Stdio::null())
        .status()?;

    if !status.success() {
        // Newly added path: keep the empty file
        log::debug!("[snapshot] {} absent at {}", path, rev);
    }
    Ok(())
}

/// Write `rev:path` into `dest`; a failed lookup is fatal.
fn write_right(
    root: &RepoRoot,
    rev: &Revision,
    path: &RelPath,
    dest: &Path,
) -> Result<(), RepoError> {
    let file = File::create(dest)?;
    let _timer = Timer::start("git show (right)");
    let mut child = root
        .git()
        .arg("show")
        .arg(rev.object(path))
        .stdout(Stdio::from(file))
        .stderr(Stdio::piped())
        .spawn()?;

    let mut stderr_buf = Vec::new();
    if let Some(mut stderr) = child.stderr.take() {
        stderr.read_to_end(&mut stderr_buf)?;
    }
    let status = child.wait()?;

    if !status.success() {
        let stderr = String::from_utf8_lossy(&stderr_buf);
        return Err(RepoError::Retrieval {
            object: rev.object(path),
            message: stderr.trim().to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_name_uses_short_id_and_basename() {
        let rev = Revision::new("feature/x", "def456");
        assert_eq!(snapshot_name(&rev, &RelPath::new("a/b.txt")), "def456.b.txt");
    }

    #[test]
    fn ensure_dir_mirrors_parent_and_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let ws = Workspace::at(tmp.path());

        let first = ws.ensure_dir(&RelPath::new("a/b/c.txt")).unwrap();
        let second = ws.ensure_dir(&RelPath::new("a/b/d.txt")).unwrap();
        assert_eq!(first, tmp.path().join("a/b"));
        assert_eq!(first, second);
        assert!(first.is_dir());

        let top = ws.ensure_dir(&RelPath::new("top.txt")).unwrap();
        assert_eq!(top, tmp.path());
    }

    #[test]
    fn absent_right_side_points_at_null_device() {
        assert_eq!(RightSide::Absent.path(), null_device());
        let live = PathBuf::from("/repo/src/x.txt");
        assert_eq!(RightSide::WorkingTree(live.clone()).path(), live.as_path());
    }

    #[test]
    fn cleanup_command_quotes_path() {
        let ws = Workspace::at("/tmp/difftool-abc");
        assert_eq!(ws.cleanup_command(), "rm -rf /tmp/difftool-abc");

        let spaced = Workspace::at("/tmp/with space");
        assert_eq!(spaced.cleanup_command(), "rm -rf '/tmp/with space'");
    }

    #[test]
    fn create_keeps_directory() {
        let ws = Workspace::create().unwrap();
        assert!(ws.path().is_dir());
        assert!(ws
            .path()
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(WORKSPACE_PREFIX)));
        fs::remove_dir_all(ws.path()).unwrap();
    }
}
