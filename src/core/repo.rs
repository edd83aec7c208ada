//! Git repository discovery and revision resolution.

use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;

use crate::metrics::Timer;

/// Errors from repository operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RepoError {
    /// Path is not inside a git repository.
    #[error("not inside a git repository")]
    NotARepo,
    /// A revision reference does not name a commit.
    #[error("cannot resolve revision '{revision}': {message}")]
    Resolution {
        /// The reference as supplied by the user.
        revision: String,
        /// Diagnostic reported by git.
        message: String,
    },
    /// `git diff --name-only` exited with a non-zero status.
    #[error("listing changed files failed: {0}")]
    Enumeration(String),
    /// Content of an explicit revision could not be read.
    #[error("cannot read '{object}': {message}")]
    Retrieval {
        /// The `<rev>:<path>` object that was requested.
        object: String,
        /// Diagnostic reported by git.
        message: String,
    },
    /// I/O error during git operation.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Git output contained invalid UTF-8.
    #[error("invalid utf-8 in git output")]
    InvalidUtf8,
}

/// Error when constructing a RelPath with an absolute path.
#[derive(Debug, Clone, thiserror::Error)]
#[error("path must be relative, got: {0}")]
pub struct InvalidRelPath(pub String);

/// Canonicalized path to a git repository root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoRoot(PathBuf);

impl RepoRoot {
    /// Discover the git repository containing the given path.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use difftool_all::core::RepoRoot;
    /// use std::path::Path;
    ///
    /// let repo = RepoRoot::discover(Path::new(".")).expect("not in a git repo");
    /// println!("Repo at: {}", repo.path().display());
    /// ```
    #[must_use = "this returns a Result that should be checked"]
    pub fn discover(path: &Path) -> Result<Self, RepoError> {
        let output = Command::new("git")
            .arg("rev-parse")
            .arg("--show-toplevel")
            .current_dir(path)
            .output()?;

        if !output.status.success() {
            return Err(RepoError::NotARepo);
        }

        let root = std::str::from_utf8(&output.stdout)
            .map_err(|_| RepoError::InvalidUtf8)?
            .trim();

        let canonical = PathBuf::from(root)
            .canonicalize()
            .map_err(|_| RepoError::NotARepo)?;

        Ok(Self(canonical))
    }

    /// Get the repository root path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.0
    }

    /// Start a `git` command that runs inside the repository root.
    pub fn git(&self) -> Command {
        let mut cmd = Command::new("git");
        cmd.current_dir(&self.0);
        cmd
    }
}

/// A repository-relative path. Never absolute.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelPath(String);

impl RelPath {
    /// Create a new RelPath from a string.
    ///
    /// Returns an error if the path is absolute (starts with `/`).
    ///
    /// # Examples
    ///
    /// ```
    /// use difftool_all::core::RelPath;
    ///
    /// let path = RelPath::try_new("src/main.rs").unwrap();
    /// assert_eq!(path.as_str(), "src/main.rs");
    ///
    /// assert!(RelPath::try_new("/absolute/path").is_err());
    /// ```
    #[must_use = "this returns a Result that should be checked"]
    pub fn try_new(path: impl Into<String>) -> Result<Self, InvalidRelPath> {
        let path = path.into();
        if path.starts_with('/') {
            return Err(InvalidRelPath(path));
        }
        Ok(Self(path))
    }

    /// Create a new RelPath without validation.
    ///
    /// Used for trusted input from git commands, which always reports
    /// root-relative paths.
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        debug_assert!(
            !path.starts_with('/'),
            "RelPath must not be absolute: {}",
            path
        );
        Self(path)
    }

    /// Get the path as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert to an absolute path given a repo root.
    #[must_use]
    pub fn to_absolute(&self, root: &RepoRoot) -> PathBuf {
        root.path().join(&self.0)
    }

    /// Get the file name.
    #[must_use]
    pub fn file_name(&self) -> &str {
        Path::new(&self.0)
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.0)
    }

    /// Get the containing directory, empty for top-level files.
    #[must_use]
    pub fn parent(&self) -> &str {
        match self.0.rfind('/') {
            Some(idx) => &self.0[..idx],
            None => "",
        }
    }
}

impl std::fmt::Display for RelPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A revision resolved to its abbreviated commit id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Revision {
    reference: String,
    short_id: String,
}

impl Revision {
    /// Build a revision from an already-resolved id.
    pub fn new(reference: impl Into<String>, short_id: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            short_id: short_id.into(),
        }
    }

    /// The reference as typed by the user (branch, tag, `HEAD~2`, ...).
    #[must_use]
    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// Abbreviated commit id.
    #[must_use]
    pub fn short_id(&self) -> &str {
        &self.short_id
    }

    /// Object name for `path` as of this revision, e.g. `abc1234:src/x.txt`.
    #[must_use]
    pub fn object(&self, path: &RelPath) -> String {
        format!("{}:{}", self.short_id, path.as_str())
    }
}

impl std::fmt::Display for Revision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.short_id)
    }
}

/// Resolve a revision reference to its abbreviated commit id.
///
/// Tags are peeled to the commit they point at.
#[must_use = "this returns a Result that should be checked"]
pub fn resolve_revision(root: &RepoRoot, reference: &str) -> Result<Revision, RepoError> {
    // Refs like "-x" would otherwise be parsed as options
    if reference.is_empty() || reference.starts_with('-') {
        return Err(RepoError::Resolution {
            revision: reference.to_string(),
            message: "not a valid revision".to_string(),
        });
    }

    let _timer = Timer::start("git rev-parse");
    let output = root
        .git()
        .args(["rev-parse", "--verify", "--short"])
        .arg(format!("{}^{{commit}}", reference))
        .output()?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let message = match stderr.trim() {
            "" => "unknown revision".to_string(),
            s => s.to_string(),
        };
        return Err(RepoError::Resolution {
            revision: reference.to_string(),
            message,
        });
    }

    let short_id = std::str::from_utf8(&output.stdout)
        .map_err(|_| RepoError::InvalidUtf8)?
        .trim()
        .to_string();

    log::debug!("[resolve] {} -> {}", reference, short_id);
    Ok(Revision::new(reference, short_id))
}
