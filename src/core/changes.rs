//! Enumeration of paths that differ between two revisions.

use std::collections::HashSet;
use std::io::{BufRead, BufReader, Read, Split};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::thread::JoinHandle;

use crate::core::{RelPath, RepoError, RepoRoot, Revision};
use crate::metrics::Timer;

/// Paths the caller asked to skip.
#[derive(Debug, Default, Clone)]
pub struct Exclusions {
    paths: HashSet<String>,
}

impl Exclusions {
    /// Create an empty exclusion set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a path; matching is exact on the root-relative path.
    pub fn insert(&mut self, path: impl Into<String>) {
        self.paths.insert(path.into());
    }

    /// Check whether `path` is excluded.
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains(path)
    }

    /// Number of excluded paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// True when nothing is excluded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for Exclusions {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            paths: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl<S: Into<String>> Extend<S> for Exclusions {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        self.paths.extend(iter.into_iter().map(Into::into));
    }
}

/// Normalize one NUL-terminated record of `git diff --name-only -z` output.
///
/// Returns `None` for blank records and excluded paths. Records are exact
/// file names, so surrounding whitespace is kept.
pub fn filter_record(record: &str, exclusions: &Exclusions) -> Option<RelPath> {
    if record.trim().is_empty() || exclusions.contains(record) {
        return None;
    }
    Some(RelPath::new(record))
}

/// Lazy sequence of changed paths, backed by a running `git diff` process.
///
/// The exit status is checked once stdout is exhausted; a failure is
/// reported as a final `Err` item. The iterator yields nothing after that.
pub struct ChangeSet {
    child: Option<Child>,
    records: Option<Split<BufReader<ChildStdout>>>,
    stderr: Option<JoinHandle<Vec<u8>>>,
    exclusions: Exclusions,
    timer: Option<Timer>,
}

impl ChangeSet {
    /// Start listing paths changed between `left` and `right`.
    ///
    /// With no `right`, the comparison is against the working tree.
    #[must_use = "this returns a Result that should be checked"]
    pub fn spawn(
        root: &RepoRoot,
        left: &Revision,
        right: Option<&Revision>,
        exclusions: Exclusions,
    ) -> Result<Self, RepoError> {
        let mut cmd = root.git();
        cmd.args(["diff", "--name-only", "-z"]).arg(left.short_id());
        if let Some(right) = right {
            cmd.arg(right.short_id());
        }
        // Trailing -- keeps revisions from being read as paths
        cmd.arg("--");

        log::debug!(
            "[changes] diff {}..{}",
            left,
            right.map_or("<working tree>".to_string(), ToString::to_string)
        );

        Self::from_command(cmd, exclusions, Timer::start("git diff --name-only"))
    }

    /// Stream NUL-separated paths from an arbitrary command.
    fn from_command(
        mut cmd: Command,
        exclusions: Exclusions,
        timer: Option<Timer>,
    ) -> Result<Self, RepoError> {
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        let mut child = cmd.spawn()?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| RepoError::Enumeration("stdout not captured".to_string()))?;

        // Drained concurrently so a chatty stderr cannot fill its pipe and
        // stall the process while stdout is still being read
        let stderr = child.stderr.take().map(|mut stderr| {
            std::thread::spawn(move || {
                let mut buf = Vec::new();
                let _ = stderr.read_to_end(&mut buf);
                buf
            })
        });

        Ok(Self {
            child: Some(child),
            records: Some(BufReader::new(stdout).split(b'\0')),
            stderr,
            exclusions,
            timer,
        })
    }

    /// Wait for the process and turn a non-zero exit into an error.
    fn finish(&mut self) -> Option<RepoError> {
        self.records = None;
        let mut child = self.child.take()?;

        let status = child.wait();
        self.timer = None;
        let stderr_buf = self
            .stderr
            .take()
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default();

        let status = match status {
            Ok(status) => status,
            Err(e) => return Some(e.into()),
        };
        if status.success() {
            return None;
        }

        let stderr = String::from_utf8_lossy(&stderr_buf);
        let message = match stderr.trim() {
            "" => format!("git diff exited with {}", status),
            s => s.to_string(),
        };
        Some(RepoError::Enumeration(message))
    }
}

impl Iterator for ChangeSet {
    type Item = Result<RelPath, RepoError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let record = match self.records.as_mut()?.next() {
                Some(Ok(record)) => record,
                Some(Err(e)) => {
                    self.finish();
                    return Some(Err(e.into()));
                }
                None => return self.finish().map(Err),
            };

            let Ok(record) = String::from_utf8(record) else {
                self.finish();
                return Some(Err(RepoError::InvalidUtf8));
            };

            if let Some(path) = filter_record(&record, &self.exclusions) {
                return Some(Ok(path));
            }
            log::trace!("[changes] skipped record {:?}", record);
        }
    }
}

impl std::iter::FusedIterator for ChangeSet {}

impl Drop for ChangeSet {
    fn drop(&mut self) {
        // Abandoned mid-stream: close the pipe so the child exits, then reap it
        self.records = None;
        if let Some(mut child) = self.child.take() {
            let _ = child.wait();
        }
        if let Some(handle) = self.stderr.take() {
            let _ = handle.join();
        }
    }
}
