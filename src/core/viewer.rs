//! Launching the external two-pane diff viewer.

use std::path::{Path, PathBuf};
use std::process::Command;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::SnapshotPair;
use crate::metrics::Timer;

/// Default viewer command line.
pub const DEFAULT_VIEWER: &str = "code --diff";
/// Default argument asking the viewer for a new window.
pub const DEFAULT_NEW_WINDOW_ARG: &str = "-n";
/// Default argument asking the viewer to reuse its last window.
pub const DEFAULT_REUSE_WINDOW_ARG: &str = "-r";

/// Errors from launching the viewer.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ViewerError {
    /// The configured command line is empty or cannot be parsed.
    #[error("invalid viewer command: {0}")]
    InvalidCommand(String),
    /// The viewer process could not be started.
    #[error("failed to launch viewer: {0}")]
    Io(#[from] std::io::Error),
    /// The viewer exited with a non-zero status.
    #[error("viewer exited with code {code:?}")]
    Exited {
        /// Exit code, if the process was not killed by a signal.
        code: Option<i32>,
    },
}

/// Window handling for a single viewer invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowMode {
    /// Open a new window.
    New,
    /// Show the comparison in the last active window.
    Reuse,
}

impl std::fmt::Display for WindowMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::New => write!(f, "new window"),
            Self::Reuse => write!(f, "reuse window"),
        }
    }
}

/// How window modes are assigned across the changed paths of a run.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum WindowPolicy {
    /// First path opens a window, later paths reuse it.
    #[default]
    FirstNew,
    /// Every path opens its own window.
    AlwaysNew,
    /// Every path goes to the last active window.
    AlwaysReuse,
}

impl WindowPolicy {
    /// Window mode for the path at `index` in enumeration order.
    #[must_use]
    pub fn mode_for(self, index: usize) -> WindowMode {
        match self {
            Self::FirstNew if index == 0 => WindowMode::New,
            Self::FirstNew => WindowMode::Reuse,
            Self::AlwaysNew => WindowMode::New,
            Self::AlwaysReuse => WindowMode::Reuse,
        }
    }
}

/// Something that can display one comparison.
pub trait Viewer {
    /// Show `pair` using the given window mode.
    fn open(&mut self, pair: &SnapshotPair, mode: WindowMode) -> Result<(), ViewerError>;
}

/// Viewer backed by an external program such as `code --diff`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalViewer {
    program: String,
    args: Vec<String>,
    new_window_arg: Option<String>,
    reuse_window_arg: Option<String>,
}

impl ExternalViewer {
    /// Parse a shell-style command line such as `code --diff`.
    ///
    /// Empty window arguments are omitted from the invocation.
    #[must_use = "this returns a Result that should be checked"]
    pub fn from_command_line(
        command: &str,
        new_window_arg: &str,
        reuse_window_arg: &str,
    ) -> Result<Self, ViewerError> {
        let parts = shell_words::split(command.trim())
            .map_err(|e| ViewerError::InvalidCommand(format!("{}: {}", command, e)))?;
        let (program, args) = parts
            .split_first()
            .ok_or_else(|| ViewerError::InvalidCommand("empty command".to_string()))?;

        let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            new_window_arg: non_empty(new_window_arg),
            reuse_window_arg: non_empty(reuse_window_arg),
        })
    }

    /// Full argument list for one invocation, excluding the program.
    #[must_use]
    pub fn arguments(&self, left: &Path, right: &Path, mode: WindowMode) -> Vec<PathBuf> {
        let window_arg = match mode {
            WindowMode::New => self.new_window_arg.as_deref(),
            WindowMode::Reuse => self.reuse_window_arg.as_deref(),
        };

        self.args
            .iter()
            .map(String::as_str)
            .chain(window_arg)
            .map(PathBuf::from)
            .chain([left.to_path_buf(), right.to_path_buf()])
            .collect()
    }

    /// Program that is executed.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Default for ExternalViewer {
    fn default() -> Self {
        Self {
            program: "code".to_string(),
            args: vec!["--diff".to_string()],
            new_window_arg: Some(DEFAULT_NEW_WINDOW_ARG.to_string()),
            reuse_window_arg: Some(DEFAULT_REUSE_WINDOW_ARG.to_string()),
        }
    }
}

impl Viewer for ExternalViewer {
    fn open(&mut self, pair: &SnapshotPair, mode: WindowMode) -> Result<(), ViewerError> {
        let args = self.arguments(&pair.left, pair.right.path(), mode);
        log::debug!("[viewer] {} {:?}", self.program, args);

        let _timer = Timer::start("viewer");
        let status = Command::new(&self.program).args(&args).status()?;

        if !status.success() {
            return Err(ViewerError::Exited {
                code: status.code(),
            });
        }
        Ok(())
    }
}

/// Viewer that prints each comparison instead of launching anything.
#[derive(Debug)]
pub struct DryRunViewer<W = std::io::Stdout> {
    out: W,
}

impl DryRunViewer {
    /// Print to standard output.
    pub fn stdout() -> Self {
        Self {
            out: std::io::stdout(),
        }
    }
}

impl<W: std::io::Write> DryRunViewer<W> {
    /// Print to an arbitrary writer.
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Consume the viewer and return its writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: std::io::Write> Viewer for DryRunViewer<W> {
    fn open(&mut self, pair: &SnapshotPair, mode: WindowMode) -> Result<(), ViewerError> {
        writeln!(
            self.out,
            "{} {} ({})",
            pair.left.display(),
            pair.right.path().display(),
            mode
        )?;
        Ok(())
    }
}
