//! Command-line surface.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};

use crate::core::{
    Comparison, Config, DryRunViewer, Exclusions, RepoError, RepoRoot, Session, Viewer,
    WindowPolicy, Workspace,
};

/// Open every file changed between two git revisions in a diff viewer.
///
/// With only LEFT, each file is compared against the working tree so edits
/// made in the viewer land in the repository.
#[derive(Parser, Debug)]
#[command(name = "difftool-all", version, about)]
pub struct Cli {
    /// Left revision (branch, tag, commit, HEAD~n, ...)
    #[arg(value_name = "LEFT")]
    pub left: String,

    /// Right revision; defaults to the working tree
    #[arg(value_name = "RIGHT")]
    pub right: Option<String>,

    /// Path to skip (repository-relative); repeat for more
    #[arg(short = 'e', long = "exclude", value_name = "PATH", action = ArgAction::Append)]
    pub exclude: Vec<String>,

    /// Viewer command line (overrides $DIFFTOOL_ALL_VIEWER and the config file)
    #[arg(long = "viewer", value_name = "COMMAND")]
    pub viewer: Option<String>,

    /// How viewer windows are opened across files
    #[arg(short = 'w', long = "window", value_enum, value_name = "POLICY")]
    pub window: Option<WindowPolicy>,

    /// Stage snapshots and print the pairs without launching the viewer
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Config file location
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Run the tool with parsed arguments.
pub fn run(cli: Cli) -> Result<()> {
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let repo = match RepoRoot::discover(&cwd) {
        Ok(repo) => repo,
        Err(RepoError::NotARepo) => anyhow::bail!("Not inside a git repository"),
        Err(e) => return Err(e.into()),
    };

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let config = Config::load(&config_path)?;

    let mut viewer: Box<dyn Viewer> = if cli.dry_run {
        Box::new(DryRunViewer::stdout())
    } else {
        Box::new(config.viewer(cli.viewer.as_deref())?)
    };

    let comparison = Comparison::resolve(&repo, &cli.left, cli.right.as_deref())?;

    let workspace = Workspace::create().context("Failed to create temporary workspace")?;
    println!("To clean up workspace, run");
    println!("    {}", workspace.cleanup_command());

    let mut exclusions: Exclusions = config.exclude.iter().cloned().collect();
    exclusions.extend(cli.exclude);

    let session = Session {
        repo: &repo,
        workspace: &workspace,
        comparison: &comparison,
        window_policy: cli.window.or(config.window).unwrap_or_default(),
    };
    let summary = session.run(exclusions, viewer.as_mut())?;

    if summary.shown.is_empty() {
        println!("No changes detected");
    }
    log::info!("[cli] showed {} file(s)", summary.shown.len());

    Ok(())
}
