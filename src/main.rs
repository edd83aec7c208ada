//! difftool-all - open every changed file of a git comparison in a diff viewer.

use std::process::ExitCode;

use clap::Parser;

use difftool_all::cli::{run, Cli};
use difftool_all::metrics;

fn main() -> ExitCode {
    init_logging();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

/// Logger defaults to warnings; metrics records are always shown when enabled.
fn init_logging() {
    metrics::init();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if metrics::enabled() {
        builder.filter_module(metrics::TARGET, log::LevelFilter::Info);
    }
    builder.init();
}
