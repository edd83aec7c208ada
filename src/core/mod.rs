//! Core primitives for difftool-all (no CLI dependencies).

mod changes;
mod config;
mod repo;
mod session;
mod snapshot;
mod viewer;

pub use changes::*;
pub use config::*;
pub use repo::*;
pub use session::*;
pub use snapshot::*;
pub use viewer::*;
