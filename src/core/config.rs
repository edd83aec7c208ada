//! User configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::{
    ExternalViewer, ViewerError, WindowPolicy, DEFAULT_NEW_WINDOW_ARG, DEFAULT_REUSE_WINDOW_ARG,
    DEFAULT_VIEWER,
};

/// Environment variable overriding the viewer command line.
pub const VIEWER_ENV: &str = "DIFFTOOL_ALL_VIEWER";

/// Errors from loading the configuration file.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("cannot read config {}", path.display())]
    Io {
        /// Config file location.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// The file is not valid JSON for the config schema.
    #[error("invalid config {}", path.display())]
    Parse {
        /// Config file location.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },
}

/// Contents of `config.json`. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Viewer command line, e.g. `"code --diff"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewer: Option<String>,
    /// Argument requesting a new window.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_window_arg: Option<String>,
    /// Argument requesting window reuse.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reuse_window_arg: Option<String>,
    /// Paths that are always skipped.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,
    /// Window policy used when none is given on the command line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window: Option<WindowPolicy>,
}

impl Config {
    /// Default config file location.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("", "", "difftool-all")
            .map(|d| d.config_dir().to_path_buf())
            .unwrap_or_else(dirs_fallback)
            .join("config.json")
    }

    /// Load from `path`; a missing file yields the defaults.
    #[must_use = "this returns a Result that should be checked"]
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("[config] no config at {}", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Build the viewer, preferring `command_override`, then the
    /// environment, then the config file.
    #[must_use = "this returns a Result that should be checked"]
    pub fn viewer(&self, command_override: Option<&str>) -> Result<ExternalViewer, ViewerError> {
        let env_command = std::env::var(VIEWER_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty());
        let command = command_override
            .or(env_command.as_deref())
            .or(self.viewer.as_deref())
            .unwrap_or(DEFAULT_VIEWER);

        ExternalViewer::from_command_line(
            command,
            self.new_window_arg
                .as_deref()
                .unwrap_or(DEFAULT_NEW_WINDOW_ARG),
            self.reuse_window_arg
                .as_deref()
                .unwrap_or(DEFAULT_REUSE_WINDOW_ARG),
        )
    }
}

/// Fallback config directory if `directories` fails.
fn dirs_fallback() -> PathBuf {
    std::env::var("HOME")
        .map(|h| Path::new(&h).join(".config").join("difftool-all"))
        .unwrap_or_else(|_| PathBuf::from(".difftool-all"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn parses_all_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{
                "viewer": "meld",
                "new_window_arg": "",
                "reuse_window_arg": "",
                "exclude": ["Cargo.lock"],
                "window": "always-new"
            }"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.viewer.as_deref(), Some("meld"));
        assert_eq!(config.exclude, vec!["Cargo.lock".to_string()]);
        assert_eq!(config.window, Some(WindowPolicy::AlwaysNew));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"viewer": 3}"#).unwrap();
        assert!(matches!(
            Config::load(&path),
            Err(ConfigError::Parse { .. })
        ));

        std::fs::write(&path, r#"{"colour": "red"}"#).unwrap();
        assert!(matches!(
            Config::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn command_override_wins() {
        let config = Config {
            viewer: Some("meld".to_string()),
            ..Config::default()
        };
        let viewer = config.viewer(Some("kdiff3 --auto")).unwrap();
        assert_eq!(viewer.program(), "kdiff3");
    }

    #[test]
    fn default_path_ends_with_config_json() {
        assert!(Config::default_path().ends_with("config.json"));
    }

    #[test]
    fn serializes_without_empty_keys() {
        let json = serde_json::to_string(&Config::default()).unwrap();
        assert_eq!(json, "{}");
    }
}
