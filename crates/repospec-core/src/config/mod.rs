//! Configuration loading
//!
//! Settings come from a single `repospec.toml`. Credentials that the file
//! leaves unset are read once from the environment when the file is loaded.

pub mod parser;
pub mod paths;
pub mod schema;

use anyhow::Result;
use std::path::Path;

pub use parser::{parse_config, parse_config_str};
pub use paths::{config_path_in, default_config_path};
pub use schema::{
    CacheSettings, GistSettings, GitHubSettings, GitLabSettings, RepoSpecConfig, ZenodoSettings,
};

/// Load configuration.
///
/// An explicit `path` must exist. Without one, the default location is used
/// if present, and built-in defaults otherwise.
pub fn load_config(path: Option<&Path>) -> Result<RepoSpecConfig> {
    let mut config = match path {
        Some(path) => parse_config(path)?,
        None => match default_config_path() {
            Some(default) if default.is_file() => parse_config(&default)?,
            _ => {
                tracing::debug!("No config file found, using defaults");
                RepoSpecConfig::default()
            }
        },
    };
    config.apply_env();
    Ok(config)
}
