//! Config path resolution helpers.

use std::path::{Path, PathBuf};

/// File name looked up inside the config directory.
pub const CONFIG_FILE_NAME: &str = "repospec.toml";

/// `<config_dir>/repospec/repospec.toml`
pub fn config_path_in(config_dir: &Path) -> PathBuf {
    config_dir.join("repospec").join(CONFIG_FILE_NAME)
}

/// Default config location for the current user, if one can be determined.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| config_path_in(&dir))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_path_layout() {
        assert_eq!(
            config_path_in(Path::new("/home/me/.config")),
            PathBuf::from("/home/me/.config/repospec/repospec.toml")
        );
    }
}
