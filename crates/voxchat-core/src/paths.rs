//! Filesystem locations for configuration and data.

use std::path::PathBuf;

/// Home directory for the current platform, if known.
fn home_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    let home = std::env::var("USERPROFILE").ok();
    #[cfg(not(target_os = "windows"))]
    let home = std::env::var("HOME").ok();
    home.map(PathBuf::from)
}

/// Expand a leading `~/` against the home directory.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(rest)
    } else {
        PathBuf::from(path)
    }
}

/// Default config file path (`~/.voxchat/config.toml`).
pub fn default_config_path() -> PathBuf {
    match home_dir() {
        Some(home) => home.join(".voxchat").join("config.toml"),
        None => PathBuf::from("config.toml"),
    }
}
