//! Configuration file locations
//!
//! Linux: `$XDG_CONFIG_HOME/apiprobe/config.toml`
//! macOS: `~/Library/Application Support/apiprobe/config.toml`
//! Windows: `%APPDATA%\apiprobe\config\config.toml`

use std::path::PathBuf;

/// Application name used for directory lookup
const APP_NAME: &str = "apiprobe";

/// Get the configuration directory
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the default configuration file path
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}
