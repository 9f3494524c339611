//! Platform directories for configuration, collections, and logs.

use crate::error::ApiError;
use directories::ProjectDirs;
use std::path::PathBuf;

fn project_dirs() -> Result<ProjectDirs, ApiError> {
    ProjectDirs::from("", "taskfs", "taskfs").ok_or_else(|| {
        ApiError::ConfigError("Could not determine platform directories (HOME not set)".to_string())
    })
}

/// Get XDG config home directory
///
/// Returns `$XDG_CONFIG_HOME` if set, otherwise defaults to `$HOME/.config`
pub fn config_home() -> Result<PathBuf, ApiError> {
    if let Ok(xdg_config_home) = std::env::var("XDG_CONFIG_HOME") {
        if !xdg_config_home.is_empty() {
            return Ok(PathBuf::from(xdg_config_home));
        }
    }

    let home = std::env::var("HOME").map_err(|_| {
        ApiError::ConfigError(
            "Could not determine XDG config home directory (HOME not set)".to_string(),
        )
    })?;

    Ok(PathBuf::from(home).join(".config"))
}

/// `$XDG_CONFIG_HOME/taskfs/config.toml`
pub fn global_config_file() -> Result<PathBuf, ApiError> {
    Ok(config_home()?.join("taskfs").join("config.toml"))
}

/// Platform data directory (`$XDG_DATA_HOME/taskfs` on Linux)
pub fn data_dir() -> Result<PathBuf, ApiError> {
    Ok(project_dirs()?.data_dir().to_path_buf())
}

/// Directory for log files; the state dir where the platform has one.
pub fn state_dir() -> Result<PathBuf, ApiError> {
    let dirs = project_dirs()?;
    Ok(dirs
        .state_dir()
        .unwrap_or_else(|| dirs.data_local_dir())
        .to_path_buf())
}
