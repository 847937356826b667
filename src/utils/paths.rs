//! Cross-Platform Path Utilities
//!
//! Functions for resolving application directories across platforms.
//! Everything lives under ~/.atlasfield/.

use std::path::{Path, PathBuf};

use crate::utils::error::{AppError, AppResult};

/// Get the user's home directory
pub fn home_dir() -> AppResult<PathBuf> {
    dirs::home_dir().ok_or_else(|| AppError::config("Could not determine home directory"))
}

/// Get the AtlasField directory (~/.atlasfield/)
pub fn atlasfield_dir() -> AppResult<PathBuf> {
    Ok(home_dir()?.join(".atlasfield"))
}

/// Get the config file path (~/.atlasfield/config.json)
pub fn config_path() -> AppResult<PathBuf> {
    Ok(atlasfield_dir()?.join("config.json"))
}

/// Get the durable client state path (~/.atlasfield/state.json)
pub fn state_path() -> AppResult<PathBuf> {
    Ok(atlasfield_dir()?.join("state.json"))
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_dir(path: &Path) -> AppResult<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Get the AtlasField directory, creating if it doesn't exist
pub fn ensure_atlasfield_dir() -> AppResult<PathBuf> {
    let path = atlasfield_dir()?;
    ensure_dir(&path)?;
    Ok(path)
}
