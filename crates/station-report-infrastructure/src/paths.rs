//! Per-user locations of station-report files.

use std::path::PathBuf;

const APP_DIR: &str = "station-report";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Platform config or data directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Path resolution for station-report.
///
/// # Directory Structure
///
/// ```text
/// ~/.config/station-report/        # Config directory
/// ├── config.toml                  # Presets and persistence settings
/// ├── credentials.json             # Google service-account key
/// └── secret.json                  # Static access token override
///
/// ~/.local/share/station-report/   # Data directory
/// └── reports.jsonl                # Rows written by the local backend
/// ```
pub struct StationPaths;

impl StationPaths {
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::HomeDirNotFound)
    }

    pub fn data_dir() -> Result<PathBuf, PathError> {
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::HomeDirNotFound)
    }

    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Path to `secret.json`.
    ///
    /// # Security Note
    ///
    /// Keep this file readable by the owner only (e.g. mode 600).
    pub fn secret_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("secret.json"))
    }

    /// Default service-account key for the Sheets backend.
    pub fn credentials_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("credentials.json"))
    }

    /// Default target of the local backend.
    pub fn reports_file() -> Result<PathBuf, PathError> {
        Ok(Self::data_dir()?.join("reports.jsonl"))
    }
}
