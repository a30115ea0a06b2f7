//! Loading of `config.toml` and `secret.json`.

use crate::paths::StationPaths;
use anyhow::{Context, Result};
use station_report_core::config::{AppConfig, GoogleSheetsSecret, SecretConfig};
use std::path::{Path, PathBuf};

/// Environment variable that overrides the Sheets token from `secret.json`.
pub const SHEETS_TOKEN_ENV: &str = "STATION_REPORT_SHEETS_TOKEN";

/// Reads the application configuration.
///
/// A missing file yields the defaults, so a first run works without setup.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
}

impl ConfigService {
    /// Service for an explicit path, or the default location when `None`.
    pub fn new(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => StationPaths::config_file()
                .map_err(|e| anyhow::anyhow!("Failed to get config path: {}", e))?,
        };
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<AppConfig> {
        if !self.path.exists() {
            tracing::info!(path = %self.path.display(), "config file not found, using defaults");
            return Ok(AppConfig::default());
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let config: AppConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", self.path.display()))?;
        tracing::debug!(path = %self.path.display(), backend = ?config.persistence.backend, "config loaded");
        Ok(config)
    }
}

/// Reads credentials from `secret.json`.
#[derive(Debug, Clone)]
pub struct SecretService {
    path: PathBuf,
}

impl SecretService {
    pub fn new(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => StationPaths::secret_file()
                .map_err(|e| anyhow::anyhow!("Failed to get secret path: {}", e))?,
        };
        Ok(Self { path })
    }

    /// Loads secrets, with [`SHEETS_TOKEN_ENV`] taking precedence over the file.
    pub fn load_secrets(&self) -> Result<SecretConfig> {
        let from_file = self.load_file()?;
        Ok(with_token_override(
            from_file,
            std::env::var(SHEETS_TOKEN_ENV).ok(),
        ))
    }

    fn load_file(&self) -> Result<SecretConfig> {
        if !self.path.exists() {
            return Ok(SecretConfig::default());
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        // the error message must not echo the file content
        serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse {}: line {}", self.path.display(), e.line()))
    }
}

fn with_token_override(mut secrets: SecretConfig, token: Option<String>) -> SecretConfig {
    if let Some(access_token) = token.filter(|t| !t.trim().is_empty()) {
        secrets.google_sheets = Some(GoogleSheetsSecret { access_token });
    }
    secrets
}
