//! Configuration model.
//!
//! Every field carries a serde default so a missing or partial `config.toml`
//! still yields a usable configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root of `config.toml`.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub presets: Presets,
    #[serde(default)]
    pub persistence: PersistenceConfig,
}

/// Button presets offered by the conversation.
///
/// Loaded once and shared read-only with every session.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Presets {
    #[serde(default = "default_operators")]
    pub operators: Vec<String>,
    #[serde(default = "default_contractors")]
    pub contractors: Vec<String>,
}

impl Default for Presets {
    fn default() -> Self {
        Self {
            operators: default_operators(),
            contractors: default_contractors(),
        }
    }
}

fn default_operators() -> Vec<String> {
    ["Иванова", "Петрова", "Сидорова"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_contractors() -> Vec<String> {
    ["Агрохолдинг", "Автобаза", "Стройтрест"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Which persistence adapter receives committed reports.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PersistenceBackend {
    #[default]
    Sheets,
    Local,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct PersistenceConfig {
    #[serde(default)]
    pub backend: PersistenceBackend,
    /// Upper bound for a single append attempt.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub sheets: SheetsConfig,
    #[serde(default)]
    pub local: LocalConfig,
}

impl PersistenceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            backend: PersistenceBackend::default(),
            timeout_secs: default_timeout_secs(),
            sheets: SheetsConfig::default(),
            local: LocalConfig::default(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    10
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SheetsConfig {
    #[serde(default)]
    pub spreadsheet_id: String,
    /// A1 range whose table the row is appended to.
    #[serde(default = "default_range")]
    pub range: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Service-account key file; `None` means `credentials.json` next to
    /// `config.toml`.
    #[serde(default)]
    pub credentials: Option<PathBuf>,
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            spreadsheet_id: String::new(),
            range: default_range(),
            api_base: default_api_base(),
            credentials: None,
        }
    }
}

fn default_range() -> String {
    "Лист1!A1".to_string()
}

fn default_api_base() -> String {
    "https://sheets.googleapis.com".to_string()
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct LocalConfig {
    /// Output file; `None` means the platform data directory.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Contents of `secret.json`. Never logged.
///
/// A token here (or in the environment) overrides service-account sign-in.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct SecretConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_sheets: Option<GoogleSheetsSecret>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct GoogleSheetsSecret {
    pub access_token: String,
}
