//! Filesystem and network adapters for station reports.
//!
//! - [`paths`]: per-user config and data locations
//! - [`config_service`]: `config.toml` and `secret.json` loading
//! - [`google_auth`]: service-account sign-in for the Sheets API
//! - [`sheets_sink`] / [`local_sink`]: [`ReportSink`] implementations
//!
//! [`ReportSink`]: station_report_core::report::ReportSink

pub mod config_service;
pub mod google_auth;
pub mod local_sink;
pub mod paths;
pub mod sheets_sink;
#[cfg(test)]
mod test_http;

pub use config_service::{ConfigService, SHEETS_TOKEN_ENV, SecretService};
pub use google_auth::{ServiceAccountAuth, ServiceAccountKey, SheetsAuth};
pub use local_sink::LocalSheetSink;
pub use paths::{PathError, StationPaths};
pub use sheets_sink::GoogleSheetsSink;

use anyhow::{Context, Result};
use station_report_core::config::{AppConfig, PersistenceBackend, SecretConfig, SheetsConfig};
use station_report_core::report::ReportSink;
use std::sync::Arc;

/// Builds the sink selected by `config.persistence.backend`.
pub fn open_sink(config: &AppConfig, secrets: &SecretConfig) -> Result<Arc<dyn ReportSink>> {
    let persistence = &config.persistence;
    match persistence.backend {
        PersistenceBackend::Sheets => {
            let auth = sheets_auth(&persistence.sheets, secrets)?;
            let sink = GoogleSheetsSink::new(&persistence.sheets, auth, persistence.timeout())?;
            tracing::info!(
                spreadsheet_id = %persistence.sheets.spreadsheet_id,
                range = %persistence.sheets.range,
                "using Google Sheets sink"
            );
            Ok(Arc::new(sink))
        }
        PersistenceBackend::Local => {
            let path = match &persistence.local.path {
                Some(path) => path.clone(),
                None => StationPaths::reports_file()?,
            };
            tracing::info!(path = %path.display(), "using local sheet sink");
            Ok(Arc::new(LocalSheetSink::new(path)))
        }
    }
}

/// A pre-minted token wins; otherwise sign in with the service-account key.
fn sheets_auth(sheets: &SheetsConfig, secrets: &SecretConfig) -> Result<SheetsAuth> {
    let token = secrets
        .google_sheets
        .as_ref()
        .map(|s| s.access_token.clone())
        .filter(|t| !t.is_empty());
    if let Some(token) = token {
        tracing::info!("using pre-minted Sheets access token");
        return Ok(SheetsAuth::Static(token));
    }

    let path = match &sheets.credentials {
        Some(path) => path.clone(),
        None => StationPaths::credentials_file()?,
    };
    if !path.exists() {
        anyhow::bail!(
            "Google Sheets credentials missing: no service-account key at {} and no access token (secret.json or {SHEETS_TOKEN_ENV})",
            path.display()
        );
    }
    let key = ServiceAccountKey::from_file(&path)?;
    let auth = ServiceAccountAuth::new(key)
        .with_context(|| format!("Unusable service-account key {}", path.display()))?;
    tracing::info!(client_email = %auth.client_email(), "signing in with service account");
    Ok(SheetsAuth::ServiceAccount(auth))
}
