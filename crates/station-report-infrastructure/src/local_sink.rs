//! Local backend: rows appended to a JSON-lines file.
//!
//! Each line is the JSON array of the row's cells, in sheet column order.

use async_trait::async_trait;
use station_report_core::PersistError;
use station_report_core::report::{Report, ReportSink, report_row};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

#[derive(Debug, Clone)]
pub struct LocalSheetSink {
    path: PathBuf,
}

impl LocalSheetSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn append_line(&self, line: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.write_all(b"\n").await?;
        file.flush().await
    }
}

#[async_trait]
impl ReportSink for LocalSheetSink {
    async fn append_report_row(&self, report: &Report) -> Result<(), PersistError> {
        let line = serde_json::to_string(&report_row(report))
            .map_err(|e| PersistError::permanent(e.to_string()))?;
        self.append_line(&line).await.map_err(|e| {
            PersistError::permanent(format!("{}: {e}", self.path.display()))
        })?;
        tracing::debug!(path = %self.path.display(), date = %report.date, "row appended to local sheet");
        Ok(())
    }
}
