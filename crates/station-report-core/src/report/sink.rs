//! Persistence collaborator interface.

use super::model::Report;
use crate::error::PersistError;
use async_trait::async_trait;

/// Appends finished reports to external storage (a spreadsheet, a file).
///
/// Implementations perform exactly one write per call. Retries and timeouts
/// are the caller's concern; a fault the caller may retry must be reported
/// as [`PersistError::TransientApiFault`].
#[async_trait]
pub trait ReportSink: Send + Sync {
    /// Appends one row for `report`.
    async fn append_report_row(&self, report: &Report) -> Result<(), PersistError>;
}
