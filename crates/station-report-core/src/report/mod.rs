//! Report domain module.
//!
//! - `model`: the finished `Report` and the in-progress `ReportDraft`
//! - `row`: positional spreadsheet row layout
//! - `summary`: human-readable renderings shown during confirmation
//! - `sink`: persistence collaborator interface

mod model;
mod row;
mod sink;
pub mod summary;

pub use model::{
    DebtEntry, FuelBlock, FuelBlockDraft, FuelType, NO_COMMENTS, NO_DEBTOR, Report, ReportDraft,
};
pub use row::{DEBTOR_SLOTS, ROW_WIDTH, debtor_cell, report_row};
pub use sink::ReportSink;
