//! Conversational collection of daily fuel-station reports.
//!
//! An operator is walked through a fixed sequence of prompts (date, operator,
//! air temperature, comments, then one sales block per fuel type) and the
//! finished [`report::Report`] is appended as a spreadsheet row.
//!
//! The crate holds the domain only. Chat transport and storage are reached
//! through the [`conversation::Messenger`] and [`report::ReportSink`] traits.

pub mod calendar;
pub mod config;
pub mod conversation;
pub mod error;
pub mod report;
pub mod session;
pub mod validate;

pub use error::{PersistError, ReportError, Result};
