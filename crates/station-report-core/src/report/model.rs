//! Report domain model.
//!
//! `Report` is the finished record handed to persistence. While the
//! conversation is still running, fields accumulate in a `ReportDraft`.

use crate::error::{ReportError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

/// Contractor name recorded when a block had no credit sales.
pub const NO_DEBTOR: &str = "None";

/// Comment stored when the operator answers the "none" keyword.
pub const NO_COMMENTS: &str = "Без комментариев";

/// Fuel types covered by a report, in the order their blocks are collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
pub enum FuelType {
    #[strum(serialize = "АИ-92")]
    Ai92,
    #[strum(serialize = "ДТ")]
    Dt,
}

impl FuelType {
    pub const ALL: [FuelType; 2] = [FuelType::Ai92, FuelType::Dt];

    /// Stable tag used in logs and persisted data.
    pub fn tag(self) -> &'static str {
        match self {
            FuelType::Ai92 => "AI92",
            FuelType::Dt => "DT",
        }
    }

    /// The block collected after this one, if any.
    pub fn next(self) -> Option<FuelType> {
        match self {
            FuelType::Ai92 => Some(FuelType::Dt),
            FuelType::Dt => None,
        }
    }
}

/// One credit sale: fuel handed to a contractor to be paid later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebtEntry {
    pub contractor: String,
    /// Liters.
    pub volume: u64,
}

impl DebtEntry {
    pub fn new(contractor: impl Into<String>, volume: u64) -> Self {
        Self {
            contractor: contractor.into(),
            volume,
        }
    }

    /// Placeholder recorded when no credit sales occurred.
    pub fn none() -> Self {
        Self::new(NO_DEBTOR, 0)
    }

    pub fn is_sentinel(&self) -> bool {
        self.contractor == NO_DEBTOR && self.volume == 0
    }
}

/// Sales figures for one fuel type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuelBlock {
    pub fuel: FuelType,
    /// Pump counter reading, liters.
    pub counter_reading: u64,
    pub sold_cash: u64,
    pub sold_card: u64,
    /// Normally `sold_cash + sold_card` unless the operator overrode it.
    pub total_sold: u64,
    /// Never empty: holds the sentinel entry when there were no credit sales.
    pub debtors: Vec<DebtEntry>,
}

/// A complete daily report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub date: NaiveDate,
    pub operator: String,
    pub temperature: f64,
    pub comments: String,
    pub blocks: [FuelBlock; 2],
}

impl Report {
    pub fn block(&self, fuel: FuelType) -> &FuelBlock {
        match fuel {
            FuelType::Ai92 => &self.blocks[0],
            FuelType::Dt => &self.blocks[1],
        }
    }
}

/// Fuel block fields collected so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FuelBlockDraft {
    pub counter_reading: Option<u64>,
    pub sold_cash: Option<u64>,
    pub sold_card: Option<u64>,
    pub total_sold: Option<u64>,
    /// Set when the total was typed in rather than derived.
    pub total_overridden: bool,
    pub debtors: Vec<DebtEntry>,
    /// Contractor chosen for the debt entry whose volume is awaited.
    pub pending_contractor: Option<String>,
}

impl FuelBlockDraft {
    pub fn set_counter(&mut self, liters: u64) {
        self.counter_reading = Some(liters);
    }

    /// Cash edits re-derive the total, dropping any manual override.
    pub fn set_cash(&mut self, liters: u64) {
        self.sold_cash = Some(liters);
        self.recompute_total();
    }

    /// Card edits re-derive the total, dropping any manual override.
    pub fn set_card(&mut self, liters: u64) {
        self.sold_card = Some(liters);
        self.recompute_total();
    }

    /// Replaces the total with an operator-supplied figure. Sticky until the
    /// total, cash or card is edited again.
    pub fn override_total(&mut self, liters: u64) {
        self.total_sold = Some(liters);
        self.total_overridden = true;
    }

    fn recompute_total(&mut self) {
        if let (Some(cash), Some(card)) = (self.sold_cash, self.sold_card) {
            self.total_sold = Some(cash.saturating_add(card));
            self.total_overridden = false;
        }
    }

    /// Starts the credit ledger from scratch.
    pub fn open_ledger(&mut self) {
        self.debtors.clear();
        self.pending_contractor = None;
    }

    pub fn choose_contractor(&mut self, name: impl Into<String>) {
        self.pending_contractor = Some(name.into());
    }

    /// Records the volume for the pending contractor. Returns `false` when no
    /// contractor was chosen first.
    pub fn record_volume(&mut self, liters: u64) -> bool {
        match self.pending_contractor.take() {
            Some(contractor) => {
                self.debtors.push(DebtEntry::new(contractor, liters));
                true
            }
            None => false,
        }
    }

    /// Ends the ledger, inserting the sentinel when nothing was recorded.
    pub fn close_ledger(&mut self) {
        self.pending_contractor = None;
        if self.debtors.is_empty() {
            self.debtors.push(DebtEntry::none());
        }
    }

    pub fn build(&self, fuel: FuelType) -> Result<FuelBlock> {
        if self.debtors.is_empty() {
            return Err(ReportError::IncompleteReport("debtors"));
        }
        Ok(FuelBlock {
            fuel,
            counter_reading: self
                .counter_reading
                .ok_or(ReportError::IncompleteReport("counter reading"))?,
            sold_cash: self.sold_cash.ok_or(ReportError::IncompleteReport("cash"))?,
            sold_card: self.sold_card.ok_or(ReportError::IncompleteReport("card"))?,
            total_sold: self.total_sold.ok_or(ReportError::IncompleteReport("total"))?,
            debtors: self.debtors.clone(),
        })
    }
}

/// Report fields collected so far.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportDraft {
    pub date: Option<NaiveDate>,
    pub operator: Option<String>,
    pub temperature: Option<f64>,
    pub comments: Option<String>,
    ai92: FuelBlockDraft,
    dt: FuelBlockDraft,
}

impl ReportDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn block(&self, fuel: FuelType) -> &FuelBlockDraft {
        match fuel {
            FuelType::Ai92 => &self.ai92,
            FuelType::Dt => &self.dt,
        }
    }

    pub fn block_mut(&mut self, fuel: FuelType) -> &mut FuelBlockDraft {
        match fuel {
            FuelType::Ai92 => &mut self.ai92,
            FuelType::Dt => &mut self.dt,
        }
    }

    pub fn build(&self) -> Result<Report> {
        Ok(Report {
            date: self.date.ok_or(ReportError::IncompleteReport("date"))?,
            operator: self
                .operator
                .clone()
                .ok_or(ReportError::IncompleteReport("operator"))?,
            temperature: self
                .temperature
                .ok_or(ReportError::IncompleteReport("temperature"))?,
            comments: self
                .comments
                .clone()
                .ok_or(ReportError::IncompleteReport("comments"))?,
            blocks: [self.ai92.build(FuelType::Ai92)?, self.dt.build(FuelType::Dt)?],
        })
    }
}
