//! Spreadsheet row layout.
//!
//! ```text
//! date | operator | temperature | comments |
//!   [counter | cash | card | total | debtor1..debtor5] x (АИ-92, ДТ)
//! ```

use super::model::{DebtEntry, FuelBlock, FuelType, Report};

/// Debtor columns per fuel block. Extra entries are not written.
pub const DEBTOR_SLOTS: usize = 5;

const HEADER_COLUMNS: usize = 4;
const BLOCK_COLUMNS: usize = 4 + DEBTOR_SLOTS;

/// Total number of cells in a report row.
pub const ROW_WIDTH: usize = HEADER_COLUMNS + BLOCK_COLUMNS * FuelType::ALL.len();

/// Formats a debtor as `<contractor> - <volume> л.`; the no-debt sentinel is
/// written as an empty cell.
pub fn debtor_cell(entry: &DebtEntry) -> String {
    if entry.is_sentinel() {
        String::new()
    } else {
        format!("{} - {} л.", entry.contractor, entry.volume)
    }
}

/// Builds the fixed-width row persisted for `report`.
pub fn report_row(report: &Report) -> Vec<String> {
    let mut row = Vec::with_capacity(ROW_WIDTH);
    row.push(report.date.format("%d.%m.%Y").to_string());
    row.push(report.operator.clone());
    row.push(report.temperature.to_string());
    row.push(report.comments.clone());
    for fuel in FuelType::ALL {
        push_block(&mut row, report.block(fuel));
    }
    row
}

fn push_block(row: &mut Vec<String>, block: &FuelBlock) {
    row.push(block.counter_reading.to_string());
    row.push(block.sold_cash.to_string());
    row.push(block.sold_card.to_string());
    row.push(block.total_sold.to_string());
    let mut cells: Vec<String> = block
        .debtors
        .iter()
        .take(DEBTOR_SLOTS)
        .map(debtor_cell)
        .collect();
    cells.resize(DEBTOR_SLOTS, String::new());
    row.extend(cells);
}
