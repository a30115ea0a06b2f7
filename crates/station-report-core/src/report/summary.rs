//! Text renderings of collected data, shown at each confirmation step and
//! after a successful submission.

use super::model::{DebtEntry, FuelBlockDraft, FuelType, Report, ReportDraft};
use std::fmt::Display;

const MISSING: &str = "—";

fn or_missing<T: Display>(value: Option<T>) -> String {
    value.map_or_else(|| MISSING.to_string(), |v| v.to_string())
}

fn debtor_line(entry: &DebtEntry) -> String {
    if entry.is_sentinel() {
        "нет".to_string()
    } else {
        format!("{} - {} л.", entry.contractor, entry.volume)
    }
}

fn debtor_lines(debtors: &[DebtEntry]) -> String {
    if debtors.is_empty() {
        return MISSING.to_string();
    }
    debtors
        .iter()
        .map(debtor_line)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Header fields: date, operator, temperature, comments.
pub fn header_summary(draft: &ReportDraft) -> String {
    format!(
        "Дата: {}\nОператор: {}\nТемпература воздуха: {}\nКомментарий: {}",
        or_missing(draft.date.map(|d| d.format("%d.%m.%Y"))),
        or_missing(draft.operator.as_deref()),
        or_missing(draft.temperature),
        or_missing(draft.comments.as_deref()),
    )
}

/// One fuel block as collected so far.
pub fn block_summary(fuel: FuelType, block: &FuelBlockDraft) -> String {
    let total_note = if block.total_overridden {
        " (введено вручную)"
    } else {
        ""
    };
    format!(
        "{fuel}\nСчётчик: {} л.\nПродано за наличные: {} л.\nПродано по картам: {} л.\nВсего продано: {} л.{total_note}\nДолжники: {}",
        or_missing(block.counter_reading),
        or_missing(block.sold_cash),
        or_missing(block.sold_card),
        or_missing(block.total_sold),
        debtor_lines(&block.debtors),
    )
}

/// The whole submitted report.
pub fn report_summary(report: &Report) -> String {
    let mut out = format!(
        "Дата: {}\nОператор: {}\nТемпература воздуха: {}\nКомментарий: {}",
        report.date.format("%d.%m.%Y"),
        report.operator,
        report.temperature,
        report.comments,
    );
    for block in &report.blocks {
        out.push_str(&format!(
            "\n\n{}\nСчётчик: {} л.\nНаличные: {} л.\nКарты: {} л.\nВсего: {} л.\nДолжники: {}",
            block.fuel,
            block.counter_reading,
            block.sold_cash,
            block.sold_card,
            block.total_sold,
            debtor_lines(&block.debtors),
        ));
    }
    out
}
