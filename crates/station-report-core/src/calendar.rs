//! Month-grid date picker.
//!
//! The grid is an inline keyboard: a navigation row, a weekday header and one
//! row per week (Monday first), padded with blank cells before day 1 and
//! after the last day. Every button carries a [`CalendarAction`] payload.

use crate::conversation::keyboard::{InlineButton, Keyboard};
use chrono::{Datelike, NaiveDate};

const PREFIX: &str = "cal";
const WEEKDAYS: [&str; 7] = ["Пн", "Вт", "Ср", "Чт", "Пт", "Сб", "Вс"];
const MONTHS: [&str; 12] = [
    "Январь", "Февраль", "Март", "Апрель", "Май", "Июнь", "Июль", "Август", "Сентябрь",
    "Октябрь", "Ноябрь", "Декабрь",
];

/// What a calendar button press asks for.
///
/// Navigation variants carry the month currently on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarAction {
    PrevMonth { year: i32, month: u32 },
    NextMonth { year: i32, month: u32 },
    Select(NaiveDate),
    /// Header, title and filler cells.
    Ignore,
}

impl CalendarAction {
    pub fn payload(&self) -> String {
        match self {
            CalendarAction::PrevMonth { year, month } => format!("{PREFIX};prev;{year};{month}"),
            CalendarAction::NextMonth { year, month } => format!("{PREFIX};next;{year};{month}"),
            CalendarAction::Select(date) => format!(
                "{PREFIX};day;{};{};{}",
                date.year(),
                date.month(),
                date.day()
            ),
            CalendarAction::Ignore => format!("{PREFIX};ignore"),
        }
    }

    /// Decodes a button payload; `None` for anything that is not a calendar
    /// payload or names an impossible date.
    pub fn parse(payload: &str) -> Option<Self> {
        let mut parts = payload.split(';');
        if parts.next()? != PREFIX {
            return None;
        }
        let kind = parts.next()?;
        if kind == "ignore" {
            return Some(CalendarAction::Ignore);
        }
        let year: i32 = parts.next()?.parse().ok()?;
        let month: u32 = parts.next()?.parse().ok()?;
        // the month on screen must itself be a representable calendar month
        NaiveDate::from_ymd_opt(year, month, 1)?;
        let action = match kind {
            "prev" => CalendarAction::PrevMonth { year, month },
            "next" => CalendarAction::NextMonth { year, month },
            "day" => {
                let day: u32 = parts.next()?.parse().ok()?;
                CalendarAction::Select(NaiveDate::from_ymd_opt(year, month, day)?)
            }
            _ => return None,
        };
        if parts.next().is_some() {
            return None;
        }
        Some(action)
    }
}

/// Moves `delta` months from (`year`, `month`), wrapping across years.
///
/// `None` when the result falls outside the range `NaiveDate` can represent.
pub fn shift_month(year: i32, month: u32, delta: i32) -> Option<(i32, u32)> {
    let month_index = i32::try_from(month).ok()?.checked_sub(1)?;
    let index = year
        .checked_mul(12)?
        .checked_add(month_index)?
        .checked_add(delta)?;
    let shifted = (index.div_euclid(12), (index.rem_euclid(12) + 1) as u32);
    NaiveDate::from_ymd_opt(shifted.0, shifted.1, 1).map(|_| shifted)
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    shift_month(year, month, 1)
        .and_then(|(next_year, next_month)| NaiveDate::from_ymd_opt(next_year, next_month, 1))
        .and_then(|first| first.pred_opt())
        .map_or(31, |last| last.day())
}

fn ignore(label: impl Into<String>) -> InlineButton {
    InlineButton::new(label, CalendarAction::Ignore.payload())
}

/// Renders the picker for (`year`, `month`).
pub fn month_grid(year: i32, month: u32) -> Keyboard {
    let title = format!("{} {}", MONTHS[(month as usize - 1) % 12], year);
    let mut rows = vec![
        vec![
            InlineButton::new("<", CalendarAction::PrevMonth { year, month }.payload()),
            ignore(title),
            InlineButton::new(">", CalendarAction::NextMonth { year, month }.payload()),
        ],
        WEEKDAYS.iter().map(|d| ignore(*d)).collect(),
    ];

    let lead = NaiveDate::from_ymd_opt(year, month, 1)
        .map_or(0, |first| first.weekday().num_days_from_monday() as usize);
    let mut week: Vec<InlineButton> = (0..lead).map(|_| ignore(" ")).collect();

    for day in 1..=days_in_month(year, month) {
        let Some(date) = NaiveDate::from_ymd_opt(year, month, day) else {
            continue;
        };
        week.push(InlineButton::new(
            day.to_string(),
            CalendarAction::Select(date).payload(),
        ));
        if week.len() == 7 {
            rows.push(std::mem::take(&mut week));
        }
    }
    if !week.is_empty() {
        week.resize_with(7, || ignore(" "));
        rows.push(week);
    }

    Keyboard::Inline(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(keyboard: Keyboard) -> Vec<Vec<InlineButton>> {
        match keyboard {
            Keyboard::Inline(rows) => rows,
            other => panic!("expected inline keyboard, got {other:?}"),
        }
    }

    #[test]
    fn test_shift_month_wraps_years() {
        assert_eq!(shift_month(2024, 12, 1), Some((2025, 1)));
        assert_eq!(shift_month(2024, 1, -1), Some((2023, 12)));
        assert_eq!(shift_month(2024, 6, 1), Some((2024, 7)));
        assert_eq!(shift_month(2024, 6, -1), Some((2024, 5)));
        assert_eq!(shift_month(2024, 1, -13), Some((2022, 12)));
    }

    #[test]
    fn test_shift_month_out_of_range() {
        assert_eq!(shift_month(i32::MAX, 12, 1), None);
        assert_eq!(shift_month(i32::MIN, 1, -1), None);
        let last = NaiveDate::MAX;
        assert_eq!(shift_month(last.year(), last.month(), 1), None);
        assert_eq!(shift_month(2024, 0, 1), None);
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(2024, 12), 31);
        assert_eq!(days_in_month(2024, 4), 30);
    }

    #[test]
    fn test_payload_roundtrip_and_rejects() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        for action in [
            CalendarAction::PrevMonth { year: 2024, month: 1 },
            CalendarAction::NextMonth { year: 2024, month: 12 },
            CalendarAction::Select(date),
            CalendarAction::Ignore,
        ] {
            assert_eq!(CalendarAction::parse(&action.payload()), Some(action));
        }
        assert_eq!(CalendarAction::parse("cal;day;2024;2;30"), None);
        assert_eq!(CalendarAction::parse("cal;next;2024;13"), None);
        assert_eq!(CalendarAction::parse("cal;next;2147483647;12"), None);
        assert_eq!(CalendarAction::parse("cal;prev;-2147483648;1"), None);
        assert_eq!(CalendarAction::parse("Всё верно"), None);
    }

    #[test]
    fn test_grid_layout_march_2024() {
        // 1 March 2024 is a Friday
        let rows = rows(month_grid(2024, 3));
        assert_eq!(rows[0][1].label, "Март 2024");
        assert_eq!(rows[1].len(), 7);
        assert_eq!(rows[1][0].label, "Пн");

        let first_week = &rows[2];
        assert_eq!(first_week.len(), 7);
        assert!(first_week[..4].iter().all(|b| b.label == " "));
        assert_eq!(first_week[4].label, "1");
        assert_eq!(
            CalendarAction::parse(&first_week[4].payload),
            Some(CalendarAction::Select(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()))
        );

        let last_week = rows.last().unwrap();
        assert_eq!(last_week.len(), 7);
        // 31 March 2024 is a Sunday: no trailing filler
        assert_eq!(last_week[6].label, "31");

        let days: usize = rows[2..]
            .iter()
            .flatten()
            .filter(|b| b.label != " ")
            .count();
        assert_eq!(days, 31);
    }

    #[test]
    fn test_grid_pads_after_last_day() {
        // 30 April 2024 is a Tuesday
        let rows = rows(month_grid(2024, 4));
        let last_week = rows.last().unwrap();
        assert_eq!(last_week[1].label, "30");
        assert!(last_week[2..].iter().all(|b| b.label == " "));
        assert!(
            last_week[2..]
                .iter()
                .all(|b| CalendarAction::parse(&b.payload) == Some(CalendarAction::Ignore))
        );
    }
}
