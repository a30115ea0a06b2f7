//! Field validators.
//!
//! Each validator returns `None` for unacceptable input; the conversation
//! answers that by repeating the prompt.

use crate::report::NO_COMMENTS;
use chrono::NaiveDate;

/// Keyword an operator sends to skip the comment.
pub const NO_COMMENTS_KEYWORD: &str = "нет";

/// Typed date format, `ДД.ММ.ГГГГ`.
pub const DATE_FORMAT: &str = "%d.%m.%Y";

/// Operator and contractor names: letters only, at least one.
pub fn parse_name(input: &str) -> Option<String> {
    let name = input.trim();
    if !name.is_empty() && name.chars().all(char::is_alphabetic) {
        Some(name.to_string())
    } else {
        None
    }
}

/// Accepts a preset verbatim, otherwise falls back to [`parse_name`].
pub fn parse_name_or_preset(input: &str, presets: &[String]) -> Option<String> {
    let trimmed = input.trim();
    if presets.iter().any(|p| p == trimmed) {
        return Some(trimmed.to_string());
    }
    parse_name(trimmed)
}

/// Air temperature; a comma works as the decimal separator.
pub fn parse_temperature(input: &str) -> Option<f64> {
    let normalized = input.trim().replace(',', ".");
    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Liters: a non-negative integer literal made of ASCII digits only.
pub fn parse_liters(input: &str) -> Option<u64> {
    let digits = input.trim();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Free text; the case-insensitive "none" keyword maps to the fixed sentinel.
pub fn parse_comments(input: &str) -> String {
    let text = input.trim();
    if text.to_lowercase() == NO_COMMENTS_KEYWORD {
        NO_COMMENTS.to_string()
    } else {
        text.to_string()
    }
}

/// A date typed as `ДД.ММ.ГГГГ`.
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), DATE_FORMAT).ok()
}
