//! Outbound prompt and keyboard descriptions.
//!
//! These are transport-neutral: a messenger adapter decides how a reply
//! keyboard or an inline grid actually looks.

use serde::{Deserialize, Serialize};

/// Identifier the transport assigns to a sent message.
pub type MessageId = i64;

/// A button on an inline grid; pressing it delivers `payload`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineButton {
    pub label: String,
    pub payload: String,
}

impl InlineButton {
    pub fn new(label: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            payload: payload.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Keyboard {
    /// Quick replies; pressing one sends its label.
    Reply { buttons: Vec<String>, one_time: bool },
    /// Grid attached to the message itself (used by the calendar).
    Inline(Vec<Vec<InlineButton>>),
    /// Hide any reply keyboard still on screen.
    Remove,
}

impl Keyboard {
    pub fn one_time<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Keyboard::Reply {
            buttons: labels.into_iter().map(Into::into).collect(),
            one_time: true,
        }
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, Keyboard::Inline(_))
    }

    /// Finds the inline button carrying `label`.
    pub fn inline_button(&self, label: &str) -> Option<&InlineButton> {
        match self {
            Keyboard::Inline(rows) => rows.iter().flatten().find(|b| b.label == label),
            _ => None,
        }
    }
}

/// A message to show the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    pub text: String,
    pub keyboard: Option<Keyboard>,
}

impl Prompt {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
        }
    }

    pub fn with_keyboard(text: impl Into<String>, keyboard: Keyboard) -> Self {
        Self {
            text: text.into(),
            keyboard: Some(keyboard),
        }
    }

    /// Text with a one-time reply keyboard.
    pub fn with_buttons<I, S>(text: impl Into<String>, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_keyboard(text, Keyboard::one_time(labels))
    }

    pub fn is_inline(&self) -> bool {
        self.keyboard.as_ref().is_some_and(Keyboard::is_inline)
    }
}

/// Fixed button labels.
pub mod labels {
    pub const ACCEPT: &str = "Всё верно";
    pub const CORRECT: &str = "Исправить";
    pub const NOTHING_TO_CHANGE: &str = "Ничего не менять";

    pub const TOTAL_ACCEPT: &str = "Итог верный";
    pub const TOTAL_RETYPE: &str = "Ввести итог вручную";

    pub const YES: &str = "Да";
    pub const NO: &str = "Нет";
    pub const MORE_DEBTS: &str = "Добавить ещё";
    pub const NO_MORE_DEBTS: &str = "Больше нет";
}
