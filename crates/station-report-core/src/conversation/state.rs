//! Conversation states and the field menus used by correction detours.

use crate::report::FuelType;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

/// A segment of the report confirmed as a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Header,
    Fuel(FuelType),
}

/// Header fields offered by the correction menu. The display string is the
/// button label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, EnumString)]
pub enum HeaderField {
    #[strum(serialize = "Дата")]
    Date,
    #[strum(serialize = "Оператор")]
    Operator,
    #[strum(serialize = "Температура")]
    Temperature,
    #[strum(serialize = "Комментарий")]
    Comments,
}

/// Fuel block fields offered by the correction menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, EnumString)]
pub enum BlockField {
    #[strum(serialize = "Счётчик")]
    Counter,
    #[strum(serialize = "Наличные")]
    Cash,
    #[strum(serialize = "Карты")]
    Card,
    #[strum(serialize = "Итого")]
    Total,
    #[strum(serialize = "Должники")]
    Debtors,
}

impl HeaderField {
    pub fn labels() -> Vec<String> {
        Self::iter().map(|f| f.to_string()).collect()
    }

    /// State that collects this field.
    pub fn state(self) -> ConversationState {
        match self {
            HeaderField::Date => ConversationState::AwaitingDate,
            HeaderField::Operator => ConversationState::AwaitingOperator,
            HeaderField::Temperature => ConversationState::AwaitingTemperature,
            HeaderField::Comments => ConversationState::AwaitingComments,
        }
    }
}

impl BlockField {
    pub fn labels() -> Vec<String> {
        Self::iter().map(|f| f.to_string()).collect()
    }

    /// State that collects this field for `fuel`.
    pub fn state(self, fuel: FuelType) -> ConversationState {
        match self {
            BlockField::Counter => ConversationState::AwaitingCounter(fuel),
            BlockField::Cash => ConversationState::AwaitingCash(fuel),
            BlockField::Card => ConversationState::AwaitingCard(fuel),
            BlockField::Total => ConversationState::AwaitingTotal(fuel),
            BlockField::Debtors => ConversationState::AwaitingDebtChoice(fuel),
        }
    }
}

/// Which input the session expects next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationState {
    Idle,

    AwaitingDate,
    AwaitingOperator,
    AwaitingTemperature,
    AwaitingComments,
    ConfirmingHeader,
    ChoosingHeaderCorrection,

    AwaitingCounter(FuelType),
    AwaitingCash(FuelType),
    AwaitingCard(FuelType),
    /// Derived total shown for acceptance.
    ConfirmingTotal(FuelType),
    /// Operator types the total by hand.
    AwaitingTotal(FuelType),
    AwaitingDebtChoice(FuelType),
    AwaitingContractor(FuelType),
    AwaitingVolume(FuelType),
    AwaitingMoreDebts(FuelType),
    ConfirmingBlock(FuelType),
    ChoosingBlockCorrection(FuelType),

    /// Report assembled and handed to persistence; stays here until the
    /// write succeeds or the session is stopped.
    Committed,
}

impl ConversationState {
    /// The stage this state belongs to; `None` for `Idle` and `Committed`.
    pub fn stage(self) -> Option<Stage> {
        use ConversationState::*;
        match self {
            Idle | Committed => None,
            AwaitingDate | AwaitingOperator | AwaitingTemperature | AwaitingComments
            | ConfirmingHeader | ChoosingHeaderCorrection => Some(Stage::Header),
            AwaitingCounter(f) | AwaitingCash(f) | AwaitingCard(f) | ConfirmingTotal(f)
            | AwaitingTotal(f) | AwaitingDebtChoice(f) | AwaitingContractor(f)
            | AwaitingVolume(f) | AwaitingMoreDebts(f) | ConfirmingBlock(f)
            | ChoosingBlockCorrection(f) => Some(Stage::Fuel(f)),
        }
    }
}
