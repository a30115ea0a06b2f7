//! The report conversation state machine.
//!
//! `ReportMachine` is synchronous and does no I/O: every call consumes one
//! inbound input and returns the [`Effect`]s the dispatcher must carry out.
//! Commands are stripped by the dispatcher before input reaches `handle`.

use super::keyboard::{Keyboard, MessageId, Prompt, labels};
use super::state::{BlockField, ConversationState, HeaderField, Stage};
use crate::calendar::{self, CalendarAction};
use crate::config::Presets;
use crate::report::summary::{block_summary, header_summary};
use crate::report::{FuelType, Report, ReportDraft};
use crate::validate;
use chrono::{Datelike, NaiveDate};
use std::str::FromStr;
use std::sync::Arc;

/// One inbound event for the active state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input<'a> {
    Text(&'a str),
    /// Button payload: a menu label or an inline (calendar) payload.
    Button(&'a str),
}

/// Outbound work produced by a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Send(Prompt),
    EditKeyboard {
        message_id: MessageId,
        keyboard: Keyboard,
    },
    Delete {
        message_id: MessageId,
    },
    /// Persist the finished report.
    Commit(Report),
}

/// Calendar currently on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CalendarView {
    year: i32,
    month: u32,
    message_id: Option<MessageId>,
}

const INVALID_INPUT: &str = "Некорректное значение, попробуйте ещё раз.";

pub struct ReportMachine {
    state: ConversationState,
    draft: ReportDraft,
    /// Stage whose confirmation the current correction detour returns to.
    detour: Option<Stage>,
    calendar: Option<CalendarView>,
    presets: Arc<Presets>,
    today: NaiveDate,
}

impl ReportMachine {
    /// `today` seeds the month first shown by the date picker.
    pub fn new(presets: Arc<Presets>, today: NaiveDate) -> Self {
        Self {
            state: ConversationState::Idle,
            draft: ReportDraft::new(),
            detour: None,
            calendar: None,
            presets,
            today,
        }
    }

    pub fn state(&self) -> ConversationState {
        self.state
    }

    pub fn draft(&self) -> &ReportDraft {
        &self.draft
    }

    pub fn detour(&self) -> Option<Stage> {
        self.detour
    }

    /// Begins a fresh report.
    pub fn start(&mut self) -> Vec<Effect> {
        self.draft = ReportDraft::new();
        self.detour = None;
        let mut effects = self.drop_calendar();
        effects.push(Effect::Send(Prompt::with_keyboard(
            "Добро пожаловать! Давайте заполним отчёт АЗС.",
            Keyboard::Remove,
        )));
        effects.extend(self.enter(ConversationState::AwaitingDate));
        effects
    }

    /// Records the transport id of the calendar message just sent.
    pub fn calendar_sent(&mut self, message_id: MessageId) {
        if let Some(view) = self.calendar.as_mut() {
            view.message_id = Some(message_id);
        }
    }

    /// The report awaiting persistence, if the machine is in `Committed`.
    pub fn pending_report(&self) -> Option<Report> {
        match self.state {
            ConversationState::Committed => self.draft.build().ok(),
            _ => None,
        }
    }

    /// The prompt that asks for the input the current state expects.
    pub fn current_prompt(&self) -> Prompt {
        self.prompt()
    }

    pub fn handle(&mut self, input: Input<'_>) -> Vec<Effect> {
        let text = match input {
            Input::Button(payload) => match CalendarAction::parse(payload) {
                Some(action) => return self.handle_calendar(action),
                None => payload.trim(),
            },
            Input::Text(text) => text.trim(),
        };

        use ConversationState::*;
        match self.state {
            Idle => vec![Effect::Send(Prompt::text(
                "Отправьте /start, чтобы начать отчёт.",
            ))],
            AwaitingDate => match validate::parse_date(text) {
                Some(date) => self.accept_date(date),
                None => vec![Effect::Send(Prompt::text(
                    "Выберите дату в календаре или введите её в формате ДД.ММ.ГГГГ.",
                ))],
            },
            AwaitingOperator => {
                match validate::parse_name_or_preset(text, &self.presets.operators) {
                    Some(name) => {
                        self.draft.operator = Some(name);
                        self.after_header_field(AwaitingTemperature)
                    }
                    None => self.reprompt(),
                }
            }
            AwaitingTemperature => match validate::parse_temperature(text) {
                Some(value) => {
                    self.draft.temperature = Some(value);
                    self.after_header_field(AwaitingComments)
                }
                None => self.reprompt(),
            },
            AwaitingComments => {
                self.draft.comments = Some(validate::parse_comments(text));
                self.after_header_field(ConfirmingHeader)
            }
            ConfirmingHeader => match text {
                labels::ACCEPT => self.accept_stage(Stage::Header),
                labels::CORRECT => self.enter(ChoosingHeaderCorrection),
                _ => self.reprompt(),
            },
            ChoosingHeaderCorrection => {
                if text == labels::NOTHING_TO_CHANGE {
                    return self.accept_stage(Stage::Header);
                }
                match HeaderField::from_str(text) {
                    Ok(field) => {
                        self.detour = Some(Stage::Header);
                        self.enter(field.state())
                    }
                    Err(_) => self.reprompt(),
                }
            }
            AwaitingCounter(fuel) => self.with_liters(text, |m, liters| {
                m.draft.block_mut(fuel).set_counter(liters);
                m.after_block_field(fuel, AwaitingCash(fuel))
            }),
            AwaitingCash(fuel) => self.with_liters(text, |m, liters| {
                m.draft.block_mut(fuel).set_cash(liters);
                m.after_block_field(fuel, AwaitingCard(fuel))
            }),
            AwaitingCard(fuel) => self.with_liters(text, |m, liters| {
                m.draft.block_mut(fuel).set_card(liters);
                m.enter(ConfirmingTotal(fuel))
            }),
            ConfirmingTotal(fuel) => match text {
                labels::TOTAL_ACCEPT => self.after_block_field(fuel, AwaitingDebtChoice(fuel)),
                labels::TOTAL_RETYPE => self.enter(AwaitingTotal(fuel)),
                _ => self.reprompt(),
            },
            AwaitingTotal(fuel) => self.with_liters(text, |m, liters| {
                m.draft.block_mut(fuel).override_total(liters);
                m.after_block_field(fuel, AwaitingDebtChoice(fuel))
            }),
            AwaitingDebtChoice(fuel) => match text {
                labels::YES => {
                    self.draft.block_mut(fuel).open_ledger();
                    self.enter(AwaitingContractor(fuel))
                }
                labels::NO => {
                    self.draft.block_mut(fuel).open_ledger();
                    self.close_ledger(fuel)
                }
                _ => self.reprompt(),
            },
            AwaitingContractor(fuel) => {
                match validate::parse_name_or_preset(text, &self.presets.contractors) {
                    Some(name) => {
                        self.draft.block_mut(fuel).choose_contractor(name);
                        self.enter(AwaitingVolume(fuel))
                    }
                    None => self.reprompt(),
                }
            }
            AwaitingVolume(fuel) => self.with_liters(text, |m, liters| {
                if m.draft.block_mut(fuel).record_volume(liters) {
                    m.enter(AwaitingMoreDebts(fuel))
                } else {
                    m.enter(AwaitingContractor(fuel))
                }
            }),
            AwaitingMoreDebts(fuel) => match text {
                labels::MORE_DEBTS => self.enter(AwaitingContractor(fuel)),
                labels::NO_MORE_DEBTS => self.close_ledger(fuel),
                _ => self.reprompt(),
            },
            ConfirmingBlock(fuel) => match text {
                labels::ACCEPT => self.accept_stage(Stage::Fuel(fuel)),
                labels::CORRECT => self.enter(ChoosingBlockCorrection(fuel)),
                _ => self.reprompt(),
            },
            ChoosingBlockCorrection(fuel) => {
                if text == labels::NOTHING_TO_CHANGE {
                    return self.accept_stage(Stage::Fuel(fuel));
                }
                match BlockField::from_str(text) {
                    Ok(field) => {
                        self.detour = Some(Stage::Fuel(fuel));
                        self.enter(field.state(fuel))
                    }
                    Err(_) => self.reprompt(),
                }
            }
            Committed => vec![Effect::Send(Prompt::text(
                "Отчёт ожидает отправки. Отправьте /retry, чтобы повторить попытку, или /stop, чтобы отменить его.",
            ))],
        }
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    fn enter(&mut self, next: ConversationState) -> Vec<Effect> {
        tracing::debug!(from = ?self.state, to = ?next, "state transition");
        self.state = next;
        if next == ConversationState::AwaitingDate {
            let (year, month) = match self.draft.date {
                Some(date) => (date.year(), date.month()),
                None => (self.today.year(), self.today.month()),
            };
            let mut effects = self.drop_calendar();
            self.calendar = Some(CalendarView {
                year,
                month,
                message_id: None,
            });
            effects.push(Effect::Send(self.prompt()));
            return effects;
        }
        vec![Effect::Send(self.prompt())]
    }

    /// Same prompt again after bad input.
    fn reprompt(&self) -> Vec<Effect> {
        vec![
            Effect::Send(Prompt::text(INVALID_INPUT)),
            Effect::Send(self.prompt()),
        ]
    }

    fn with_liters(
        &mut self,
        text: &str,
        accept: impl FnOnce(&mut Self, u64) -> Vec<Effect>,
    ) -> Vec<Effect> {
        match validate::parse_liters(text) {
            Some(liters) => accept(self, liters),
            None => self.reprompt(),
        }
    }

    /// Continues the forward flow, or closes a header correction detour.
    fn after_header_field(&mut self, next: ConversationState) -> Vec<Effect> {
        if self.detour == Some(Stage::Header) {
            self.detour = None;
            return self.enter(ConversationState::ConfirmingHeader);
        }
        self.enter(next)
    }

    /// Continues the forward flow, or closes a block correction detour.
    fn after_block_field(&mut self, fuel: FuelType, next: ConversationState) -> Vec<Effect> {
        if self.detour == Some(Stage::Fuel(fuel)) {
            self.detour = None;
            return self.enter(ConversationState::ConfirmingBlock(fuel));
        }
        self.enter(next)
    }

    fn close_ledger(&mut self, fuel: FuelType) -> Vec<Effect> {
        self.draft.block_mut(fuel).close_ledger();
        self.detour = None;
        self.enter(ConversationState::ConfirmingBlock(fuel))
    }

    fn accept_stage(&mut self, stage: Stage) -> Vec<Effect> {
        self.detour = None;
        match stage {
            Stage::Header => self.enter(ConversationState::AwaitingCounter(FuelType::Ai92)),
            Stage::Fuel(fuel) => match fuel.next() {
                Some(next) => self.enter(ConversationState::AwaitingCounter(next)),
                None => self.commit(),
            },
        }
    }

    fn commit(&mut self) -> Vec<Effect> {
        match self.draft.build() {
            Ok(report) => {
                tracing::debug!(from = ?self.state, to = ?ConversationState::Committed, "state transition");
                self.state = ConversationState::Committed;
                vec![
                    Effect::Send(Prompt::with_keyboard(
                        "Отчёт заполнен, отправляю…",
                        Keyboard::Remove,
                    )),
                    Effect::Commit(report),
                ]
            }
            Err(e) => {
                tracing::error!(error = %e, "report incomplete at commit");
                vec![Effect::Send(Prompt::text(format!(
                    "Отчёт заполнен не полностью: {e}. Начните заново с /start."
                )))]
            }
        }
    }

    // ------------------------------------------------------------------
    // Date picker
    // ------------------------------------------------------------------

    fn handle_calendar(&mut self, action: CalendarAction) -> Vec<Effect> {
        if self.state != ConversationState::AwaitingDate {
            return Vec::new();
        }
        match action {
            CalendarAction::Ignore => Vec::new(),
            CalendarAction::PrevMonth { year, month } => self.show_month(year, month, -1),
            CalendarAction::NextMonth { year, month } => self.show_month(year, month, 1),
            CalendarAction::Select(date) => self.accept_date(date),
        }
    }

    fn show_month(&mut self, year: i32, month: u32, delta: i32) -> Vec<Effect> {
        let Some((year, month)) = calendar::shift_month(year, month, delta) else {
            return Vec::new();
        };
        let keyboard = calendar::month_grid(year, month);
        let message_id = self.calendar.and_then(|view| view.message_id);
        self.calendar = Some(CalendarView {
            year,
            month,
            message_id,
        });
        match message_id {
            Some(message_id) => vec![Effect::EditKeyboard {
                message_id,
                keyboard,
            }],
            None => vec![Effect::Send(self.prompt())],
        }
    }

    fn accept_date(&mut self, date: NaiveDate) -> Vec<Effect> {
        self.draft.date = Some(date);
        let mut effects = self.drop_calendar();
        effects.push(Effect::Send(Prompt::text(format!(
            "Дата отчёта: {}",
            date.format(validate::DATE_FORMAT)
        ))));
        effects.extend(self.after_header_field(ConversationState::AwaitingOperator));
        effects
    }

    fn drop_calendar(&mut self) -> Vec<Effect> {
        match self.calendar.take().and_then(|view| view.message_id) {
            Some(message_id) => vec![Effect::Delete { message_id }],
            None => Vec::new(),
        }
    }

    // ------------------------------------------------------------------
    // Prompts
    // ------------------------------------------------------------------

    /// Prompt for the current state.
    fn prompt(&self) -> Prompt {
        use ConversationState::*;
        match self.state {
            Idle => Prompt::text("Отправьте /start, чтобы начать отчёт."),
            AwaitingDate => {
                let (year, month) = self
                    .calendar
                    .map_or((self.today.year(), self.today.month()), |v| (v.year, v.month));
                Prompt::with_keyboard(
                    "Выберите дату отчёта или введите её в формате ДД.ММ.ГГГГ:",
                    calendar::month_grid(year, month),
                )
            }
            AwaitingOperator => {
                Prompt::with_buttons("Выберите оператора:", self.presets.operators.iter().cloned())
            }
            AwaitingTemperature => Prompt::with_keyboard(
                "Укажите температуру воздуха:",
                Keyboard::Remove,
            ),
            AwaitingComments => Prompt::text(
                "Добавьте комментарий (при необходимости) или отправьте \"нет\":",
            ),
            ConfirmingHeader => Prompt::with_buttons(
                format!("Проверьте данные:\n{}", header_summary(&self.draft)),
                [labels::ACCEPT, labels::CORRECT],
            ),
            ChoosingHeaderCorrection => Prompt::with_buttons(
                "Что исправить?",
                HeaderField::labels()
                    .into_iter()
                    .chain([labels::NOTHING_TO_CHANGE.to_string()]),
            ),
            AwaitingCounter(fuel) => Prompt::with_keyboard(
                format!("{fuel}: показания счётчика (л.):"),
                Keyboard::Remove,
            ),
            AwaitingCash(fuel) => Prompt::text(format!("{fuel}: продано за наличные (л.):")),
            AwaitingCard(fuel) => Prompt::text(format!("{fuel}: продано по картам (л.):")),
            ConfirmingTotal(fuel) => {
                let total = self.draft.block(fuel).total_sold.unwrap_or_default();
                Prompt::with_buttons(
                    format!("{fuel}: всего продано {total} л. Верно?"),
                    [labels::TOTAL_ACCEPT, labels::TOTAL_RETYPE],
                )
            }
            AwaitingTotal(fuel) => Prompt::with_keyboard(
                format!("{fuel}: введите итог продаж (л.):"),
                Keyboard::Remove,
            ),
            AwaitingDebtChoice(fuel) => Prompt::with_buttons(
                format!("{fuel}: были продажи в долг?"),
                [labels::YES, labels::NO],
            ),
            AwaitingContractor(fuel) => Prompt::with_buttons(
                format!("{fuel}: выберите контрагента или введите название:"),
                self.presets.contractors.iter().cloned(),
            ),
            AwaitingVolume(fuel) => {
                let contractor = self
                    .draft
                    .block(fuel)
                    .pending_contractor
                    .clone()
                    .unwrap_or_default();
                Prompt::with_keyboard(
                    format!("{fuel}: объём в долг для {contractor} (л.):"),
                    Keyboard::Remove,
                )
            }
            AwaitingMoreDebts(fuel) => Prompt::with_buttons(
                format!("{fuel}: добавить ещё должника?"),
                [labels::MORE_DEBTS, labels::NO_MORE_DEBTS],
            ),
            ConfirmingBlock(fuel) => Prompt::with_buttons(
                format!(
                    "Проверьте данные:\n{}",
                    block_summary(fuel, self.draft.block(fuel))
                ),
                [labels::ACCEPT, labels::CORRECT],
            ),
            ChoosingBlockCorrection(fuel) => Prompt::with_buttons(
                format!("{fuel}: что исправить?"),
                BlockField::labels()
                    .into_iter()
                    .chain([labels::NOTHING_TO_CHANGE.to_string()]),
            ),
            Committed => Prompt::text("Отчёт ожидает отправки."),
        }
    }
}
