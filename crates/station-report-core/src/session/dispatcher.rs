use super::commit::persist_with_retry;
use super::model::{ReportSession, UserId};
use crate::config::Presets;
use crate::conversation::command::help_text;
use crate::conversation::{
    Command, ConversationState, Effect, Input, Keyboard, Messenger, ParsedInput, Prompt,
    ReportMachine, parse_input,
};
use crate::error::Result;
use crate::report::summary::report_summary;
use crate::report::{Report, ReportDraft, ReportSink};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};

type SharedSession = Arc<Mutex<ReportSession>>;

const NO_SESSION: &str = "Отправьте /start, чтобы начать отчёт.";

/// Routes inbound chat events to per-user report sessions.
///
/// `ReportDispatcher` is responsible for:
/// - Creating a session on `/start` and dropping it on `/stop` or after submission
/// - Intercepting `/` commands before they reach the conversation
/// - Serializing events per user while different users proceed in parallel
/// - Carrying out the machine's effects through the `Messenger`
/// - Persisting finished reports through the `ReportSink`
pub struct ReportDispatcher {
    /// Session table
    sessions: Arc<RwLock<HashMap<UserId, SharedSession>>>,
    messenger: Arc<dyn Messenger>,
    sink: Arc<dyn ReportSink>,
    presets: Arc<Presets>,
    /// Upper bound for a single append attempt
    persist_timeout: Duration,
}

impl ReportDispatcher {
    pub fn new(
        messenger: Arc<dyn Messenger>,
        sink: Arc<dyn ReportSink>,
        presets: Arc<Presets>,
        persist_timeout: Duration,
    ) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            messenger,
            sink,
            presets,
            persist_timeout,
        }
    }

    /// Number of users with a report in progress.
    pub async fn active_sessions(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Current state of `user`'s conversation, if they have one.
    pub async fn session_state(&self, user: UserId) -> Option<ConversationState> {
        let session = self.session(user).await?;
        let guard = session.lock().await;
        Some(guard.machine.state())
    }

    /// Fields `user` has entered so far, if they have a session.
    pub async fn session_draft(&self, user: UserId) -> Option<ReportDraft> {
        let session = self.session(user).await?;
        let guard = session.lock().await;
        Some(guard.machine.draft().clone())
    }

    /// Starts a fresh report, discarding any report in progress.
    pub async fn on_start(&self, user: UserId) -> Result<()> {
        let today = chrono::Local::now().date_naive();
        let mut session = ReportSession::new(user, ReportMachine::new(self.presets.clone(), today));
        tracing::info!(user_id = %user, session_id = %session.id, "report session started");

        let effects = session.machine.start();
        let shared = Arc::new(Mutex::new(session));
        let previous = self.sessions.write().await.insert(user, shared.clone());
        if let Some(previous) = previous {
            previous.lock().await.close();
            tracing::info!(user_id = %user, "previous report discarded by restart");
        }

        let mut guard = shared.lock().await;
        self.apply(&shared, &mut guard, effects).await
    }

    /// Discards `user`'s report without persisting it.
    pub async fn on_stop(&self, user: UserId) -> Result<()> {
        let removed = self.sessions.write().await.remove(&user);
        let text = match removed {
            Some(session) => {
                let mut guard = session.lock().await;
                guard.close();
                tracing::info!(user_id = %user, session_id = %guard.id, state = ?guard.machine.state(), "report session stopped");
                "Отчёт отменён. Чтобы начать заново, отправьте /start."
            }
            None => "Нет активного отчёта. Чтобы начать, отправьте /start.",
        };
        self.messenger
            .send_prompt(user, &Prompt::with_keyboard(text, Keyboard::Remove))
            .await?;
        Ok(())
    }

    /// Free-text message from `user`.
    pub async fn on_text(&self, user: UserId, text: &str) -> Result<()> {
        match parse_input(text) {
            ParsedInput::Command(command) => self.on_command(user, command).await,
            ParsedInput::Unknown(raw) => {
                tracing::warn!(user_id = %user, command = raw, "unknown command");
                self.notify(user, "Неизвестная команда. Список команд: /help")
                    .await
            }
            ParsedInput::Plain(_) => self.dispatch(user, Input::Text(text)).await,
        }
    }

    /// Button press from `user`; `payload` is a menu label or inline payload.
    pub async fn on_button_press(&self, user: UserId, payload: &str) -> Result<()> {
        match parse_input(payload) {
            ParsedInput::Plain(_) => self.dispatch(user, Input::Button(payload)).await,
            _ => self.on_text(user, payload).await,
        }
    }

    async fn on_command(&self, user: UserId, command: Command) -> Result<()> {
        match command {
            Command::Start => self.on_start(user).await,
            Command::Stop => self.on_stop(user).await,
            Command::Retry => self.on_retry(user).await,
            Command::Help => self.notify(user, &help_text()).await,
        }
    }

    /// Re-attempts a commit left pending by a persistence failure.
    async fn on_retry(&self, user: UserId) -> Result<()> {
        let Some(shared) = self.session(user).await else {
            return self.notify(user, NO_SESSION).await;
        };
        let mut guard = shared.lock().await;
        if guard.is_closed() {
            drop(guard);
            return self.notify(user, NO_SESSION).await;
        }
        match guard.machine.pending_report() {
            Some(report) => {
                tracing::info!(user_id = %user, session_id = %guard.id, "manual commit retry");
                self.apply(&shared, &mut guard, vec![Effect::Commit(report)])
                    .await
            }
            None => {
                drop(guard);
                self.notify(user, "Нет отчёта, ожидающего отправки.").await
            }
        }
    }

    async fn dispatch(&self, user: UserId, input: Input<'_>) -> Result<()> {
        let Some(shared) = self.session(user).await else {
            return self.notify(user, NO_SESSION).await;
        };
        let mut guard = shared.lock().await;
        if guard.is_closed() {
            drop(guard);
            return self.notify(user, NO_SESSION).await;
        }
        if guard.take_prompt_lost() {
            // the user never saw the question this input would answer
            tracing::info!(user_id = %user, state = ?guard.machine.state(), "re-sending lost prompt");
            let prompt = guard.machine.current_prompt();
            return self.apply(&shared, &mut guard, vec![Effect::Send(prompt)]).await;
        }
        let before = guard.machine.state();
        let effects = guard.machine.handle(input);
        tracing::debug!(user_id = %user, from = ?before, to = ?guard.machine.state(), "input handled");
        self.apply(&shared, &mut guard, effects).await
    }

    /// Carries out `effects` in order.
    ///
    /// Transport failures do not abort the remaining effects: the machine
    /// has already moved on, so the session is flagged and the current
    /// prompt goes out again on the user's next input.
    async fn apply(
        &self,
        shared: &SharedSession,
        session: &mut ReportSession,
        effects: Vec<Effect>,
    ) -> Result<()> {
        let user = session.user;
        for effect in effects {
            match effect {
                Effect::Send(prompt) => match self.messenger.send_prompt(user, &prompt).await {
                    Ok(message_id) => {
                        if prompt.is_inline() {
                            session.machine.calendar_sent(message_id);
                        }
                    }
                    Err(e) => {
                        tracing::warn!(user_id = %user, error = %e, "failed to send prompt");
                        session.mark_prompt_lost();
                    }
                },
                Effect::EditKeyboard {
                    message_id,
                    keyboard,
                } => {
                    if let Err(e) = self
                        .messenger
                        .edit_keyboard(user, message_id, &keyboard)
                        .await
                    {
                        tracing::warn!(user_id = %user, message_id, error = %e, "failed to edit keyboard");
                        session.mark_prompt_lost();
                    }
                }
                Effect::Delete { message_id } => {
                    // the message may already be gone; the conversation goes on
                    if let Err(e) = self.messenger.delete_message(user, message_id).await {
                        tracing::warn!(user_id = %user, message_id, error = %e, "failed to delete message");
                    }
                }
                Effect::Commit(report) => {
                    if self.commit(session, &report).await {
                        self.finish(shared, session).await;
                    }
                }
            }
        }
        Ok(())
    }

    /// Persists `report`; returns whether it was written.
    ///
    /// Notices sent from here are best effort: once the row is appended the
    /// session must finish even if the user cannot be told.
    async fn commit(&self, session: &ReportSession, report: &Report) -> bool {
        let user = session.user;
        match persist_with_retry(self.sink.as_ref(), report, self.persist_timeout).await {
            Ok(()) => {
                tracing::info!(user_id = %user, session_id = %session.id, date = %report.date, "report persisted");
                self.notify_logged(
                    user,
                    &format!(
                        "Отчёт сформирован и отправлен:\n{}",
                        report_summary(report)
                    ),
                )
                .await;
                self.notify_logged(
                    user,
                    "Спасибо! Вы можете начать новый отчёт с команды /start.",
                )
                .await;
                true
            }
            Err(e) => {
                tracing::warn!(user_id = %user, session_id = %session.id, error = %e, transient = e.is_transient(), "report not persisted");
                let text = if e.is_transient() {
                    "Не удалось сохранить отчёт: сервис временно недоступен. Данные сохранены, отправьте /retry, чтобы повторить попытку.".to_string()
                } else {
                    format!(
                        "Не удалось сохранить отчёт: {e}. Данные сохранены, отправьте /retry после устранения проблемы или /stop, чтобы отменить отчёт."
                    )
                };
                self.notify_logged(user, &text).await;
                false
            }
        }
    }

    /// Drops a submitted session, unless a restart already replaced it.
    async fn finish(&self, shared: &SharedSession, session: &mut ReportSession) {
        session.close();
        let mut sessions = self.sessions.write().await;
        if sessions
            .get(&session.user)
            .is_some_and(|current| Arc::ptr_eq(current, shared))
        {
            sessions.remove(&session.user);
        }
        tracing::info!(user_id = %session.user, session_id = %session.id, "report session finished");
    }

    async fn session(&self, user: UserId) -> Option<SharedSession> {
        self.sessions.read().await.get(&user).cloned()
    }

    async fn notify(&self, user: UserId, text: &str) -> Result<()> {
        self.messenger.send_prompt(user, &Prompt::text(text)).await?;
        Ok(())
    }

    async fn notify_logged(&self, user: UserId, text: &str) {
        if let Err(e) = self.notify(user, text).await {
            tracing::warn!(user_id = %user, error = %e, "failed to send notice");
        }
    }
}
