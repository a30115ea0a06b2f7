//! Terminal transport: prints prompts and turns typed lines back into
//! button presses when they match a keyboard on screen.

use async_trait::async_trait;
use colored::Colorize;
use station_report_core::Result;
use station_report_core::conversation::{Keyboard, MessageId, Messenger, Prompt};
use station_report_core::session::UserId;
use std::sync::{Arc, Mutex, MutexGuard};

/// A typed line after keyboard matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleInput {
    /// Matched a button; carries the payload to deliver.
    Button(String),
    Text(String),
}

/// Keyboards currently visible in the terminal.
#[derive(Debug, Default)]
pub struct Screen {
    next_id: MessageId,
    /// Most recent message carrying an inline grid.
    inline: Option<(MessageId, Keyboard)>,
    reply: Option<Keyboard>,
}

impl Screen {
    /// Inline labels win over reply labels.
    pub fn classify(&mut self, line: &str) -> ConsoleInput {
        if let Some((_, keyboard)) = &self.inline {
            if let Some(button) = keyboard.inline_button(line) {
                return ConsoleInput::Button(button.payload.clone());
            }
        }
        if let Some(Keyboard::Reply { buttons, one_time }) = &self.reply {
            if buttons.iter().any(|b| b == line) {
                if *one_time {
                    self.reply = None;
                }
                return ConsoleInput::Button(line.to_string());
            }
        }
        ConsoleInput::Text(line.to_string())
    }

    /// Labels a user can type right now, for completion.
    pub fn labels(&self) -> Vec<String> {
        let inline = self.inline.iter().flat_map(|(_, keyboard)| match keyboard {
            Keyboard::Inline(rows) => rows
                .iter()
                .flatten()
                .map(|b| b.label.trim().to_string())
                .filter(|l| !l.is_empty())
                .collect::<Vec<_>>(),
            _ => Vec::new(),
        });
        let reply = self.reply.iter().flat_map(|keyboard| match keyboard {
            Keyboard::Reply { buttons, .. } => buttons.clone(),
            _ => Vec::new(),
        });
        inline.chain(reply).collect()
    }

    fn record(&mut self, prompt: &Prompt) -> MessageId {
        self.next_id += 1;
        match &prompt.keyboard {
            Some(keyboard @ Keyboard::Inline(_)) => {
                self.inline = Some((self.next_id, keyboard.clone()))
            }
            Some(keyboard @ Keyboard::Reply { .. }) => self.reply = Some(keyboard.clone()),
            Some(Keyboard::Remove) => self.reply = None,
            None => {}
        }
        self.next_id
    }
}

/// Renders prompts with `colored` and tracks what can be pressed.
pub struct ConsoleMessenger {
    screen: Arc<Mutex<Screen>>,
}

impl ConsoleMessenger {
    pub fn new() -> Self {
        Self {
            screen: Arc::new(Mutex::new(Screen::default())),
        }
    }

    /// Shared with the line editor helper.
    pub fn screen(&self) -> Arc<Mutex<Screen>> {
        self.screen.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Screen> {
        // a poisoned screen only ever holds stale keyboards
        self.screen.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn render_keyboard(keyboard: &Keyboard) {
    match keyboard {
        Keyboard::Inline(rows) => {
            for row in rows {
                let line = row
                    .iter()
                    .map(|b| format!("[{:>2}]", b.label))
                    .collect::<Vec<_>>()
                    .join(" ");
                println!("  {}", line.cyan());
            }
        }
        Keyboard::Reply { buttons, .. } => {
            let line = buttons
                .iter()
                .map(|b| format!("[{b}]"))
                .collect::<Vec<_>>()
                .join(" ");
            println!("  {}", line.bright_black());
        }
        Keyboard::Remove => {}
    }
}

#[async_trait]
impl Messenger for ConsoleMessenger {
    async fn send_prompt(&self, user: UserId, prompt: &Prompt) -> Result<MessageId> {
        let id = self.lock().record(prompt);
        tracing::trace!(user_id = %user, message_id = id, "prompt rendered");
        for line in prompt.text.lines() {
            println!("{}", line.bright_blue());
        }
        if let Some(keyboard) = &prompt.keyboard {
            render_keyboard(keyboard);
        }
        Ok(id)
    }

    async fn edit_keyboard(
        &self,
        user: UserId,
        message_id: MessageId,
        keyboard: &Keyboard,
    ) -> Result<()> {
        {
            let mut screen = self.lock();
            match &mut screen.inline {
                Some((id, current)) if *id == message_id => *current = keyboard.clone(),
                _ => {
                    tracing::warn!(user_id = %user, message_id, "edit for a message no longer on screen");
                    return Ok(());
                }
            }
        }
        println!("{}", "(календарь обновлён)".bright_black());
        render_keyboard(keyboard);
        Ok(())
    }

    async fn delete_message(&self, _user: UserId, message_id: MessageId) -> Result<()> {
        let mut screen = self.lock();
        if screen.inline.as_ref().is_some_and(|(id, _)| *id == message_id) {
            screen.inline = None;
        }
        Ok(())
    }
}
