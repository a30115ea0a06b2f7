//! Line editor helper: command and button completion.

use crate::console::Screen;
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};
use station_report_core::conversation::builtin_commands;
use station_report_core::conversation::command::COMMAND_MARKER;
use std::borrow::Cow::{self, Borrowed, Owned};
use std::sync::{Arc, Mutex};

pub struct CliHelper {
    commands: Vec<String>,
    screen: Arc<Mutex<Screen>>,
}

impl CliHelper {
    pub fn new(screen: Arc<Mutex<Screen>>) -> Self {
        Self {
            commands: builtin_commands().iter().map(|c| c.usage()).collect(),
            screen,
        }
    }

    fn candidates(&self, prefix: &str) -> Vec<String> {
        if prefix.starts_with(COMMAND_MARKER) {
            return self
                .commands
                .iter()
                .filter(|cmd| cmd.starts_with(prefix))
                .cloned()
                .collect();
        }
        let labels = match self.screen.lock() {
            Ok(screen) => screen.labels(),
            Err(_) => Vec::new(),
        };
        labels
            .into_iter()
            .filter(|label| label.starts_with(prefix))
            .collect()
    }
}

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];
        if line.is_empty() {
            return Ok((0, vec![]));
        }
        let candidates = self
            .candidates(line)
            .into_iter()
            .map(|c| Pair {
                display: c.clone(),
                replacement: c,
            })
            .collect();
        Ok((0, candidates))
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with(COMMAND_MARKER) {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];
        if line.starts_with(COMMAND_MARKER) && !line.contains(' ') {
            self.commands
                .iter()
                .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
                .map(|cmd| cmd[line.len()..].to_string())
        } else {
            None
        }
    }
}

impl Validator for CliHelper {}
