//! Builtin commands.
//!
//! Any inbound text starting with [`COMMAND_MARKER`] is treated as a command
//! before the active state sees it.

use std::sync::OnceLock;

pub const COMMAND_MARKER: char = '/';

/// A command recognised by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
    Retry,
    Help,
}

/// Result of looking at an inbound text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedInput<'a> {
    Command(Command),
    /// Marker present but the name is not a builtin.
    Unknown(&'a str),
    /// Ordinary input for the active state.
    Plain(&'a str),
}

/// A builtin command provided by the system.
#[derive(Debug, Clone)]
pub struct BuiltinCommand {
    /// Command name (without the leading /)
    pub name: &'static str,
    /// Human-readable description
    pub description: &'static str,
    pub command: Command,
}

impl BuiltinCommand {
    pub const fn new(name: &'static str, description: &'static str, command: Command) -> Self {
        Self {
            name,
            description,
            command,
        }
    }

    pub fn usage(&self) -> String {
        format!("{COMMAND_MARKER}{}", self.name)
    }
}

static BUILTIN_COMMANDS: OnceLock<Vec<BuiltinCommand>> = OnceLock::new();

/// Returns all builtin commands.
pub fn builtin_commands() -> &'static [BuiltinCommand] {
    BUILTIN_COMMANDS.get_or_init(|| {
        vec![
            BuiltinCommand::new("start", "Начать новый отчёт", Command::Start),
            BuiltinCommand::new("stop", "Прервать отчёт без сохранения", Command::Stop),
            BuiltinCommand::new(
                "retry",
                "Повторить отправку отчёта после ошибки",
                Command::Retry,
            ),
            BuiltinCommand::new("help", "Список команд", Command::Help),
        ]
    })
}

/// Find a builtin command by name.
pub fn find_builtin_command(name: &str) -> Option<&'static BuiltinCommand> {
    builtin_commands().iter().find(|cmd| cmd.name == name)
}

/// Splits inbound text into a command or plain input.
///
/// Only the first word counts, and a `@botname` suffix is ignored
/// (`/start@station_bot`).
pub fn parse_input(text: &str) -> ParsedInput<'_> {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix(COMMAND_MARKER) else {
        return ParsedInput::Plain(trimmed);
    };
    let word = rest.split_whitespace().next().unwrap_or("");
    let name = word.split('@').next().unwrap_or("");
    match find_builtin_command(&name.to_lowercase()) {
        Some(builtin) => ParsedInput::Command(builtin.command),
        None => ParsedInput::Unknown(trimmed),
    }
}

/// Text listing all commands.
pub fn help_text() -> String {
    builtin_commands()
        .iter()
        .map(|c| format!("{} - {}", c.usage(), c.description))
        .collect::<Vec<_>>()
        .join("\n")
}
