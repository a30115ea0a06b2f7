//! Conversation module.
//!
//! # Module Structure
//!
//! - `state`: conversation states and correction menus
//! - `machine`: the `ReportMachine` transition engine
//! - `keyboard`: transport-neutral prompts and keyboards
//! - `command`: builtin `/` commands
//! - `messenger`: messaging collaborator trait

pub mod command;
pub mod keyboard;
mod machine;
mod messenger;
mod state;

pub use command::{Command, ParsedInput, builtin_commands, parse_input};
pub use keyboard::{InlineButton, Keyboard, MessageId, Prompt, labels};
pub use machine::{Effect, Input, ReportMachine};
pub use messenger::Messenger;
pub use state::{BlockField, ConversationState, HeaderField, Stage};
