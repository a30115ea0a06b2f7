//! Terminal front end for the station report conversation.
//!
//! Each line typed at the prompt is delivered as one inbound event for a
//! single user. Lines that match a button on screen count as presses.

mod console;
mod helper;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use rustyline::Editor;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use console::{ConsoleInput, ConsoleMessenger};
use helper::CliHelper;
use station_report_core::session::{ReportDispatcher, UserId};
use station_report_infrastructure::{ConfigService, SecretService, open_sink};

#[derive(Parser, Debug)]
#[command(name = "station-report")]
#[command(about = "Fill in the daily fuel-station report from the terminal")]
struct Args {
    /// Path to config.toml (defaults to the per-user config directory)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Path to secret.json
    #[arg(long)]
    secrets: Option<PathBuf>,

    /// Chat user id the session runs as
    #[arg(long, short = 'u', default_value_t = 1)]
    user: i64,

    /// Debug-level logging (RUST_LOG still wins when set)
    #[arg(long, short = 'v')]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "station_report=debug"
    } else {
        "station_report=info"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    // ===== Backend Initialization =====
    let config_service = ConfigService::new(args.config.as_deref())?;
    let config = config_service.load()?;
    let secrets = SecretService::new(args.secrets.as_deref())?.load_secrets()?;
    let sink = open_sink(&config, &secrets)?;

    let messenger = Arc::new(ConsoleMessenger::new());
    let screen = messenger.screen();
    let dispatcher = ReportDispatcher::new(
        messenger,
        sink,
        Arc::new(config.presets.clone()),
        config.persistence.timeout(),
    );
    let user = UserId(args.user);
    tracing::info!(user_id = %user, config = %config_service.path().display(), "station-report ready");

    // ===== REPL Setup =====
    let mut rl: Editor<CliHelper, DefaultHistory> = Editor::new()?;
    rl.set_helper(Some(CliHelper::new(screen.clone())));

    println!("{}", "=== Отчёт АЗС ===".bright_magenta().bold());
    println!(
        "{}",
        "Type '/start' to begin a report, '/help' for commands, or 'quit' to exit.".bright_black()
    );
    println!();

    // ===== Main REPL Loop =====
    loop {
        match rl.readline(">> ") {
            Ok(line) => {
                let trimmed = line.trim();

                if trimmed == "quit" || trimmed == "exit" {
                    println!("{}", "Goodbye!".bright_green());
                    break;
                }
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(trimmed);

                let input = match screen.lock() {
                    Ok(mut screen) => screen.classify(trimmed),
                    Err(poisoned) => poisoned.into_inner().classify(trimmed),
                };
                let outcome = match &input {
                    ConsoleInput::Button(payload) => dispatcher.on_button_press(user, payload).await,
                    ConsoleInput::Text(text) => dispatcher.on_text(user, text).await,
                };
                if let Err(e) = outcome {
                    tracing::error!(user_id = %user, error = %e, "failed to handle input");
                    eprintln!("{}", format!("Error: {e}").red());
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type 'quit' to exit.".yellow());
            }
            Err(ReadlineError::Eof) => {
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {:?}", err).red());
                break;
            }
        }
    }

    if dispatcher.active_sessions().await > 0 {
        tracing::info!(user_id = %user, "exiting with an unfinished report");
    }
    Ok(())
}
