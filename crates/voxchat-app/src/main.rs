//! Voxchat application binary - composition root.
//!
//! 1. Parse CLI args and load configuration from TOML
//! 2. Open the alarm registry and note book under the data directory
//! 3. Build the dispatcher (local timezone, system clock)
//! 4. Run the requested command

mod cli;
mod transport;

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use voxchat_action::alarm::{AlarmRunner, RingingPresenter, RingingSlot};
use voxchat_action::notes::{conversation_note, export_markdown};
use voxchat_action::{
    AlarmId, AlarmRegistry, AlarmScheduler, ChatRole, Dispatcher, NoteBook, NoteStore, Session,
    SystemClock,
};
use voxchat_core::config::VoxchatConfig;
use voxchat_core::paths::expand_home;

use cli::{CliArgs, Command, NotesAction};
use transport::CommandTransport;

/// Rings by logging; the handle records when ringing started.
struct LogPresenter;

impl RingingPresenter for LogPresenter {
    type Handle = Instant;

    fn start_ringing(&self, alarm: AlarmId) -> Instant {
        tracing::warn!(%alarm, "ALARM");
        println!("\u{7}Alarm {} is ringing", alarm);
        Instant::now()
    }

    fn stop_ringing(&self, started: Instant) {
        tracing::info!(rang_secs = started.elapsed().as_secs(), "Ringing stopped");
    }
}

/// Load the config, reporting a broken file once tracing is up.
fn load_config(path: &Path) -> (VoxchatConfig, Option<String>) {
    if !path.exists() {
        return (VoxchatConfig::default(), None);
    }
    match VoxchatConfig::load(path) {
        Ok(config) => (config, None),
        Err(e) => (VoxchatConfig::default(), Some(e.to_string())),
    }
}

async fn dispatch_stdin(dispatcher: &Dispatcher<chrono::Local>) -> std::io::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        print_outcome(&dispatcher.handle(&line));
    }
    Ok(())
}

/// Exchange each stdin line with the backend, optionally keeping a record
/// of the conversation in the note book.
async fn chat_stdin(
    session: &mut Session<chrono::Local, CommandTransport>,
    notes: &NoteBook,
    save_conversation: bool,
) -> std::io::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let message = line.trim();
        if message.is_empty() {
            continue;
        }
        let outcome = session.exchange(message).await;
        print_outcome(&outcome);

        if save_conversation && outcome.entry.role != ChatRole::Error {
            let note = conversation_note(
                message,
                &outcome.entry.text,
                &session.dispatcher().local_now(),
            );
            if let Err(e) = notes.append(&note) {
                tracing::warn!(error = %e, "Conversation not saved");
            }
        }
    }
    tracing::debug!(entries = session.log().entries().len(), "Chat session ended");
    Ok(())
}

fn print_outcome(outcome: &voxchat_action::Outcome) {
    println!("{}", outcome.entry);
    if let Some(speech) = &outcome.speech {
        tracing::debug!(speech = %speech, "Speech output");
    }
}

fn run_notes(notes: &NoteBook, action: NotesAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        NotesAction::List => {
            for (i, note) in notes.list()?.iter().enumerate() {
                println!("{:>3}  {}", i, note);
            }
        }
        NotesAction::Add { content } => {
            notes.append(&content)?;
            println!("Note saved: {}", content.trim());
        }
        NotesAction::Edit { index, content } => {
            notes.update(index, &content)?;
            println!("Note {} updated", index);
        }
        NotesAction::Remove { index } => {
            let removed = notes.remove(index)?;
            println!("Removed: {}", removed);
        }
        NotesAction::Export => println!("{}", export_markdown(&notes.list()?)),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let (config, config_error) = load_config(&config_file);

    // Tracing.
    let level = args.resolve_log_level(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&level)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("Starting Voxchat v{}", env!("CARGO_PKG_VERSION"));
    match config_error {
        Some(e) => tracing::warn!(
            path = %config_file.display(),
            error = %e,
            "Failed to load config. Using defaults."
        ),
        None => tracing::debug!(path = %config_file.display(), "Configuration resolved"),
    }
    tracing::debug!(endpoint = %config.server.endpoint_url(), "Assistant endpoint");

    // Storage.
    let data_dir = expand_home(&args.resolve_data_dir(&config.general.data_dir));
    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        tracing::error!(path = %data_dir.display(), error = %e, "Failed to create data directory");
        return Err(e.into());
    }
    let registry = Arc::new(AlarmRegistry::open(data_dir.join(&config.alarm.alarms_file))?);
    let notes = Arc::new(NoteBook::open(data_dir.join(&config.notes.notes_file))?);

    let clock = Arc::new(SystemClock);
    let scheduler = AlarmScheduler::from_config(registry.clone(), &config.alarm);
    let dispatcher = Dispatcher::new(scheduler, notes.clone(), clock.clone(), chrono::Local);

    match args.command {
        Command::Dispatch { response: Some(response) } => {
            print_outcome(&dispatcher.handle(&response));
        }
        Command::Dispatch { response: None } => dispatch_stdin(&dispatcher).await?,
        Command::Alarms { json } => {
            let alarms = registry.list();
            if json {
                println!("{}", serde_json::to_string_pretty(&alarms)?);
            } else if alarms.is_empty() {
                println!("No alarms");
            } else {
                for alarm in alarms {
                    let local = alarm.trigger_at.with_timezone(&chrono::Local);
                    println!(
                        "{:>12}  {}  {}",
                        alarm.id.to_string(),
                        local.format("%a %Y-%m-%d %H:%M"),
                        alarm.status
                    );
                }
            }
        }
        Command::Cancel { id } => {
            dispatcher.scheduler().cancel(id);
            match registry.get(id) {
                Ok(alarm) => println!("Alarm {} is {}", id, alarm.status),
                Err(e) => println!("{}", e),
            }
        }
        Command::Notes { action } => run_notes(&notes, action)?,
        Command::Watch => {
            let slot = Arc::new(RingingSlot::new(LogPresenter));
            let recheck = std::time::Duration::from_secs(config.alarm.watch_recheck_secs.max(1));
            let runner = AlarmRunner::new(registry.clone(), slot, clock).with_recheck(recheck);
            tracing::info!(
                alarms = registry.list().len(),
                "Watching for alarms. Press Ctrl-C to stop."
            );

            tokio::select! {
                _ = runner.run() => {}
                result = tokio::signal::ctrl_c() => result?,
            }
            if let Some(id) = runner.dismiss() {
                println!("Alarm {} dismissed", id);
            }
        }
        Command::Chat {
            save_conversation,
            backend,
        } => {
            let endpoint = config.server.endpoint_url();
            let transport =
                CommandTransport::new(&backend, endpoint.as_str()).ok_or("backend command is empty")?;
            tracing::info!(
                endpoint = %endpoint,
                backend = %transport.command_line(),
                "Chat session started"
            );
            let mut session = Session::new(transport, dispatcher);
            chat_stdin(&mut session, &notes, save_conversation).await?;
        }
        Command::Config { write } => {
            if write {
                config.save(&config_file)?;
                println!("Configuration written to {}", config_file.display());
            } else {
                print!("{}", config.to_toml()?);
                println!("# endpoint: {}", config.server.endpoint_url());
            }
        }
    }

    Ok(())
}
