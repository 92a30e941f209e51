//! CLI argument definitions for the Voxchat application.
//!
//! Uses `clap` with derive macros for ergonomic argument parsing.
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use voxchat_action::AlarmId;
use voxchat_core::paths::default_config_path;

/// Voxchat: dispatch assistant responses into alarms and notes.
#[derive(Parser, Debug)]
#[command(name = "voxchat", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Data directory for the alarm registry and notes.
    #[arg(short = 'd', long = "data-dir")]
    pub data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Handle an assistant response, or each line of stdin when omitted.
    Dispatch {
        response: Option<String>,
    },
    /// List registered alarms.
    Alarms {
        /// Print the registry as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Cancel a scheduled alarm or dismiss a ringing one.
    Cancel {
        #[arg(allow_negative_numbers = true)]
        id: AlarmId,
    },
    /// Manage saved notes.
    Notes {
        #[command(subcommand)]
        action: NotesAction,
    },
    /// Fire alarms as they come due until interrupted.
    Watch,
    /// Chat through a backend command, one message per stdin line.
    ///
    /// The command gets each message on stdin and the `[server]` endpoint in
    /// VOXCHAT_ENDPOINT, and prints the `{"response": ...}` reply.
    Chat {
        /// Also save every exchange as a note.
        #[arg(long)]
        save_conversation: bool,
        /// Backend program followed by its arguments.
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        backend: Vec<String>,
    },
    /// Print the effective configuration.
    Config {
        /// Write it to the config file instead.
        #[arg(long)]
        write: bool,
    },
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum NotesAction {
    /// Print notes with their indices.
    List,
    /// Append a note.
    Add { content: String },
    /// Replace the note at an index.
    Edit { index: usize, content: String },
    /// Remove the note at an index.
    Remove { index: usize },
    /// Print notes as a Markdown list.
    Export,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > VOXCHAT_CONFIG env var > ~/.voxchat/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("VOXCHAT_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the data directory.
    ///
    /// Priority: --data-dir flag > config file value.
    pub fn resolve_data_dir(&self, config_data_dir: &str) -> String {
        self.data_dir
            .as_ref()
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_else(|| config_data_dir.to_string())
    }

    /// Resolve the log level.
    ///
    /// Priority: --log-level flag > config file value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config_level.to_string())
    }
}
