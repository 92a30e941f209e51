//! Assistant transport backed by an external command.
//!
//! Each message is written to the command's stdin. The command finds the
//! configured endpoint in `VOXCHAT_ENDPOINT` and prints the backend's JSON
//! reply on stdout.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use voxchat_action::{Transport, TransportError};

pub const ENDPOINT_ENV: &str = "VOXCHAT_ENDPOINT";

pub struct CommandTransport {
    program: String,
    args: Vec<String>,
    endpoint: String,
}

impl CommandTransport {
    /// `command` is the program followed by its arguments. `None` if empty.
    pub fn new(command: &[String], endpoint: impl Into<String>) -> Option<Self> {
        let (program, args) = command.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
            endpoint: endpoint.into(),
        })
    }

    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn connection(e: impl std::fmt::Display) -> TransportError {
    TransportError::Connection(e.to_string())
}

#[async_trait]
impl Transport for CommandTransport {
    async fn send(&self, message: &str) -> Result<String, TransportError> {
        let mut child = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .env(ENDPOINT_ENV, &self.endpoint)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(connection)?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(message.as_bytes()).await.map_err(connection)?;
        }

        let output = child.wait_with_output().await.map_err(connection)?;
        if !output.status.success() {
            return Err(connection(format!("backend exited with {}", output.status)));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
