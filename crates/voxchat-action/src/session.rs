//! Conversation session over an assistant transport.
//!
//! Each user message is stamped with the local time (the backend needs it to
//! compute absolute alarm times), sent through a [`Transport`], and the reply
//! is dispatched. The resulting entries accumulate in a [`ChatLog`].

use async_trait::async_trait;
use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

use crate::dispatch::Dispatcher;
use crate::error::TransportError;
use crate::types::{ChatEntry, ChatRole, Outcome};

pub const EMPTY_MESSAGE: &str = "Please enter a message";

/// Delivers a message to the assistant backend and returns the raw reply body.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, message: &str) -> Result<String, TransportError>;
}

/// JSON envelope of a backend reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerReply {
    pub response: String,
}

impl ServerReply {
    /// Decode a reply body and return its trimmed `response` text.
    pub fn decode(body: &str) -> Result<String, TransportError> {
        let reply: ServerReply = serde_json::from_str(body)
            .map_err(|e| TransportError::MalformedReply(e.to_string()))?;
        Ok(reply.response.trim().to_string())
    }
}

/// Append the local time in the form the backend prompt expects:
/// `<message> [Current time: 15/01/2025 14:30 (Wednesday)]`.
pub fn with_time_context<Tz: TimeZone>(message: &str, now: &DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    format!(
        "{} [Current time: {}]",
        message,
        now.format("%d/%m/%Y %H:%M (%A)")
    )
}

/// Ordered record of the conversation.
#[derive(Debug, Clone, Default)]
pub struct ChatLog {
    entries: Vec<ChatEntry>,
}

impl ChatLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: ChatEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[ChatEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// One line per entry, e.g. `You: hi`.
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A running conversation with one backend.
pub struct Session<Tz: TimeZone, T: Transport> {
    transport: T,
    dispatcher: Dispatcher<Tz>,
    log: ChatLog,
}

impl<Tz, T> Session<Tz, T>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
    T: Transport,
{
    pub fn new(transport: T, dispatcher: Dispatcher<Tz>) -> Self {
        Self {
            transport,
            dispatcher,
            log: ChatLog::new(),
        }
    }

    pub fn log(&self) -> &ChatLog {
        &self.log
    }

    pub fn dispatcher(&self) -> &Dispatcher<Tz> {
        &self.dispatcher
    }

    /// Send one user message and handle the reply.
    pub async fn exchange(&mut self, message: &str) -> Outcome {
        let message = message.trim();
        if message.is_empty() {
            return Outcome {
                entry: ChatEntry::new(ChatRole::Error, EMPTY_MESSAGE),
                speech: None,
            };
        }

        self.log.push(ChatEntry::new(ChatRole::User, message));
        let outbound = with_time_context(message, &self.dispatcher.local_now());
        debug!(outbound = %outbound, "Sending message");

        let outcome = match self.transport.send(&outbound).await {
            Ok(body) => match ServerReply::decode(&body) {
                Ok(response) => self.dispatcher.handle(&response),
                Err(e) => transport_failure(e),
            },
            Err(e) => transport_failure(e),
        };
        self.log.push(outcome.entry.clone());
        outcome
    }
}

fn transport_failure(err: TransportError) -> Outcome {
    warn!(error = %err, "Assistant exchange failed");
    Outcome {
        entry: ChatEntry::new(ChatRole::Error, err.to_string()),
        speech: None,
    }
}
