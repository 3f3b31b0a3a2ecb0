//! Bot command parsing and response formatting.
//!
//! This module provides the complete command processing pipeline of the bot,
//! enabling Matrix users to look up Fedora Accounts users and groups and to
//! give each other cookies.
//!
//! # Overview
//!
//! 1. **Parsing** - Converting Matrix messages into [`command::Command`]s,
//!    including the `name++` increments
//! 2. **Execution** - Routing commands to the action handlers, which gather
//!    information from the directory, the release catalog and the ledger
//! 3. **Response** - Formatting results as Markdown (and HTML for mentions)
//!
//! # Architecture
//!
//! ```text
//! ChatMessage
//!      │
//!      ▼
//! ┌─────────────┐
//! │  Commander  │  ← Entry point: parse() + parse_command()
//! └─────────────┘
//!      │
//!      ├── parse() ──────────────► command::Command
//!      │
//!      └── parse_command() ──────► Action handlers ──► CommandResult
//!                                   - handle_help
//!                                   - handle_hello / handle_info / handle_localtime
//!                                   - handle_group_info / handle_group_memberships
//!                                   - handle_cookie_give / handle_cookie_count
//! ```
//!
//! # Error Handling
//!
//! Parsing errors are split in two: messages that are not for the bot are
//! ignored silently, malformed known commands get a usage reminder. During
//! execution, an [`InfoGatherError`] is shown to the user as is, any other
//! failure is logged and answered with a generic message.
//!
//! # Modules
//!
//! - `actions` - Command handlers
//! - `command` - Command model and parsing
//! - `commander` - Parsing and execution entry point
//! - `markdown_response` - Response formatters

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use thiserror::Error;

mod actions;
mod command;
mod commander;
mod markdown_response;

pub use crate::commands::commander::{Commander, CommanderSettings};
use crate::{cookies::LedgerError, error::InfoGatherError, message::ChatMessage};

/// Runtime context for command execution.
///
/// # Fields
///
/// * `message` - The message that triggered the command
/// * `joined_members` - Matrix ids of the room members, only filled for commands that need them
/// * `now` - Instant the message was handled
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub message: ChatMessage,
    pub joined_members: HashSet<String>,
    pub now: DateTime<Utc>,
}

/// Result of command execution.
///
/// `response` is always sent. When `html_response` is set, it is sent as the
/// formatted body next to `response` instead of rendering `response` as
/// Markdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    /// Markdown-formatted response message
    pub response: String,
    /// HTML rendering of the response, for responses with mentions
    pub html_response: Option<String>,
}

impl CommandResult {
    pub fn markdown(response: String) -> Self {
        CommandResult {
            response,
            html_response: None,
        }
    }
}

/// Errors that can occur during command parsing.
///
/// * `NotForBot` - Message is not a command or is for a different bot.
///   Should be handled silently without responding to the user.
/// * `InvalidCommand` - Command syntax or arguments are invalid.
///   Contains a user-friendly error message to display.
#[derive(Debug, PartialEq, Eq)]
pub enum CommandParseError {
    /// Message is not for this bot (silent error)
    NotForBot,
    /// Invalid command syntax with error message
    InvalidCommand(String),
}

/// Failure while executing a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Expected failure, its message is sent to the user
    #[error(transparent)]
    Gather(#[from] InfoGatherError),
    /// Unexpected failure, logged and answered with a generic message
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<LedgerError> for CommandError {
    fn from(error: LedgerError) -> Self {
        CommandError::Internal(error.into())
    }
}
