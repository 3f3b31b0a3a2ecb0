//! Command parsing and execution coordinator.
//!
//! The [`Commander`] is the single entry point between the Matrix transport
//! and the command handlers. It owns the directory client, the release
//! catalog client and the cookie ledger, so the handlers only borrow them.

use command_parser::Parser;
use log::{error, info};

use crate::{
    commands::{
        CommandContext, CommandError, CommandParseError, CommandResult,
        actions::{
            handle_cookie_count, handle_cookie_give, handle_group_info, handle_group_memberships,
            handle_hello, handle_help, handle_info, handle_localtime,
        },
        command::{Command, format_command_error},
        markdown_response::format_internal_error,
    },
    cookies::CookieLedger,
    directory::DirectoryClient,
    message::ChatMessage,
    releases::ReleaseClient,
};

/// Settings of the command pipeline.
#[derive(Debug, Clone)]
pub struct CommanderSettings {
    /// Character starting an explicit command
    pub command_prefix: char,
    /// Matrix server whose accounts are directory accounts
    pub home_server: String,
    /// Update id prefix of the main distribution in the release catalog
    pub primary_release_prefix: String,
}

pub struct Commander<D, R> {
    parser: Parser,
    settings: CommanderSettings,
    directory: D,
    releases: R,
    ledger: CookieLedger,
}

impl<D: DirectoryClient, R: ReleaseClient> Commander<D, R> {
    /// Creates a new [Commander].
    ///
    /// # Arguments
    ///
    /// * `settings` - Prefix, home server and release prefix
    /// * `directory` - Directory client
    /// * `releases` - Release catalog client
    /// * `ledger` - Cookie ledger
    pub fn new(settings: CommanderSettings, directory: D, releases: R, ledger: CookieLedger) -> Self {
        let parser = Parser::new(settings.command_prefix, '-');
        Commander {
            parser,
            settings,
            directory,
            releases,
            ledger,
        }
    }

    /// Parses a message into a command.
    ///
    /// Explicit commands win over increments. A malformed known command is an
    /// [`CommandParseError::InvalidCommand`] carrying a usage reminder, every
    /// other message without command is [`CommandParseError::NotForBot`].
    pub fn parse(&self, message: &ChatMessage) -> Result<Command, CommandParseError> {
        match Command::parse(&self.parser, &message.body) {
            Ok(command) => return Ok(command),
            Err(error) => {
                // Send an error message for malformed commands of the bot,
                // otherwise look for an increment
                if let Some(usage) = format_command_error(error, self.settings.command_prefix) {
                    return Err(CommandParseError::InvalidCommand(usage));
                }
            }
        }

        Command::parse_increment(message).ok_or(CommandParseError::NotForBot)
    }

    /// Executes a command and returns the response to send.
    ///
    /// Every command produces exactly one response, failures included.
    pub async fn parse_command(&self, command: &Command, context: &CommandContext) -> CommandResult {
        let home_server = self.settings.home_server.as_str();

        let result = match command {
            Command::Help => Ok(handle_help(self.settings.command_prefix)),
            Command::Hello(name) => {
                handle_hello(&self.directory, context, name.as_deref(), home_server).await
            }
            Command::Info(name) => {
                handle_info(&self.directory, context, name.as_deref(), home_server).await
            }
            Command::LocalTime(name) => {
                handle_localtime(&self.directory, context, name.as_deref(), home_server).await
            }
            Command::GroupInfo(groupname) => handle_group_info(&self.directory, groupname).await,
            Command::GroupMemberships(groupname, kind) => {
                handle_group_memberships(&self.directory, context, groupname, *kind, home_server)
                    .await
            }
            Command::CookieGive(name) => {
                handle_cookie_give(
                    &self.directory,
                    &self.releases,
                    &self.ledger,
                    context,
                    name,
                    home_server,
                    &self.settings.primary_release_prefix,
                )
                .await
            }
            Command::CookieCount(name) => {
                handle_cookie_count(
                    &self.directory,
                    &self.ledger,
                    context,
                    name.as_deref(),
                    home_server,
                )
                .await
            }
        };

        match result {
            Ok(result) => result,
            Err(CommandError::Gather(e)) => {
                info!("{:?} failed: {}", command, e);
                CommandResult::markdown(e.to_string())
            }
            Err(CommandError::Internal(e)) => {
                error!("{:?} failed: {:#}", command, e);
                CommandResult::markdown(format_internal_error())
            }
        }
    }
}
