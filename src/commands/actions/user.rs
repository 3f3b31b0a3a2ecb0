//! User lookup handlers: `hello`, `info` and `localtime`.
//!
//! Each command targets the user named in the command, or the sender of the
//! message when no name is given.

use log::debug;

use crate::{
    commands::{
        CommandContext, CommandError, CommandResult,
        markdown_response::{format_hello, format_localtime, format_user_info},
    },
    directory::DirectoryClient,
    identity::resolve_user,
};

/// Greets a user with their name and pronouns.
pub async fn handle_hello<D: DirectoryClient>(
    directory: &D,
    context: &CommandContext,
    name: Option<&str>,
    home_server: &str,
) -> Result<CommandResult, CommandError> {
    debug!("handling hello command");

    let user = resolve_user(directory, name, &context.message, home_server).await?;
    Ok(CommandResult::markdown(format_hello(&user)))
}

/// Shows the directory profile of a user.
pub async fn handle_info<D: DirectoryClient>(
    directory: &D,
    context: &CommandContext,
    name: Option<&str>,
    home_server: &str,
) -> Result<CommandResult, CommandError> {
    debug!("handling info command");

    let user = resolve_user(directory, name, &context.message, home_server).await?;
    Ok(CommandResult::markdown(format_user_info(&user)))
}

/// Shows the current time in the timezone of a user.
pub async fn handle_localtime<D: DirectoryClient>(
    directory: &D,
    context: &CommandContext,
    name: Option<&str>,
    home_server: &str,
) -> Result<CommandResult, CommandError> {
    debug!("handling localtime command");

    let user = resolve_user(directory, name, &context.message, home_server).await?;
    Ok(CommandResult::markdown(format_localtime(&user, context.now)))
}
