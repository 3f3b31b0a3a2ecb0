//! Command action handlers.
//!
//! Individual handler functions for each bot command. Each handler receives a
//! [`CommandContext`](crate::commands::CommandContext) and the services it
//! needs, and returns a [`CommandResult`](crate::commands::CommandResult).
//!
//! # Handler Pattern
//!
//! Handlers follow a consistent pattern:
//! 1. Resolve the users or the group the command is about
//! 2. Gather the information from the directory, the release catalog or the ledger
//! 3. Return a result with the Markdown response, or a
//!    [`CommandError`](crate::commands::CommandError)
//!
//! # Available Handlers
//!
//! - [`handle_help`] - Display help information
//! - [`handle_hello`], [`handle_info`], [`handle_localtime`] - User lookups
//! - [`handle_group_info`], [`handle_group_memberships`] - Group lookups
//! - [`handle_cookie_give`], [`handle_cookie_count`] - Cookie ledger

mod cookie;
mod group;
mod help;
mod user;

pub use crate::commands::actions::{
    cookie::{handle_cookie_count, handle_cookie_give},
    group::{handle_group_info, handle_group_memberships},
    help::handle_help,
    user::{handle_hello, handle_info, handle_localtime},
};
