//! Matrix transport of the bot.
//!
//! # Modules
//!
//! - `client` - [`MatrixClient`], replies and room members
//! - `login` - Password login and session restoration
//! - `session` - Session files in the data directory
//! - `sync` - Sync loop, auto join and message forwarding

mod client;
mod login;
mod session;
mod sync;

pub use crate::matrix::client::MatrixClient;

/// User credentials for a Matrix account
#[derive(Debug, Clone)]
pub struct UserCredentials {
    /// User ID of the matrix account
    pub user_id: String,
    /// Password of the matrix account
    pub password: String,
    /// Passphrase encrypting the local store
    pub passphrase: String,
}
