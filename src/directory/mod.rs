//! Fedora Accounts directory integration.
//!
//! The directory (FASJSON) is the system of record for users and groups. The
//! bot only reads from it and never caches its answers beyond a single
//! command.
//!
//! # Modules
//!
//! - `client` - [`DirectoryClient`] trait and its HTTP implementation [`FasJsonClient`]
//! - `structs` - Users and groups as returned by the directory

mod client;
mod structs;

#[cfg(test)]
pub use crate::directory::client::MockDirectoryClient;
pub use crate::directory::client::{DirectoryClient, FasJsonClient};
pub use crate::directory::structs::{DirectoryUser, Group, MembershipKind};
