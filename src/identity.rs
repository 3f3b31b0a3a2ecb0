//! Resolution of chat identifiers to directory users.
//!
//! Users refer to each other in three ways: with a directory username
//! (`dummy`), with a raw Matrix id (`@dummy:example.com`) or with a mention
//! whose display text hides the Matrix id (`Dummy User`). [`resolve_user`]
//! turns any of them into a [`DirectoryUser`].
//!
//! Directory users register their chat accounts in their `ircnicks` field:
//! `matrix://example.com/dummy` for `@dummy:example.com`, or `matrix:/dummy`
//! for an account on the home server.

use log::debug;

use crate::{
    directory::{DirectoryClient, DirectoryUser},
    error::InfoGatherError,
    message::ChatMessage,
};

const DIRECTORY_SERVICE: &str = "Fedora Accounts";

/// Splits `@localpart:server` into `(localpart, server)`.
pub fn split_matrix_id(matrix_id: &str) -> Option<(&str, &str)> {
    let (localpart, server) = matrix_id.strip_prefix('@')?.split_once(':')?;
    if localpart.is_empty() || server.is_empty() {
        return None;
    }
    Some((localpart, server))
}

/// Whether the token is a full Matrix user id.
pub fn is_matrix_id(token: &str) -> bool {
    split_matrix_id(token).is_some()
}

/// Converts a Matrix id into the chat account registered in the directory.
///
/// `@dummy:example.com` becomes `matrix://example.com/dummy`.
pub fn matrix_id_to_ircnick(matrix_id: &str) -> Option<String> {
    let (localpart, server) = split_matrix_id(matrix_id)?;
    Some(format!("matrix://{}/{}", server, localpart))
}

/// Converts a chat account registered in the directory into a Matrix id.
///
/// Accounts without server (`matrix:/dummy`) live on the home server. Non
/// Matrix accounts (`irc:/dummy`) have no Matrix id.
pub fn ircnick_to_matrix_id(ircnick: &str, home_server: &str) -> Option<String> {
    let location = ircnick.strip_prefix("matrix:/")?;
    let (server, localpart) = match location.strip_prefix('/') {
        Some(remote) => remote.split_once('/')?,
        None => (home_server, location),
    };
    if server.is_empty() || localpart.is_empty() {
        return None;
    }
    Some(format!("@{}:{}", localpart, server))
}

/// Finds the Matrix id the token refers to, if any.
///
/// The token is either a Matrix id itself, or the display text of a mention
/// in the message. When the mentions of the message carry no display text at
/// all, the first one is used.
pub fn get_matrix_id(token: &str, message: &ChatMessage) -> Option<String> {
    if is_matrix_id(token) {
        return Some(token.to_owned());
    }

    let mentions = message.mentions();
    let token = token.trim();

    if let Some(mention) = mentions
        .iter()
        .find(|m| !m.display.is_empty() && m.display.eq_ignore_ascii_case(token))
    {
        return Some(mention.identity.clone());
    }

    if mentions.iter().all(|m| m.display.is_empty()) {
        return mentions.into_iter().next().map(|m| m.identity);
    }

    None
}

/// Resolves a token of a command to a directory user.
///
/// Without token, the sender of the message is resolved.
///
/// # Errors
///
/// - [`InfoGatherError::NoMatchingIdentity`] when no user registered the Matrix id
/// - [`InfoGatherError::UserNotFound`] when the username does not exist
/// - [`InfoGatherError::ServiceUnavailable`] when the directory cannot be reached
pub async fn resolve_user<D: DirectoryClient>(
    directory: &D,
    token: Option<&str>,
    message: &ChatMessage,
    home_server: &str,
) -> Result<DirectoryUser, InfoGatherError> {
    let Some(token) = token else {
        debug!("resolving sender {}", message.sender);
        return resolve_matrix_id(directory, &message.sender, home_server).await;
    };

    if let Some(matrix_id) = get_matrix_id(token, message) {
        debug!("resolving {} as matrix id {}", token, matrix_id);
        return resolve_matrix_id(directory, &matrix_id, home_server).await;
    }

    debug!("resolving {} as username", token);
    get_user(directory, token).await
}

/// Fetches a user by username.
pub async fn get_user<D: DirectoryClient>(
    directory: &D,
    username: &str,
) -> Result<DirectoryUser, InfoGatherError> {
    directory
        .get_user(username)
        .await
        .map_err(|e| InfoGatherError::unavailable(DIRECTORY_SERVICE, e))?
        .ok_or_else(|| InfoGatherError::UserNotFound(username.to_owned()))
}

/// Finds the directory user owning a Matrix id.
///
/// Accounts of the home server share their localpart with the directory
/// username. Other accounts are searched through the chat accounts users
/// registered, the first match wins.
async fn resolve_matrix_id<D: DirectoryClient>(
    directory: &D,
    matrix_id: &str,
    home_server: &str,
) -> Result<DirectoryUser, InfoGatherError> {
    let not_found = || InfoGatherError::NoMatchingIdentity(matrix_id.to_owned());

    let Some((localpart, server)) = split_matrix_id(matrix_id) else {
        return Err(not_found());
    };

    if server == home_server {
        return directory
            .get_user(localpart)
            .await
            .map_err(|e| InfoGatherError::unavailable(DIRECTORY_SERVICE, e))?
            .ok_or_else(not_found);
    }

    let ircnick = matrix_id_to_ircnick(matrix_id).ok_or_else(not_found)?;
    let users = directory
        .search_users_by_ircnick(&ircnick)
        .await
        .map_err(|e| InfoGatherError::unavailable(DIRECTORY_SERVICE, e))?;

    if users.len() > 1 {
        debug!("{} users registered {}, using the first one", users.len(), ircnick);
    }

    users.into_iter().next().ok_or_else(not_found)
}
