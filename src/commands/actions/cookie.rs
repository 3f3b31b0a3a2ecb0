//! Cookie handlers: `cookie give`, `name++` and `cookie count`.

use anyhow::Context;
use log::debug;
use tokio::task::spawn_blocking;

use crate::{
    commands::{
        CommandContext, CommandError, CommandResult,
        markdown_response::{format_cookie_already_given, format_cookie_count, format_cookie_given},
    },
    cookies::{CookieLedger, GiveOutcome},
    directory::DirectoryClient,
    identity::resolve_user,
    releases::{ReleaseClient, current_period},
};

/// Gives a cookie from the sender to the user named `name`.
///
/// Both users are resolved before the release catalog is queried, and
/// nothing is written unless every lookup succeeded.
///
/// # Arguments
///
/// * `directory` - Directory client used to resolve both users
/// * `releases` - Release catalog client
/// * `ledger` - Cookie ledger
/// * `context` - Context of the message
/// * `name` - Username, Matrix id or mention text of the recipient
/// * `home_server` - Matrix server whose accounts are directory accounts
/// * `primary_release_prefix` - Update id prefix of the main distribution
pub async fn handle_cookie_give<D: DirectoryClient, R: ReleaseClient>(
    directory: &D,
    releases: &R,
    ledger: &CookieLedger,
    context: &CommandContext,
    name: &str,
    home_server: &str,
    primary_release_prefix: &str,
) -> Result<CommandResult, CommandError> {
    debug!("handling cookie give command");

    let (giver, recipient) = futures::try_join!(
        resolve_user(directory, None, &context.message, home_server),
        resolve_user(directory, Some(name), &context.message, home_server),
    )?;

    let period = current_period(releases, primary_release_prefix).await?;

    // SQLite calls block, keep them off the async workers
    let outcome = {
        let ledger = ledger.clone();
        let giver = giver.username.clone();
        let recipient = recipient.username.clone();
        let period = period.clone();
        spawn_blocking(move || ledger.give(&giver, &recipient, &period))
            .await
            .context("cookie give task failed")??
    };

    let response = match outcome {
        GiveOutcome::Recorded { total } => format_cookie_given(&recipient.username, total),
        GiveOutcome::AlreadyGiven => {
            format_cookie_already_given(&recipient.username, &period.label())
        }
    };

    Ok(CommandResult::markdown(response))
}

/// Shows how many cookies a user received, the sender when no name is given.
pub async fn handle_cookie_count<D: DirectoryClient>(
    directory: &D,
    ledger: &CookieLedger,
    context: &CommandContext,
    name: Option<&str>,
    home_server: &str,
) -> Result<CommandResult, CommandError> {
    debug!("handling cookie count command");

    let user = resolve_user(directory, name, &context.message, home_server).await?;
    let total = {
        let ledger = ledger.clone();
        let username = user.username.clone();
        spawn_blocking(move || ledger.count(&username))
            .await
            .context("cookie count task failed")??
    };

    Ok(CommandResult::markdown(format_cookie_count(&user.username, total)))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use chrono::Utc;

    use super::*;
    use crate::{
        directory::{DirectoryUser, MockDirectoryClient},
        error::{InfoGatherError, ServiceError},
        message::ChatMessage,
        releases::{MockReleaseClient, ReleasePeriod},
    };

    const HOME_SERVER: &str = "fedora.im";

    fn create_context(body: &str) -> CommandContext {
        CommandContext {
            message: ChatMessage::new(body, "@dummy:example.com", "!room:example.com"),
            joined_members: HashSet::new(),
            now: Utc::now(),
        }
    }

    fn user(username: &str) -> DirectoryUser {
        DirectoryUser {
            username: username.to_owned(),
            ..Default::default()
        }
    }

    /// `dummy` is the sender, `foobar` exists.
    fn create_directory() -> MockDirectoryClient {
        let mut directory = MockDirectoryClient::new();
        directory
            .expect_search_users_by_ircnick()
            .returning(|ircnick| match ircnick.rsplit('/').next() {
                Some(username) => Ok(vec![user(username)]),
                None => Ok(vec![]),
            });
        directory.expect_get_user().returning(|username| match username {
            "dummy" | "foobar" => Ok(Some(user(username))),
            _ => Ok(None),
        });
        directory
    }

    fn create_releases(name: Option<&str>) -> MockReleaseClient {
        let name = name.map(str::to_owned);
        let mut releases = MockReleaseClient::new();
        releases.expect_get_current_releases().returning(move || {
            Ok(vec![ReleasePeriod {
                name: name.clone(),
                long_name: None,
                version: "38".to_owned(),
                id_prefix: "FEDORA".to_owned(),
                eol: None,
            }])
        });
        releases
    }

    #[tokio::test]
    async fn test_give_cookie() {
        let ledger = CookieLedger::in_memory().unwrap();
        let result = handle_cookie_give(
            &create_directory(),
            &create_releases(Some("F38")),
            &ledger,
            &create_context("foobar++"),
            "foobar",
            HOME_SERVER,
            "FEDORA",
        )
        .await
        .unwrap();

        assert_eq!(result.response, "foobar has 1 cookie(s)");
    }

    #[tokio::test]
    async fn test_give_cookie_twice() {
        let ledger = CookieLedger::in_memory().unwrap();
        let directory = create_directory();
        let releases = create_releases(None);
        let context = create_context("foobar++");

        for expected in [
            "foobar has 1 cookie(s)",
            "You have already given cookies to foobar during the F38 timeframe",
        ] {
            let result = handle_cookie_give(
                &directory, &releases, &ledger, &context, "foobar", HOME_SERVER, "FEDORA",
            )
            .await
            .unwrap();
            assert_eq!(result.response, expected);
        }
        assert_eq!(ledger.count("foobar").unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_gives_record_one_cookie() {
        let ledger = CookieLedger::in_memory().unwrap();
        let directory = create_directory();
        let releases = create_releases(Some("F38"));
        let context = create_context("foobar++");

        let gives = (0..8).map(|_| {
            handle_cookie_give(
                &directory, &releases, &ledger, &context, "foobar", HOME_SERVER, "FEDORA",
            )
        });
        let responses: Vec<String> = futures::future::join_all(gives)
            .await
            .into_iter()
            .map(|result| result.unwrap().response)
            .collect();

        let recorded = responses
            .iter()
            .filter(|response| *response == "foobar has 1 cookie(s)")
            .count();
        assert_eq!(recorded, 1);
        assert_eq!(ledger.count("foobar").unwrap(), 1);
    }

    #[tokio::test]
    async fn test_give_cookie_to_mention() {
        let ledger = CookieLedger::in_memory().unwrap();
        let result = handle_cookie_give(
            &create_directory(),
            &create_releases(Some("F38")),
            &ledger,
            &create_context("Foo Bar++"),
            "@foobar:example.com",
            HOME_SERVER,
            "FEDORA",
        )
        .await
        .unwrap();

        assert_eq!(result.response, "foobar has 1 cookie(s)");
    }

    #[tokio::test]
    async fn test_give_cookie_unknown_recipient_writes_nothing() {
        let ledger = CookieLedger::in_memory().unwrap();
        let mut releases = MockReleaseClient::new();
        releases.expect_get_current_releases().never();

        let error = handle_cookie_give(
            &create_directory(),
            &releases,
            &ledger,
            &create_context("nobody++"),
            "nobody",
            HOME_SERVER,
            "FEDORA",
        )
        .await
        .unwrap_err();

        assert_eq!(
            error.to_string(),
            "Sorry, but Fedora Accounts user 'nobody' does not exist"
        );
        assert_eq!(ledger.count("nobody").unwrap(), 0);
    }

    #[tokio::test]
    async fn test_give_cookie_release_unavailable() {
        let ledger = CookieLedger::in_memory().unwrap();
        let mut releases = MockReleaseClient::new();
        releases
            .expect_get_current_releases()
            .returning(|| Err(ServiceError::Timeout));

        let error = handle_cookie_give(
            &create_directory(),
            &releases,
            &ledger,
            &create_context("foobar++"),
            "foobar",
            HOME_SERVER,
            "FEDORA",
        )
        .await
        .unwrap_err();

        assert!(matches!(
            error,
            CommandError::Gather(InfoGatherError::ServiceUnavailable { .. })
        ));
        assert_eq!(ledger.count("foobar").unwrap(), 0);
    }

    #[tokio::test]
    async fn test_cookie_count() {
        let ledger = CookieLedger::in_memory().unwrap();
        let directory = create_directory();
        let context = create_context("!cookie count");

        let result = handle_cookie_count(&directory, &ledger, &context, Some("foobar"), HOME_SERVER)
            .await
            .unwrap();
        assert_eq!(result.response, "foobar has 0 cookie(s)");

        handle_cookie_give(
            &directory,
            &create_releases(Some("F38")),
            &ledger,
            &context,
            "foobar",
            HOME_SERVER,
            "FEDORA",
        )
        .await
        .unwrap();

        let result = handle_cookie_count(&directory, &ledger, &context, Some("foobar"), HOME_SERVER)
            .await
            .unwrap();
        assert_eq!(result.response, "foobar has 1 cookie(s)");
    }

    #[tokio::test]
    async fn test_cookie_count_of_sender() {
        let ledger = CookieLedger::in_memory().unwrap();
        let result = handle_cookie_count(
            &create_directory(),
            &ledger,
            &create_context("!cookie count"),
            None,
            HOME_SERVER,
        )
        .await
        .unwrap();
        assert_eq!(result.response, "dummy has 0 cookie(s)");
    }
}
