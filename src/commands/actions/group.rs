//! Group lookup handlers: `group info`, `group members` and `group sponsors`.

use log::debug;

use crate::{
    commands::{
        CommandContext, CommandError, CommandResult,
        markdown_response::{format_group_info, format_group_memberships, format_member_mention},
    },
    directory::{DirectoryClient, MembershipKind},
    error::InfoGatherError,
    identity::ircnick_to_matrix_id,
};

const DIRECTORY_SERVICE: &str = "Fedora Accounts";

/// Shows the information of a group.
pub async fn handle_group_info<D: DirectoryClient>(
    directory: &D,
    groupname: &str,
) -> Result<CommandResult, CommandError> {
    debug!("handling group info command");

    let group = directory
        .get_group(groupname)
        .await
        .map_err(|e| InfoGatherError::unavailable(DIRECTORY_SERVICE, e))?
        .ok_or_else(|| InfoGatherError::GroupNotFound(groupname.to_owned()))?;

    Ok(CommandResult::markdown(format_group_info(&group)))
}

/// Lists the members or the sponsors of a group.
///
/// Members with a Matrix account are mentioned, see
/// [`format_member_mention`] for the rules. The response carries an HTML
/// body with the mentions.
pub async fn handle_group_memberships<D: DirectoryClient>(
    directory: &D,
    context: &CommandContext,
    groupname: &str,
    kind: MembershipKind,
    home_server: &str,
) -> Result<CommandResult, CommandError> {
    debug!("handling group {} command", kind.path());

    let users = directory
        .get_group_memberships(groupname, kind)
        .await
        .map_err(|e| InfoGatherError::unavailable(DIRECTORY_SERVICE, e))?
        .ok_or_else(|| InfoGatherError::GroupNotFound(groupname.to_owned()))?;

    let members: Vec<_> = users
        .iter()
        .map(|user| {
            let matrix_ids: Vec<String> = user
                .ircnicks
                .iter()
                .flatten()
                .filter_map(|ircnick| ircnick_to_matrix_id(ircnick, home_server))
                .collect();
            format_member_mention(user, &matrix_ids, &context.joined_members)
        })
        .collect();

    let (response, html_response) = format_group_memberships(kind, groupname, &members);

    Ok(CommandResult {
        response,
        html_response: Some(html_response),
    })
}
