//! Markdown response formatters for bot commands.
//!
//! Every function returns the exact text sent to the room. Responses that
//! mention users also come with an HTML rendering carrying `matrix.to`
//! links, see [`format_group_memberships`].

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::directory::{DirectoryUser, Group, MembershipKind};

/// Formats the help message showing available bot commands.
///
/// # Examples
///
/// ```
/// let help = format_help('!');
/// assert!(help.contains("Commands:"));
/// ```
pub fn format_help(prefix: char) -> String {
    format!(
        "Commands:\n\
        - `{p}user hello [name]`: say hello to a Fedora Accounts user (aliases: `{p}hi`, `{p}hello`, `{p}hello2`, `{p}hellomynameis`)\n\
        - `{p}user info [name]`: show the Fedora Accounts profile of a user (alias: `{p}fasinfo`)\n\
        - `{p}user localtime [name]`: show the local time of a user (alias: `{p}localtime`)\n\
        - `{p}group info <group>`: show information about a group\n\
        - `{p}group members <group>`: list the members of a group\n\
        - `{p}group sponsors <group>`: list the sponsors of a group\n\
        - `{p}cookie give <name>`: give a cookie to a user, also `<name>++`\n\
        - `{p}cookie count [name]`: show how many cookies a user received\n\
        - `{p}help`: show this help message\n\n\
        Without `name`, the command applies to you. A name is a Fedora Accounts username, a Matrix id or a mention.",
        p = prefix
    )
}

/// Usage reminder for a malformed `user` command.
pub fn format_invalid_user(prefix: char) -> String {
    format!(
        "Invalid user command. Usage: `{p}user hello [name]`, `{p}user info [name]` or `{p}user localtime [name]`",
        p = prefix
    )
}

/// Usage reminder for a malformed `group` command.
pub fn format_invalid_group(prefix: char) -> String {
    format!(
        "Invalid group command. Usage: `{p}group info <group>`, `{p}group members <group>` or `{p}group sponsors <group>`",
        p = prefix
    )
}

/// Usage reminder for a malformed `cookie` command.
pub fn format_invalid_cookie(prefix: char) -> String {
    format!(
        "Invalid cookie command. Usage: `{p}cookie give <name>` or `{p}cookie count [name]`",
        p = prefix
    )
}

/// Generic answer when a command failed for a reason the user can't act on.
pub fn format_internal_error() -> String {
    "Sorry, something went wrong".to_owned()
}

/// Formats a greeting: `Dummy User (dummy) - they / them or mx`.
///
/// Pronouns are only shown when the user set some.
pub fn format_hello(user: &DirectoryUser) -> String {
    let greeting = format!("{} ({})", user.display_name(), user.username);

    match user.pronouns.as_deref() {
        Some(pronouns) if !pronouns.is_empty() => {
            format!("{} - {}", greeting, pronouns.join(" or "))
        }
        _ => greeting,
    }
}

/// Formats the profile of a user.
///
/// Missing fields are shown as `None`, missing pronouns as `unset`.
pub fn format_user_info(user: &DirectoryUser) -> String {
    let pronouns = match user.pronouns.as_deref() {
        Some(pronouns) if !pronouns.is_empty() => pronouns.join(" or "),
        _ => "unset".to_owned(),
    };
    let gpgkeyids = match user.gpgkeyids.as_deref() {
        Some(keys) if !keys.is_empty() => keys.join(", "),
        _ => "None".to_owned(),
    };

    format!(
        "User: {},\n Name: {},\n Pronouns: {},\n Creation: {},\n Timezone: {},\n Locale: {},\n GPG Key IDs: {}",
        user.username,
        or_none(user.human_name.as_deref()),
        pronouns,
        or_none(user.creation.as_deref()),
        or_none(user.timezone.as_deref()),
        or_none(user.locale.as_deref()),
        gpgkeyids
    )
}

/// Formats the local time of a user at `now`.
///
/// # Arguments
///
/// * `user` - The user whose timezone is used
/// * `now` - Current instant
pub fn format_localtime(user: &DirectoryUser, now: DateTime<Utc>) -> String {
    let Some(timezone) = user.timezone.as_deref().filter(|tz| !tz.is_empty()) else {
        return format!("User \"{}\" doesn't share their timezone", user.username);
    };

    match timezone.parse::<Tz>() {
        Ok(tz) => format!(
            "The current local time of \"{}\" is: \"{}\" (timezone: {})",
            user.username,
            now.with_timezone(&tz).format("%H:%M"),
            timezone
        ),
        Err(_) => format!(
            "The timezone of \"{}\" was not understood: \"{}\"",
            user.username, timezone
        ),
    }
}

/// Formats the information of a group.
pub fn format_group_info(group: &Group) -> String {
    let chat = match group.irc.as_deref() {
        Some(channels) if !channels.is_empty() => channels.join(", "),
        _ => "None".to_owned(),
    };

    format!(
        "**Group Name:** {}\n **Description:** {}\n **URL:** {},\n **Mailing List:** {}\n **Chat:** {}",
        group.groupname,
        or_none(group.description.as_deref()),
        or_none(group.url.as_deref()),
        or_none(group.mailing_list.as_deref()),
        chat
    )
}

/// A group member as rendered in a membership list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberMention {
    /// Plain text rendering
    pub text: String,
    /// HTML rendering, with `matrix.to` links
    pub html: String,
}

/// Renders a member of a group.
///
/// - no Matrix id: the username
/// - one Matrix id, or exactly one of them in the room: a mention showing the display name
/// - several Matrix ids otherwise: the username followed by every Matrix id
///
/// # Arguments
///
/// * `user` - The member
/// * `matrix_ids` - Matrix ids the member registered
/// * `joined_members` - Matrix ids of the users in the room
pub fn format_member_mention(
    user: &DirectoryUser,
    matrix_ids: &[String],
    joined_members: &HashSet<String>,
) -> MemberMention {
    let in_room: Vec<&String> = matrix_ids
        .iter()
        .filter(|id| joined_members.contains(*id))
        .collect();

    let single = match (matrix_ids, in_room.as_slice()) {
        ([], _) => {
            return MemberMention {
                text: user.username.clone(),
                html: escape_html(&user.username),
            };
        }
        ([id], _) => Some(id),
        (_, [id]) => Some(*id),
        _ => None,
    };

    match single {
        Some(id) => MemberMention {
            text: user.display_name().to_owned(),
            html: mention_link(id, user.display_name()),
        },
        None => MemberMention {
            text: format!("{} ({})", user.username, matrix_ids.join(", ")),
            html: format!(
                "{} ({})",
                escape_html(&user.username),
                matrix_ids
                    .iter()
                    .map(|id| mention_link(id, id))
                    .collect::<Vec<String>>()
                    .join(", ")
            ),
        },
    }
}

/// Formats the members or the sponsors of a group.
///
/// Returns the plain text body and the HTML body.
pub fn format_group_memberships(
    kind: MembershipKind,
    groupname: &str,
    members: &[MemberMention],
) -> (String, String) {
    let text = members
        .iter()
        .map(|m| m.text.as_str())
        .collect::<Vec<&str>>()
        .join(", ");
    let html = members
        .iter()
        .map(|m| m.html.as_str())
        .collect::<Vec<&str>>()
        .join(", ");

    (
        format!("{} of {}: {}", kind.title(), groupname, text),
        format!("<p>{} of {}: {}</p>\n", kind.title(), escape_html(groupname), html),
    )
}

/// Formats the answer to a recorded cookie.
pub fn format_cookie_given(recipient: &str, total: u64) -> String {
    format!("{} has {} cookie(s)", recipient, total)
}

/// Formats the answer to a cookie already given during the release.
pub fn format_cookie_already_given(recipient: &str, release_label: &str) -> String {
    format!(
        "You have already given cookies to {} during the {} timeframe",
        recipient, release_label
    )
}

/// Formats the cookie count of a user.
pub fn format_cookie_count(user: &str, total: u64) -> String {
    format!("{} has {} cookie(s)", user, total)
}

fn or_none(value: Option<&str>) -> &str {
    value.filter(|v| !v.is_empty()).unwrap_or("None")
}

fn mention_link(matrix_id: &str, display: &str) -> String {
    format!(
        "<a href=\"https://matrix.to/#/{}\">{}</a>",
        matrix_id,
        escape_html(display)
    )
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
