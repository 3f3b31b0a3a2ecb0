//! Command model and parsing.
//!
//! A message reaches the bot in one of three shapes, tried in this order:
//!
//! 1. An explicit command starting with the configured prefix, e.g.
//!    `!user info dummy` or one of its aliases like `!fasinfo dummy`
//! 2. A mention followed by `++`, e.g. `Foo Bar: ++` where `Foo Bar` is a
//!    mention of `@foobar:example.com`
//! 3. A bare `name++` anywhere in the message, e.g. `thanks foobar++`
//!
//! Explicit commands are tokenized with [`command_parser`]. An unknown
//! command name is not an error: the message may still contain an
//! increment, and other bots in the room may own the command.

use std::sync::LazyLock;

use command_parser::{Command as ParserCommand, Parser};
use log::debug;
use regex::Regex;

use crate::{
    commands::markdown_response::{format_invalid_cookie, format_invalid_group, format_invalid_user},
    directory::MembershipKind,
    message::ChatMessage,
};

/// `name++` preceded by the start of the message or a character that cannot
/// be part of a username.
static INCREMENT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^A-Za-z0-9_.-])([A-Za-z0-9_][A-Za-z0-9_.-]*)\+\+")
        .expect("increment regex is valid")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    /// Greets a user, the sender when no name is given
    Hello(Option<String>),
    /// Shows the profile of a user
    Info(Option<String>),
    /// Shows the local time of a user
    LocalTime(Option<String>),
    GroupInfo(String),
    GroupMemberships(String, MembershipKind),
    /// Gives a cookie, the name is a username, a Matrix id or a mention text
    CookieGive(String),
    CookieCount(Option<String>),
}

#[derive(Debug, PartialEq, Eq)]
pub enum CommandParsingError {
    UnableToParse,
    Unknown,
    InvalidUser,
    InvalidGroup,
    InvalidCookie,
}

impl Command {
    /// Parses a message prefixed with the command prefix.
    ///
    /// Only the first line is a command, the next lines are free text.
    pub fn parse(parser: &Parser, body: &str) -> Result<Self, CommandParsingError> {
        let first_line = body.trim().lines().next().unwrap_or_default();
        // For an unknown reason the parser ignores the last word, so we add a dummy word at the end
        let body = first_line.trim().to_string() + " dummy";

        // This is normal to fail if the message is not a command
        let command = match parser.parse(&body) {
            Ok(cmd) => cmd,
            Err(_) => return Err(CommandParsingError::UnableToParse),
        };

        debug!("Parsing command: {:?}", command);

        let arguments: Vec<&str> = command.arguments.iter().map(String::as_str).collect();

        match command.name.to_lowercase().as_str() {
            "help" => Ok(Command::Help),
            "user" => Self::parse_user(&command),
            "hi" | "hello" | "hello2" | "hellomynameis" => {
                reject_options(&command, CommandParsingError::InvalidUser)?;
                Ok(Command::Hello(join(&arguments)))
            }
            "fasinfo" => {
                reject_options(&command, CommandParsingError::InvalidUser)?;
                Ok(Command::Info(join(&arguments)))
            }
            "localtime" => {
                reject_options(&command, CommandParsingError::InvalidUser)?;
                Ok(Command::LocalTime(join(&arguments)))
            }
            "group" => Self::parse_group(&command),
            "cookie" => Self::parse_cookie(&command),
            _ => Err(CommandParsingError::Unknown),
        }
    }

    fn parse_user(command: &ParserCommand) -> Result<Self, CommandParsingError> {
        reject_options(command, CommandParsingError::InvalidUser)?;
        let Some((subcommand, name)) = split_subcommand(command) else {
            return Err(CommandParsingError::InvalidUser);
        };

        match subcommand.as_str() {
            "hello" => Ok(Command::Hello(name)),
            "info" => Ok(Command::Info(name)),
            "localtime" => Ok(Command::LocalTime(name)),
            _ => Err(CommandParsingError::InvalidUser),
        }
    }

    fn parse_group(command: &ParserCommand) -> Result<Self, CommandParsingError> {
        reject_options(command, CommandParsingError::InvalidGroup)?;
        // 2 arguments: sub command and group name
        let Some((subcommand, Some(groupname))) = split_subcommand(command) else {
            return Err(CommandParsingError::InvalidGroup);
        };
        if groupname.contains(' ') {
            return Err(CommandParsingError::InvalidGroup);
        }

        match subcommand.as_str() {
            "info" => Ok(Command::GroupInfo(groupname)),
            "members" => Ok(Command::GroupMemberships(groupname, MembershipKind::Members)),
            "sponsors" => Ok(Command::GroupMemberships(groupname, MembershipKind::Sponsors)),
            _ => Err(CommandParsingError::InvalidGroup),
        }
    }

    fn parse_cookie(command: &ParserCommand) -> Result<Self, CommandParsingError> {
        reject_options(command, CommandParsingError::InvalidCookie)?;
        let Some((subcommand, name)) = split_subcommand(command) else {
            return Err(CommandParsingError::InvalidCookie);
        };

        match (subcommand.as_str(), name) {
            ("give", Some(name)) => Ok(Command::CookieGive(name)),
            ("count", name) => Ok(Command::CookieCount(name)),
            _ => Err(CommandParsingError::InvalidCookie),
        }
    }

    /// Finds a cookie increment in a message that is not an explicit command.
    ///
    /// A mention followed by `++` gives a cookie to the mentioned Matrix id.
    /// Otherwise the first `name++` gives a cookie to `name`.
    pub fn parse_increment(message: &ChatMessage) -> Option<Self> {
        for mention in message.mentions() {
            if mention.display.is_empty() {
                continue;
            }
            // The mention must start a word, like the bare names
            let pattern = format!(r"(?:^|\W){}:?\s*\+\+", regex::escape(&mention.display));
            let Ok(regex) = Regex::new(&pattern) else {
                continue;
            };
            if regex.is_match(&message.body) {
                debug!("increment of mention {}", mention.identity);
                return Some(Command::CookieGive(mention.identity));
            }
        }

        let captures = INCREMENT_REGEX.captures(&message.body)?;
        debug!("increment of {}", &captures[1]);
        Some(Command::CookieGive(captures[1].to_owned()))
    }

    /// Whether the handler of this command needs the members of the room.
    pub fn needs_room_members(&self) -> bool {
        matches!(self, Command::GroupMemberships(_, _))
    }
}

/// Fails with `error` when the command carries `-option` words.
///
/// The parser takes them out of the arguments, so a name like `-dummy`
/// would silently vanish.
fn reject_options(
    command: &ParserCommand,
    error: CommandParsingError,
) -> Result<(), CommandParsingError> {
    if command.options.is_empty() && command.parameters.is_empty() {
        Ok(())
    } else {
        Err(error)
    }
}

/// Splits the arguments into a lowercase sub command and an optional name.
///
/// Names may contain spaces when they are the display text of a mention.
fn split_subcommand(command: &ParserCommand) -> Option<(String, Option<String>)> {
    let (subcommand, rest) = command.arguments.split_first()?;
    let rest: Vec<&str> = rest.iter().map(String::as_str).collect();
    Some((subcommand.to_lowercase(), join(&rest)))
}

fn join(arguments: &[&str]) -> Option<String> {
    let name = arguments.join(" ");
    match name.trim() {
        "" => None,
        name => Some(name.to_owned()),
    }
}

pub fn format_command_error(error: CommandParsingError, prefix: char) -> Option<String> {
    match error {
        CommandParsingError::InvalidUser => Some(format_invalid_user(prefix)),
        CommandParsingError::InvalidGroup => Some(format_invalid_group(prefix)),
        CommandParsingError::InvalidCookie => Some(format_invalid_cookie(prefix)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::strip_reply_fallback;

    fn create_parser() -> Parser {
        Parser::new('!', '-')
    }

    fn message(body: &str, html: Option<&str>) -> ChatMessage {
        let mut message = ChatMessage::new(body, "@dummy:example.com", "!room:example.com");
        message.formatted_body = html.map(str::to_owned);
        message
    }

    #[test]
    fn test_parse_help_command() {
        let result = Command::parse(&create_parser(), "!help");
        assert_eq!(result, Ok(Command::Help));
    }

    #[test]
    fn test_parse_user_hello() {
        let parser = create_parser();
        assert_eq!(Command::parse(&parser, "!user hello"), Ok(Command::Hello(None)));
        assert_eq!(
            Command::parse(&parser, "!user hello dummy2"),
            Ok(Command::Hello(Some("dummy2".to_owned())))
        );
    }

    #[test]
    fn test_parse_hello_aliases() {
        let parser = create_parser();
        for alias in ["hi", "hello", "hello2", "hellomynameis"] {
            assert_eq!(
                Command::parse(&parser, &format!("!{}", alias)),
                Ok(Command::Hello(None))
            );
            assert_eq!(
                Command::parse(&parser, &format!("!{} dummy2", alias)),
                Ok(Command::Hello(Some("dummy2".to_owned())))
            );
        }
    }

    #[test]
    fn test_parse_hello_with_mention_text() {
        assert_eq!(
            Command::parse(&create_parser(), "!hello Foo Bar"),
            Ok(Command::Hello(Some("Foo Bar".to_owned())))
        );
    }

    #[test]
    fn test_parse_info_and_localtime() {
        let parser = create_parser();
        assert_eq!(
            Command::parse(&parser, "!user info dummy"),
            Ok(Command::Info(Some("dummy".to_owned())))
        );
        assert_eq!(
            Command::parse(&parser, "!fasinfo dummy"),
            Ok(Command::Info(Some("dummy".to_owned())))
        );
        assert_eq!(
            Command::parse(&parser, "!user localtime"),
            Ok(Command::LocalTime(None))
        );
        assert_eq!(
            Command::parse(&parser, "!localtime dummy"),
            Ok(Command::LocalTime(Some("dummy".to_owned())))
        );
    }

    #[test]
    fn test_parse_command_name_is_case_insensitive() {
        assert_eq!(
            Command::parse(&create_parser(), "!FASINFO dummy"),
            Ok(Command::Info(Some("dummy".to_owned())))
        );
    }

    #[test]
    fn test_parse_group_commands() {
        let parser = create_parser();
        assert_eq!(
            Command::parse(&parser, "!group info dummygroup"),
            Ok(Command::GroupInfo("dummygroup".to_owned()))
        );
        assert_eq!(
            Command::parse(&parser, "!group members dummygroup"),
            Ok(Command::GroupMemberships(
                "dummygroup".to_owned(),
                MembershipKind::Members
            ))
        );
        assert_eq!(
            Command::parse(&parser, "!group sponsors dummygroup"),
            Ok(Command::GroupMemberships(
                "dummygroup".to_owned(),
                MembershipKind::Sponsors
            ))
        );
    }

    #[test]
    fn test_parse_invalid_group_commands() {
        let parser = create_parser();
        assert_eq!(
            Command::parse(&parser, "!group members"),
            Err(CommandParsingError::InvalidGroup)
        );
        assert_eq!(
            Command::parse(&parser, "!group"),
            Err(CommandParsingError::InvalidGroup)
        );
        assert_eq!(
            Command::parse(&parser, "!group delete dummygroup"),
            Err(CommandParsingError::InvalidGroup)
        );
    }

    #[test]
    fn test_parse_cookie_commands() {
        let parser = create_parser();
        assert_eq!(
            Command::parse(&parser, "!cookie give foobar"),
            Ok(Command::CookieGive("foobar".to_owned()))
        );
        assert_eq!(
            Command::parse(&parser, "!cookie count"),
            Ok(Command::CookieCount(None))
        );
        assert_eq!(
            Command::parse(&parser, "!cookie give"),
            Err(CommandParsingError::InvalidCookie)
        );
    }

    #[test]
    fn test_parse_invalid_user_command() {
        assert_eq!(
            Command::parse(&create_parser(), "!user delete dummy"),
            Err(CommandParsingError::InvalidUser)
        );
    }

    #[test]
    fn test_parse_unknown_command() {
        assert_eq!(
            Command::parse(&create_parser(), "!deploy now"),
            Err(CommandParsingError::Unknown)
        );
    }

    #[test]
    fn test_parse_not_a_command() {
        let result = Command::parse(&create_parser(), "This is just a regular message");
        assert!(matches!(
            result,
            Err(CommandParsingError::UnableToParse) | Err(CommandParsingError::Unknown)
        ));
    }

    #[test]
    fn test_parse_bare_increments() {
        let cases = [
            ("foobar++", Some("foobar")),
            ("do a foobar++ now", Some("foobar")),
            ("foobar++ well done!", Some("foobar")),
            ("thanks Foo.Bar-2++", Some("Foo.Bar-2")),
            ("foobar ++", None),
            ("x=foobar++", Some("foobar")),
            ("thanks,foobar++", Some("foobar")),
            ("(foobar++)", Some("foobar")),
            ("@foobar++", Some("foobar")),
            ("great job:foobar++", Some("foobar")),
            ("no increment here", None),
        ];

        for (body, expected) in cases {
            assert_eq!(
                Command::parse_increment(&message(body, None)),
                expected.map(|name| Command::CookieGive(name.to_owned())),
                "body: {}",
                body
            );
        }
    }

    #[test]
    fn test_parse_mention_increments() {
        let cases = [
            (
                "Foo Bar++",
                r#"<a href="https://matrix.to/#/@foobar:example.com">Foo Bar</a>++"#,
            ),
            (
                "Foo Bar:++",
                r#"<a href="https://matrix.to/#/@foobar:example.com">Foo Bar</a>:++"#,
            ),
            (
                "Foo Bar: ++",
                r#"<a href="https://matrix.to/#/@foobar:example.com">Foo Bar</a>: ++"#,
            ),
        ];

        for (body, html) in cases {
            assert_eq!(
                Command::parse_increment(&message(body, Some(html))),
                Some(Command::CookieGive("@foobar:example.com".to_owned())),
                "body: {}",
                body
            );
        }
    }

    #[test]
    fn test_mention_without_increment_falls_back_to_bare_name() {
        let html = r#"<a href="https://matrix.to/#/@foobar:example.com">Foo Bar</a> and dummy++"#;
        assert_eq!(
            Command::parse_increment(&message("Foo Bar and dummy++", Some(html))),
            Some(Command::CookieGive("dummy".to_owned()))
        );
    }

    #[test]
    fn test_replied_increment_is_not_given_again() {
        let body = strip_reply_fallback("> <@alice:example.com> thanks bob++\n\nhaha nice");
        let message = ChatMessage::new(body, "@carol:example.com", "!room:example.com");
        assert_eq!(Command::parse_increment(&message), None);
    }

    #[test]
    fn test_mention_must_start_a_word() {
        let html = r#"<a href="https://matrix.to/#/@bar:example.com">Bar</a> says FooBar++"#;
        assert_eq!(
            Command::parse_increment(&message("Bar says FooBar++", Some(html))),
            Some(Command::CookieGive("FooBar".to_owned()))
        );
    }

    #[test]
    fn test_parse_only_first_line() {
        let parser = create_parser();
        assert_eq!(
            Command::parse(&parser, "!cookie give foobar\nthanks a lot"),
            Ok(Command::CookieGive("foobar".to_owned()))
        );
        assert_eq!(
            Command::parse(&parser, "!hello\nhow are you?"),
            Ok(Command::Hello(None))
        );
    }

    #[test]
    fn test_parse_rejects_options() {
        let parser = create_parser();
        assert_eq!(
            Command::parse(&parser, "!hello -dummy"),
            Err(CommandParsingError::InvalidUser)
        );
        assert_eq!(
            Command::parse(&parser, "!user info -dummy"),
            Err(CommandParsingError::InvalidUser)
        );
        assert_eq!(
            Command::parse(&parser, "!group members -dummygroup"),
            Err(CommandParsingError::InvalidGroup)
        );
        assert_eq!(
            Command::parse(&parser, "!cookie give -foobar"),
            Err(CommandParsingError::InvalidCookie)
        );
    }

    #[test]
    fn test_format_command_error() {
        assert!(format_command_error(CommandParsingError::InvalidCookie, '!')
            .unwrap()
            .contains("Usage:"));
        assert!(format_command_error(CommandParsingError::Unknown, '!').is_none());
        assert!(format_command_error(CommandParsingError::UnableToParse, '!').is_none());
    }

    #[test]
    fn test_needs_room_members() {
        assert!(
            Command::GroupMemberships("g".to_owned(), MembershipKind::Sponsors)
                .needs_room_members()
        );
        assert!(!Command::Help.needs_room_members());
    }
}
