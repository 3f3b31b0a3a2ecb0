//! Inbound chat messages and the mentions embedded in them.
//!
//! Matrix clients render a mention as the display name of the user but embed
//! the real Matrix id in the HTML `formatted_body` as a `matrix.to` link:
//!
//! ```html
//! <a href="https://matrix.to/#/@foobar:example.com">Foo Bar</a>++
//! ```
//!
//! [`parse_mentions`] turns that markup into a flat list of
//! [`MentionReference`]s so the command router and the identity resolver
//! never have to look at HTML themselves.
//!
//! Replies carry a quote of the original message, the reply fallback. It is
//! removed with [`strip_reply_fallback`] and [`strip_html_reply_fallback`]
//! so a quoted `name++` is not counted twice.

use std::sync::LazyLock;

use regex::Regex;

/// Matches `matrix.to` links. The closing `</a>` is optional because some
/// clients send truncated markup.
static MENTION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<a\s[^>]*href\s*=\s*["']https://matrix\.to/#/([^"'?]+)[^"']*["'][^>]*>([^<]*)"#)
        .expect("mention regex is valid")
});

/// Matches the `<mx-reply>` block quoting the replied message.
static HTML_REPLY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<mx-reply>.*?</mx-reply>").expect("reply regex is valid")
});

/// A text message received in a Matrix room.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatMessage {
    /// Plain text body
    pub body: String,
    /// HTML body, if the client sent one
    pub formatted_body: Option<String>,
    /// Matrix user id of the sender
    pub sender: String,
    /// Matrix room id where the message was sent
    pub room_id: String,
    /// Matrix event id of the message
    pub event_id: String,
}

/// A mention found in the formatted body of a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentionReference {
    /// Text displayed for the mention, usually the display name
    pub display: String,
    /// Matrix id the mention points to
    pub identity: String,
}

impl ChatMessage {
    /// Creates a plain text message without formatted body.
    pub fn new(body: &str, sender: &str, room_id: &str) -> Self {
        ChatMessage {
            body: body.to_owned(),
            formatted_body: None,
            sender: sender.to_owned(),
            room_id: room_id.to_owned(),
            event_id: String::new(),
        }
    }

    /// Returns the mentions of the formatted body, in document order.
    pub fn mentions(&self) -> Vec<MentionReference> {
        self.formatted_body
            .as_deref()
            .map(parse_mentions)
            .unwrap_or_default()
    }
}

/// Extracts every `matrix.to` user mention from an HTML body.
///
/// Links to rooms (`#alias` or `!room`) are ignored.
pub fn parse_mentions(html: &str) -> Vec<MentionReference> {
    MENTION_REGEX
        .captures_iter(html)
        .filter_map(|captures| {
            let identity = decode_identity(&captures[1]);
            if !identity.starts_with('@') {
                return None;
            }
            Some(MentionReference {
                display: captures[2].trim().to_owned(),
                identity,
            })
        })
        .collect()
}

/// Removes the reply fallback from a plain text body.
///
/// The fallback is a block of `> ` lines starting with `> <@sender>`,
/// followed by an empty line. Bodies quoting something else are kept as is.
pub fn strip_reply_fallback(body: &str) -> &str {
    if !body.starts_with("> <") {
        return body;
    }

    let mut rest = body;
    while rest.starts_with('>') {
        match rest.split_once('\n') {
            Some((_, next)) => rest = next,
            None => return "",
        }
    }
    rest.strip_prefix('\n').unwrap_or(rest)
}

/// Removes the `<mx-reply>` fallback from an HTML body.
pub fn strip_html_reply_fallback(html: &str) -> String {
    HTML_REPLY_REGEX.replace_all(html, "").into_owned()
}

fn decode_identity(raw: &str) -> String {
    raw.replace("%40", "@")
        .replace("%3A", ":")
        .replace("%3a", ":")
}
