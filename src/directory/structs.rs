//! Data structures returned by the FASJSON directory.

use serde::Deserialize;

/// Every FASJSON answer wraps its payload in a `result` field.
#[derive(Deserialize, Debug)]
pub struct FasJsonResponse<T> {
    pub result: T,
}

/// A Fedora Accounts user.
///
/// Only `username` is guaranteed, the other fields depend on what the user
/// chose to share.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryUser {
    /// Unique username of the account
    pub username: String,
    /// Full name
    #[serde(default)]
    pub human_name: Option<String>,
    /// Pronouns, in the order the user set them
    #[serde(default)]
    pub pronouns: Option<Vec<String>>,
    /// IANA timezone name, e.g. `Europe/Paris`
    #[serde(default)]
    pub timezone: Option<String>,
    /// Locale, e.g. `en-US`
    #[serde(default)]
    pub locale: Option<String>,
    /// Account creation timestamp as sent by the directory
    #[serde(default)]
    pub creation: Option<String>,
    /// GPG key ids
    #[serde(default)]
    pub gpgkeyids: Option<Vec<String>>,
    /// Chat accounts, e.g. `matrix://example.com/dummy` or `irc:/dummy`
    #[serde(default)]
    pub ircnicks: Option<Vec<String>>,
    /// Group memberships, when the directory includes them
    #[serde(default)]
    pub groups: Option<Vec<String>>,
}

impl DirectoryUser {
    /// Human name if set, username otherwise.
    pub fn display_name(&self) -> &str {
        self.human_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.username)
    }
}

/// A Fedora Accounts group.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Group {
    /// Unique name of the group
    pub groupname: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub mailing_list: Option<String>,
    /// Chat channels of the group
    #[serde(default)]
    pub irc: Option<Vec<String>>,
}

/// Which membership list of a group to request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipKind {
    Members,
    Sponsors,
}

impl MembershipKind {
    /// Path segment of the FASJSON endpoint.
    pub fn path(&self) -> &'static str {
        match self {
            MembershipKind::Members => "members",
            MembershipKind::Sponsors => "sponsors",
        }
    }

    /// Capitalized label used in responses.
    pub fn title(&self) -> &'static str {
        match self {
            MembershipKind::Members => "Members",
            MembershipKind::Sponsors => "Sponsors",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_minimal_user() {
        let response: FasJsonResponse<DirectoryUser> =
            serde_json::from_str(r#"{"result": {"username": "dummy"}}"#).unwrap();
        assert_eq!(response.result.username, "dummy");
        assert!(response.result.pronouns.is_none());
        assert_eq!(response.result.display_name(), "dummy");
    }

    #[test]
    fn test_deserialize_full_user() {
        let json = r#"{
            "username": "dummy",
            "human_name": "Dummy User",
            "pronouns": ["they / them", "mx"],
            "timezone": "Europe/Paris",
            "ircnicks": ["matrix://example.com/dummy"],
            "gpgkeyids": []
        }"#;
        let user: DirectoryUser = serde_json::from_str(json).unwrap();
        assert_eq!(user.display_name(), "Dummy User");
        assert_eq!(user.pronouns.unwrap().len(), 2);
        assert_eq!(user.timezone.as_deref(), Some("Europe/Paris"));
        assert_eq!(user.gpgkeyids, Some(vec![]));
    }

    #[test]
    fn test_deserialize_null_pronouns() {
        let user: DirectoryUser =
            serde_json::from_str(r#"{"username": "dummy", "pronouns": null}"#).unwrap();
        assert!(user.pronouns.is_none());
    }

    #[test]
    fn test_membership_kind_labels() {
        assert_eq!(MembershipKind::Members.path(), "members");
        assert_eq!(MembershipKind::Sponsors.title(), "Sponsors");
    }
}
