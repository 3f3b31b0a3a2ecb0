//! Data structures returned by the Bodhi release API.

use chrono::NaiveDate;
use serde::Deserialize;

/// Answer of `GET /releases/`. Pagination fields are ignored.
#[derive(Deserialize, Debug)]
pub struct ReleasesResponse {
    pub releases: Vec<ReleasePeriod>,
}

/// A release cycle of the distribution.
///
/// Cookies can be given once per release cycle, the cycle is identified by
/// its `version`.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleasePeriod {
    /// Short name, e.g. `F38`
    #[serde(default)]
    pub name: Option<String>,
    /// Long name, e.g. `Fedora 38`
    #[serde(default)]
    pub long_name: Option<String>,
    /// Version number, e.g. `38`
    pub version: String,
    /// Update id prefix, `FEDORA` for the main distribution
    pub id_prefix: String,
    /// End of life date
    #[serde(default)]
    pub eol: Option<NaiveDate>,
}

impl ReleasePeriod {
    /// Label used in chat messages: the short name, or `F{version}` when unnamed.
    pub fn label(&self) -> String {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name.to_owned(),
            _ => format!("F{}", self.version),
        }
    }

    /// Numeric value of the version, `None` for non numeric versions like `eln`.
    pub fn numeric_version(&self) -> Option<u32> {
        self.version.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_releases() {
        let json = r#"{
            "releases": [
                {"name": "F38", "long_name": "Fedora 38", "version": "38", "id_prefix": "FEDORA", "eol": "2024-05-14"},
                {"version": "37", "id_prefix": "FEDORA", "eol": null}
            ],
            "page": 1,
            "pages": 1
        }"#;
        let response: ReleasesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.releases.len(), 2);
        assert_eq!(
            response.releases[0].eol,
            NaiveDate::from_ymd_opt(2024, 5, 14)
        );
        assert!(response.releases[1].name.is_none());
    }

    #[test]
    fn test_label() {
        let mut release = ReleasePeriod {
            name: Some("F38".to_owned()),
            version: "38".to_owned(),
            id_prefix: "FEDORA".to_owned(),
            ..Default::default()
        };
        assert_eq!(release.label(), "F38");

        release.name = None;
        assert_eq!(release.label(), "F38");

        release.version = "39".to_owned();
        assert_eq!(release.label(), "F39");
    }

    #[test]
    fn test_numeric_version() {
        let release = ReleasePeriod {
            version: "eln".to_owned(),
            ..Default::default()
        };
        assert_eq!(release.numeric_version(), None);
    }
}
