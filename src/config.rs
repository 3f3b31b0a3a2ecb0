//! Configuration of the bot.
//!
//! The configuration is read from a YAML file, then overridden by
//! environment variables prefixed with `COOKIEBOT_`. Nested keys are
//! separated with `__`, e.g. `COOKIEBOT_MATRIX__PASSWORD` overrides
//! `matrix.password`.
//!
//! # Configuration File Format
//!
//! ```yaml
//! # Matrix account of the bot
//! matrix:
//!   user_id: "@cookiebot:fedora.im"
//!   password: "secret-password"
//!   # Passphrase encrypting the local Matrix store
//!   passphrase: "store-passphrase"
//!
//! # Optional, these are the defaults
//! bot:
//!   command_prefix: "!"
//!   home_server: "fedora.im"
//!
//! # Fedora Accounts directory (FASJSON), including the api version
//! directory:
//!   url: "https://fasjson.fedoraproject.org/v1"
//!   timeout: 10
//!
//! # Bodhi release catalog
//! releases:
//!   url: "https://bodhi.fedoraproject.org"
//!   primary_id_prefix: "FEDORA"
//!   timeout: 10
//! ```

use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::Deserialize;

/// Prefix of the environment variables overriding the file.
const ENV_PREFIX: &str = "COOKIEBOT_";

/// Root configuration structure.
#[derive(Deserialize, Debug)]
pub struct Config {
    /// Matrix account configuration
    pub matrix: Matrix,
    /// Command behavior
    #[serde(default)]
    pub bot: Bot,
    /// Fedora Accounts directory
    pub directory: Directory,
    /// Release catalog
    pub releases: Releases,
}

impl Config {
    /// Loads the configuration from `path` and the environment.
    pub fn load(path: &str) -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Yaml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
    }
}

/// Matrix account configuration.
#[derive(Deserialize, Debug)]
pub struct Matrix {
    /// Fully qualified Matrix user ID, e.g. `@cookiebot:fedora.im`
    pub user_id: String,

    /// Matrix account password.
    ///
    /// Used for the first login only. The session is persisted in the data
    /// directory and restored on the next starts.
    pub password: String,

    /// Passphrase encrypting the local Matrix store.
    pub passphrase: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Bot {
    /// Character starting a command, `!` by default
    #[serde(default = "default_command_prefix")]
    pub command_prefix: char,

    /// Matrix server whose accounts share their name with Fedora Accounts
    #[serde(default = "default_home_server")]
    pub home_server: String,
}

impl Default for Bot {
    fn default() -> Self {
        Bot {
            command_prefix: default_command_prefix(),
            home_server: default_home_server(),
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct Directory {
    /// FASJSON base URL, including the api version
    pub url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Directory {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

#[derive(Deserialize, Debug)]
pub struct Releases {
    /// Bodhi base URL
    pub url: String,

    /// Update id prefix of the main distribution.
    ///
    /// Releases with another prefix (containers, flatpaks...) never define
    /// the current cookie period.
    #[serde(default = "default_primary_id_prefix")]
    pub primary_id_prefix: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Releases {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

fn default_command_prefix() -> char {
    '!'
}

fn default_home_server() -> String {
    "fedora.im".to_owned()
}

fn default_primary_id_prefix() -> String {
    "FEDORA".to_owned()
}

fn default_timeout() -> u64 {
    10
}
