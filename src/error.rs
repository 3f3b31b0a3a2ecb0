//! Errors raised while gathering information from external services.
//!
//! [`InfoGatherError`] is the error every command handler surfaces to the
//! chat room: its `Display` output is the message sent back to the user.
//! [`ServiceError`] describes transport failures of the HTTP clients and is
//! folded into [`InfoGatherError::ServiceUnavailable`].

use thiserror::Error;

/// A failure while gathering the information a command needs.
#[derive(Debug, Error)]
pub enum InfoGatherError {
    /// The directory has no user with this username.
    #[error("Sorry, but Fedora Accounts user '{0}' does not exist")]
    UserNotFound(String),

    /// The directory has no group with this name.
    #[error("Sorry, but group '{0}' does not exist")]
    GroupNotFound(String),

    /// No directory user registered this Matrix id.
    #[error("No Fedora Accounts users have the {0} Matrix Account defined")]
    NoMatchingIdentity(String),

    /// The release service returned no active primary release.
    #[error("No current release could be found")]
    NoCurrentRelease,

    /// An external service could not be reached or answered garbage.
    #[error("{service} is unavailable, please try again later ({source})")]
    ServiceUnavailable {
        service: &'static str,
        #[source]
        source: ServiceError,
    },
}

impl InfoGatherError {
    /// Wraps a transport failure of `service`.
    pub fn unavailable(service: &'static str, source: ServiceError) -> Self {
        InfoGatherError::ServiceUnavailable { service, source }
    }
}

/// Transport-level failure of an HTTP request.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request did not complete within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// The request failed before a response was received.
    #[error("request failed: {0}")]
    Request(String),

    /// The service answered with an unexpected HTTP status.
    #[error("unexpected status {0}")]
    UnexpectedStatus(u16),

    /// The response body could not be decoded.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for ServiceError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            ServiceError::Timeout
        } else if error.is_decode() {
            ServiceError::Malformed(error.to_string())
        } else if let Some(status) = error.status() {
            ServiceError::UnexpectedStatus(status.as_u16())
        } else {
            ServiceError::Request(error.to_string())
        }
    }
}
