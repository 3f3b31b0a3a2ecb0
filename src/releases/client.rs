//! HTTP client for the Bodhi release API.

use std::time::Duration;

use log::{debug, info};
use mockall::automock;
use reqwest::{Client, StatusCode, Url};

use crate::{
    error::ServiceError,
    releases::structs::{ReleasePeriod, ReleasesResponse},
};

/// Access to the release catalog.
#[automock]
pub trait ReleaseClient {
    /// Fetches the releases currently supported.
    async fn get_current_releases(&self) -> Result<Vec<ReleasePeriod>, ServiceError>;
}

/// HTTP client for a Bodhi server.
pub struct BodhiClient {
    /// Bodhi base url
    url: String,
    /// HTTP client
    client: Client,
}

impl BodhiClient {
    /// Creates a new [BodhiClient].
    ///
    /// # Arguments
    ///
    /// * `url` - Base URL of Bodhi, e.g. `https://bodhi.fedoraproject.org`
    /// * `timeout` - Maximum duration of a request
    pub fn new(url: &str, timeout: Duration) -> Result<Self, anyhow::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(BodhiClient {
            url: url.trim_end_matches('/').to_owned(),
            client,
        })
    }
}

impl ReleaseClient for BodhiClient {
    /// Request `/releases/?state=current`.
    async fn get_current_releases(&self) -> Result<Vec<ReleasePeriod>, ServiceError> {
        let url = Url::parse(&format!("{}/releases/", self.url))
            .map_err(|e| ServiceError::Request(e.to_string()))?;
        info!("request current releases");

        let response = self
            .client
            .get(url)
            .query(&[("state", "current")])
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(ServiceError::UnexpectedStatus(status.as_u16()));
        }

        let body: ReleasesResponse = response.json().await?;
        debug!("{} current releases", body.releases.len());
        Ok(body.releases)
    }
}
