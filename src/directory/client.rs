//! HTTP client for the FASJSON directory API.
//!
//! This module provides the [`FasJsonClient`] struct that implements the
//! [`DirectoryClient`] trait on top of `reqwest`.

use std::time::Duration;

use log::{debug, info};
use mockall::automock;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::{
    directory::structs::{DirectoryUser, FasJsonResponse, Group, MembershipKind},
    error::ServiceError,
};

/// Read-only access to the accounts directory.
///
/// Lookups answer `Ok(None)` when the directory does not know the requested
/// entity, errors are reserved for transport failures.
#[automock]
pub trait DirectoryClient {
    /// Fetches a user by username.
    async fn get_user(&self, username: &str) -> Result<Option<DirectoryUser>, ServiceError>;
    /// Searches the users having exactly this chat account registered.
    async fn search_users_by_ircnick(
        &self,
        ircnick: &str,
    ) -> Result<Vec<DirectoryUser>, ServiceError>;
    /// Fetches a group by name.
    async fn get_group(&self, groupname: &str) -> Result<Option<Group>, ServiceError>;
    /// Fetches the members or the sponsors of a group.
    async fn get_group_memberships(
        &self,
        groupname: &str,
        kind: MembershipKind,
    ) -> Result<Option<Vec<DirectoryUser>>, ServiceError>;
}

/// HTTP client for a FASJSON server.
///
/// # Examples
///
/// ```no_run
/// let client = FasJsonClient::new("https://fasjson.fedoraproject.org/v1", Duration::from_secs(10))?;
/// let user = client.get_user("dummy").await?;
/// ```
pub struct FasJsonClient {
    /// FASJSON base url, including the api version
    url: String,
    /// HTTP client
    client: Client,
}

impl FasJsonClient {
    /// Creates a new [FasJsonClient].
    ///
    /// # Arguments
    ///
    /// * `url` - Base URL of the FASJSON api, e.g. `https://fasjson.fedoraproject.org/v1`
    /// * `timeout` - Maximum duration of a request
    pub fn new(url: &str, timeout: Duration) -> Result<Self, anyhow::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(FasJsonClient {
            url: url.trim_end_matches('/').to_owned(),
            client,
        })
    }

    /// Builds `{url}/{segments...}/`, FASJSON endpoints end with a slash.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ServiceError> {
        let mut url =
            Url::parse(&self.url).map_err(|e| ServiceError::Request(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| ServiceError::Request(format!("{} cannot be a base url", self.url)))?
            .pop_if_empty()
            .extend(segments)
            .push("");
        Ok(url)
    }

    /// Requests an endpoint and unwraps the `result` field of the answer.
    ///
    /// A 404 answer is turned into `Ok(None)`.
    async fn request<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, &str)],
    ) -> Result<Option<T>, ServiceError> {
        debug!("request {} {:?}", url, query);

        let mut request = self.client.get(url.clone());
        if !query.is_empty() {
            request = request.query(query);
        }
        let response = request.send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!("response from {} -> not found", url);
            return Ok(None);
        }
        if !status.is_success() {
            return Err(ServiceError::UnexpectedStatus(status.as_u16()));
        }

        let body: FasJsonResponse<T> = response.json().await?;
        Ok(Some(body.result))
    }
}

impl DirectoryClient for FasJsonClient {
    /// Request `/users/{username}/`.
    async fn get_user(&self, username: &str) -> Result<Option<DirectoryUser>, ServiceError> {
        info!("request user {}", username);
        self.request(self.endpoint(&["users", username])?, &[])
            .await
    }

    /// Request `/search/users/?ircnick__exact={ircnick}`.
    async fn search_users_by_ircnick(
        &self,
        ircnick: &str,
    ) -> Result<Vec<DirectoryUser>, ServiceError> {
        info!("search users with chat account {}", ircnick);
        let users: Option<Vec<DirectoryUser>> = self
            .request(
                self.endpoint(&["search", "users"])?,
                &[("ircnick__exact", ircnick)],
            )
            .await?;
        Ok(users.unwrap_or_default())
    }

    /// Request `/groups/{groupname}/`.
    async fn get_group(&self, groupname: &str) -> Result<Option<Group>, ServiceError> {
        info!("request group {}", groupname);
        self.request(self.endpoint(&["groups", groupname])?, &[])
            .await
    }

    /// Request `/groups/{groupname}/members/` or `/groups/{groupname}/sponsors/`.
    async fn get_group_memberships(
        &self,
        groupname: &str,
        kind: MembershipKind,
    ) -> Result<Option<Vec<DirectoryUser>>, ServiceError> {
        info!("request {} of group {}", kind.path(), groupname);
        self.request(self.endpoint(&["groups", groupname, kind.path()])?, &[])
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_client(url: &str) -> FasJsonClient {
        FasJsonClient::new(url, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_get_user() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/users/dummy/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"result": {"username": "dummy", "human_name": "Dummy User"}}"#)
            .create_async()
            .await;

        let user = create_client(&server.url())
            .get_user("dummy")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.username, "dummy");
        assert_eq!(user.human_name.as_deref(), Some("Dummy User"));
    }

    #[tokio::test]
    async fn test_get_user_not_found() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/users/nobody/")
            .with_status(404)
            .with_body(r#"{"message": "Not found"}"#)
            .create_async()
            .await;

        let user = create_client(&server.url()).get_user("nobody").await.unwrap();
        assert!(user.is_none());
    }

    #[tokio::test]
    async fn test_get_user_server_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/users/dummy/")
            .with_status(500)
            .create_async()
            .await;

        let result = create_client(&server.url()).get_user("dummy").await;
        assert!(matches!(result, Err(ServiceError::UnexpectedStatus(500))));
    }

    #[tokio::test]
    async fn test_get_user_malformed_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/users/dummy/")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let result = create_client(&server.url()).get_user("dummy").await;
        assert!(matches!(result, Err(ServiceError::Malformed(_))));
    }

    #[tokio::test]
    async fn test_base_url_with_version_prefix() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v1/users/dummy/")
            .with_status(200)
            .with_body(r#"{"result": {"username": "dummy"}}"#)
            .create_async()
            .await;

        let client = create_client(&format!("{}/v1/", server.url()));
        let user = client.get_user("dummy").await.unwrap().unwrap();
        assert_eq!(user.username, "dummy");
    }

    #[tokio::test]
    async fn test_search_users_by_ircnick() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/search/users/")
            .match_query(mockito::Matcher::UrlEncoded(
                "ircnick__exact".to_owned(),
                "matrix://example.com/dummy".to_owned(),
            ))
            .with_status(200)
            .with_body(r#"{"result": [{"username": "dummy"}, {"username": "dummy2"}]}"#)
            .create_async()
            .await;

        let users = create_client(&server.url())
            .search_users_by_ircnick("matrix://example.com/dummy")
            .await
            .unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].username, "dummy");
    }

    #[tokio::test]
    async fn test_search_users_without_result() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/search/users/")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(r#"{"result": []}"#)
            .create_async()
            .await;

        let users = create_client(&server.url())
            .search_users_by_ircnick("matrix://example.com/nobody")
            .await
            .unwrap();
        assert!(users.is_empty());
    }

    #[tokio::test]
    async fn test_get_group() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/groups/dummygroup/")
            .with_status(200)
            .with_body(r#"{"result": {"groupname": "dummygroup", "description": "A test group"}}"#)
            .create_async()
            .await;

        let group = create_client(&server.url())
            .get_group("dummygroup")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(group.groupname, "dummygroup");
        assert_eq!(group.description.as_deref(), Some("A test group"));
        assert!(group.url.is_none());
    }

    #[tokio::test]
    async fn test_get_group_sponsors() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/groups/dummygroup/sponsors/")
            .with_status(200)
            .with_body(r#"{"result": [{"username": "member1"}, {"username": "member2"}]}"#)
            .create_async()
            .await;

        let sponsors = create_client(&server.url())
            .get_group_memberships("dummygroup", MembershipKind::Sponsors)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(sponsors.len(), 2);
        assert_eq!(sponsors[1].username, "member2");
    }

    #[tokio::test]
    async fn test_username_is_escaped_in_path() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/users/a%2Fb/")
            .with_status(404)
            .create_async()
            .await;

        let user = create_client(&server.url()).get_user("a/b").await.unwrap();
        assert!(user.is_none());
        mock.assert_async().await;
    }
}
