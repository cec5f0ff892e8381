//! Remote directory gateway.
//!
//! [`DirectoryGateway`] is the seam mappers talk to; [`GraphApiClient`] is
//! its reqwest implementation against the Microsoft Graph REST API.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, error};

use crate::config::GraphConfig;
use crate::error::{GraphError, GraphResult};
use crate::model::{GraphGroup, GraphUser, GroupPage, WireGroup};
use crate::token::BrokerToken;

/// Fields requested for group memberships.
const GROUP_SELECT: &str = "$select=id,displayName,description,mail";

/// Whose data a request is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserRef {
    /// The user the token was issued to.
    Me,
    /// A user by directory object ID or principal name.
    Id(String),
}

impl UserRef {
    /// Returns the request path for this user.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Me => "me".to_string(),
            Self::Id(id) => format!("users/{}", urlencoding::encode(id)),
        }
    }
}

/// Read-only access to the remote directory.
///
/// Every call distinguishes three results: `Ok(Some(_))` for a record,
/// `Ok(None)` when the directory has no such resource, and `Err(_)` for
/// transport or parse failures.
#[async_trait]
pub trait DirectoryGateway: Send + Sync {
    /// Fetches the profile of the token's user.
    async fn get_user(&self, token: &BrokerToken) -> GraphResult<Option<GraphUser>>;

    /// Fetches the manager of a user.
    async fn get_manager(
        &self,
        token: &BrokerToken,
        user: &UserRef,
    ) -> GraphResult<Option<GraphUser>>;

    /// Fetches all groups a user is a transitive member of.
    async fn get_transitive_groups(
        &self,
        token: &BrokerToken,
        user: &UserRef,
    ) -> GraphResult<Option<Vec<GraphGroup>>>;
}

/// Graph API client.
#[derive(Debug, Clone)]
pub struct GraphApiClient {
    client: reqwest::Client,
    config: GraphConfig,
}

impl GraphApiClient {
    /// Creates a new client.
    ///
    /// ## Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be built.
    pub fn new(config: GraphConfig) -> GraphResult<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GraphError::config(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Creates a client configured from the environment.
    ///
    /// ## Errors
    ///
    /// See [`GraphApiClient::new`].
    pub fn from_env() -> GraphResult<Self> {
        Self::new(GraphConfig::from_env())
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &GraphConfig {
        &self.config
    }

    async fn get<T: DeserializeOwned>(&self, url: &str, token: &BrokerToken) -> GraphResult<Option<T>> {
        debug!(url = %url, "Graph API request");

        let response = self
            .client
            .get(url)
            .bearer_auth(token.access_token())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                error!(url = %url, error = %e, "Graph API request failed");
                GraphError::from(e)
            })?;

        handle_response(url, response).await
    }
}

/// Maps a response: 200 is parsed, 404 is "no such resource", anything
/// else is an error.
async fn handle_response<T: DeserializeOwned>(
    url: &str,
    response: reqwest::Response,
) -> GraphResult<Option<T>> {
    let status = response.status();

    match status {
        StatusCode::OK => {
            let body = response.bytes().await?;
            serde_json::from_slice(&body).map(Some).map_err(|e| {
                error!(url = %url, error = %e, "Graph API response could not be parsed");
                GraphError::parse(e.to_string())
            })
        }
        StatusCode::NOT_FOUND => {
            debug!(url = %url, "Graph API resource not found");
            Ok(None)
        }
        _ => {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!(url = %url, status = status.as_u16(), "Graph API returned an error");
            Err(GraphError::Status {
                status: status.as_u16(),
                message,
            })
        }
    }
}

#[async_trait]
impl DirectoryGateway for GraphApiClient {
    async fn get_user(&self, token: &BrokerToken) -> GraphResult<Option<GraphUser>> {
        self.get(&self.config.url("me"), token).await
    }

    async fn get_manager(
        &self,
        token: &BrokerToken,
        user: &UserRef,
    ) -> GraphResult<Option<GraphUser>> {
        let url = self.config.url(&format!("{}/manager", user.path()));
        self.get(&url, token).await
    }

    async fn get_transitive_groups(
        &self,
        token: &BrokerToken,
        user: &UserRef,
    ) -> GraphResult<Option<Vec<GraphGroup>>> {
        let mut url = self.config.url(&format!(
            "{}/transitiveMemberOf/microsoft.graph.group?{GROUP_SELECT}",
            user.path()
        ));
        let mut groups = Vec::new();

        for _ in 0..self.config.max_pages {
            let Some(page) = self.get::<GroupPage>(&url, token).await? else {
                return Ok(None);
            };

            groups.extend(page.value.into_iter().filter_map(WireGroup::into_group));

            match page.next_link {
                None => return Ok(Some(groups)),
                Some(next) if self.config.is_within_base(&next) => url = next,
                Some(_) => {
                    return Err(GraphError::paging(
                        "next page link points outside the configured base URL",
                    ))
                }
            }
        }

        Err(GraphError::paging(format!(
            "group listing exceeded {} pages",
            self.config.max_pages
        )))
    }
}
