//! # kc-federation-graph
//!
//! Microsoft Graph identity provider mappers.
//!
//! After an OIDC login through Entra ID (Azure AD), these mappers use the
//! broker's stored access token to read the user's directory profile,
//! manager and transitive group memberships, and write them onto the
//! local user.
//!
//! ## Example
//!
//! ```ignore
//! let gateway: Arc<dyn DirectoryGateway> = Arc::new(GraphApiClient::from_env()?);
//! let mapper = GraphGroupsMapper::new(gateway);
//! let outcome = mapper.update_brokered_user(&mut context, &mut user, &config).await;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod extract;
pub mod mapper;
pub mod model;
pub mod token;

pub use cache::{SessionProfileCache, GROUPS_CACHE_KEY, MANAGER_CACHE_KEY, USER_CACHE_KEY};
pub use client::{DirectoryGateway, GraphApiClient, UserRef};
pub use config::GraphConfig;
pub use error::{GraphError, GraphResult};
pub use extract::{FieldRegistry, ProfileField};
pub use mapper::{
    GraphGroupNamesMapper, GraphGroupsMapper, GraphManagerAttributeMapper,
    GraphUserAttributeMapper,
};
pub use model::{GraphGroup, GraphUser};
pub use token::BrokerToken;
