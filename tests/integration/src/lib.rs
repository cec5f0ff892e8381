//! Shared harness for the end-to-end mapper tests.
//!
//! A [`TestEnv`] stands up a wiremock server in place of the remote
//! directory, a real [`GraphApiClient`] pointed at it, an in-memory group
//! store and one brokered login.

use std::sync::Arc;

use kc_federation::mapper::{BrokerContext, IdentityProviderMapper, MapperOutcome};
use kc_federation::{run_mappers, BrokerEvent, MapperConfig, MapperRun};
use kc_federation_graph::{DirectoryGateway, GraphApiClient, GraphConfig};
use kc_model::{Group, User};
use kc_session::AuthenticationSession;
use kc_storage::InMemoryGroupProvider;
use serde_json::{json, Value};
use uuid::Uuid;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Access token the mock directory accepts.
pub const ACCESS_TOKEN: &str = "test-access-token";

/// Path of the transitive group membership listing.
pub const GROUPS_PATH: &str = "/me/transitiveMemberOf/microsoft.graph.group";

/// Test environment for one user.
pub struct TestEnv {
    /// Mock directory.
    pub server: MockServer,
    /// Gateway talking to the mock directory.
    pub gateway: Arc<dyn DirectoryGateway>,
    /// Realm under test.
    pub realm_id: Uuid,
    /// Local group store.
    pub groups: InMemoryGroupProvider,
    /// Current login's authentication session.
    pub session: AuthenticationSession,
    /// Local user.
    pub user: User,
    /// Stored broker token payload.
    pub broker_token: Option<String>,
}

impl TestEnv {
    /// Creates a new environment with a logged-in user.
    pub async fn new() -> anyhow::Result<Self> {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("kc_federation=debug,kc_federation_graph=debug")
            .with_test_writer()
            .try_init();

        let server = MockServer::start().await;
        let client = GraphApiClient::new(GraphConfig::default().with_base_url(server.uri()))?;
        let realm_id = Uuid::now_v7();

        Ok(Self {
            server,
            gateway: Arc::new(client),
            realm_id,
            groups: InMemoryGroupProvider::new(),
            session: AuthenticationSession::new(realm_id).with_identity_provider("azure"),
            user: User::new(realm_id, "megan"),
            broker_token: Some(token_payload(ACCESS_TOKEN)),
        })
    }

    /// Starts a fresh login transaction for the same user.
    pub fn new_login(&mut self) {
        self.session = AuthenticationSession::new(self.realm_id).with_identity_provider("azure");
    }

    /// Adds a top-level local group.
    pub fn add_group(&self, name: &str) -> Group {
        let group = Group::new(self.realm_id, name);
        self.groups.insert_group(group.clone());
        group
    }

    /// Adds a child local group.
    pub fn add_child_group(&self, parent: &Group, name: &str) -> Group {
        let group = Group::new_child(self.realm_id, parent.id, name);
        self.groups.insert_group(group.clone());
        group
    }

    /// Runs one mapper as for an existing user.
    pub async fn run(
        &mut self,
        mapper: &dyn IdentityProviderMapper,
        config: &MapperConfig,
    ) -> MapperOutcome {
        let mut context = BrokerContext::new(
            self.realm_id,
            self.broker_token.as_deref(),
            &mut self.session,
            &self.groups,
        );
        mapper
            .update_brokered_user(&mut context, &mut self.user, config)
            .await
    }

    /// Runs a chain of mappers for one login.
    pub async fn run_all(
        &mut self,
        mappers: &[(&dyn IdentityProviderMapper, &MapperConfig)],
        event: BrokerEvent,
    ) -> Vec<MapperRun> {
        let mut context = BrokerContext::new(
            self.realm_id,
            self.broker_token.as_deref(),
            &mut self.session,
            &self.groups,
        );
        run_mappers(mappers, event, &mut context, &mut self.user).await
    }

    /// Serves `body` for `GET /me`, expecting exactly `calls` requests.
    pub async fn mount_me(&self, body: Value, calls: u64) {
        Mock::given(method("GET"))
            .and(path("/me"))
            .and(header("Authorization", format!("Bearer {ACCESS_TOKEN}").as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(calls)
            .mount(&self.server)
            .await;
    }

    /// Serves `status` (and `body` on 200) for `GET /me/manager`.
    pub async fn mount_manager(&self, status: u16, body: Value, calls: u64) {
        let response = if status == 200 {
            ResponseTemplate::new(200).set_body_json(body)
        } else {
            ResponseTemplate::new(status).set_body_json(json!({
                "error": { "code": "Request_ResourceNotFound", "message": "not found" }
            }))
        };

        Mock::given(method("GET"))
            .and(path("/me/manager"))
            .respond_with(response)
            .expect(calls)
            .mount(&self.server)
            .await;
    }

    /// Serves a single page of group memberships.
    pub async fn mount_groups(&self, groups: Value, calls: u64) {
        Mock::given(method("GET"))
            .and(path(GROUPS_PATH))
            .and(query_param("$select", "id,displayName,description,mail"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": groups })))
            .expect(calls)
            .mount(&self.server)
            .await;
    }

    /// Serves an error status for the group listing.
    pub async fn mount_groups_status(&self, status: u16) {
        Mock::given(method("GET"))
            .and(path(GROUPS_PATH))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }
}

/// Builds a broker token payload as the broker stores it.
#[must_use]
pub fn token_payload(access_token: &str) -> String {
    json!({
        "access_token": access_token,
        "token_type": "Bearer",
        "expires_in": 3599,
        "scope": "openid profile User.Read GroupMember.Read.All"
    })
    .to_string()
}

/// Builds a directory group record.
#[must_use]
pub fn graph_group(display_name: Option<&str>) -> Value {
    json!({
        "id": Uuid::new_v4().to_string(),
        "displayName": display_name,
        "description": null,
        "mail": null
    })
}

/// Builds a groups mapper configuration from `(remote, local path)` pairs.
#[must_use]
pub fn group_mapping(pairs: &[(&str, &str)]) -> MapperConfig {
    MapperConfig::new(
        "azure-groups",
        kc_federation_graph::GraphGroupsMapper::PROVIDER_ID,
        "azure",
    )
    .with_config_map(kc_federation_graph::GraphGroupsMapper::GROUP_MAPPING, pairs)
}
