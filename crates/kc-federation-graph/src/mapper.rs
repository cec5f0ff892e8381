//! Graph API identity provider mappers.
//!
//! Four mappers share one gateway and one per-login cache:
//!
//! | mapper | reads | writes |
//! |---|---|---|
//! | [`GraphUserAttributeMapper`] | the user's profile | one user attribute |
//! | [`GraphManagerAttributeMapper`] | the manager's profile | one user attribute |
//! | [`GraphGroupsMapper`] | the user's groups | managed group memberships |
//! | [`GraphGroupNamesMapper`] | the user's groups | one multi-valued attribute |

use std::sync::Arc;

use async_trait::async_trait;
use kc_federation::mapper::{
    BrokerContext, ConfigProperty, ConfigPropertyKind, FederationMapper, IdentityProviderMapper,
    MapperOutcome, SkipReason,
};
use kc_federation::{
    apply_attribute, AttributeValue, FederationError, GroupNameNormalizer, GroupReconciler,
    ManagedGroupMapping, MapperConfig,
};
use kc_model::User;
use tracing::{debug, error, info, warn};

use crate::cache::{SessionProfileCache, GROUPS_CACHE_KEY, MANAGER_CACHE_KEY, USER_CACHE_KEY};
use crate::client::{DirectoryGateway, UserRef};
use crate::extract::FieldRegistry;
use crate::model::{GraphGroup, GraphUser};
use crate::token::BrokerToken;

/// Category all Graph mappers are listed under.
pub const DISPLAY_CATEGORY: &str = "Graph API";

// ============================================================================
// Shared Fetching
// ============================================================================

/// Which profile an attribute mapper reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProfileSource {
    User,
    Manager,
}

impl ProfileSource {
    const fn cache_key(self) -> &'static str {
        match self {
            Self::User => USER_CACHE_KEY,
            Self::Manager => MANAGER_CACHE_KEY,
        }
    }

    const fn registry(self) -> FieldRegistry {
        match self {
            Self::User => FieldRegistry::USER,
            Self::Manager => FieldRegistry::MANAGER,
        }
    }
}

fn resolve_token(context: &BrokerContext<'_>, mapper: &str) -> Result<BrokerToken, SkipReason> {
    BrokerToken::resolve(context.broker_token).ok_or_else(|| {
        debug!(mapper = %mapper, "No broker token stored, skipping");
        SkipReason::NoCredential
    })
}

async fn fetch_profile(
    gateway: &dyn DirectoryGateway,
    context: &mut BrokerContext<'_>,
    token: &BrokerToken,
    source: ProfileSource,
) -> Result<GraphUser, SkipReason> {
    let me = UserRef::Me;
    let mut cache = SessionProfileCache::new(&mut *context.auth_session);
    let fetched = match source {
        ProfileSource::User => {
            cache
                .get_or_fetch(source.cache_key(), || gateway.get_user(token))
                .await
        }
        ProfileSource::Manager => {
            cache
                .get_or_fetch(source.cache_key(), || gateway.get_manager(token, &me))
                .await
        }
    };

    match fetched {
        Ok(Some(profile)) => Ok(profile),
        Ok(None) => {
            debug!(source = ?source, "Profile not found in directory");
            Err(SkipReason::NotFound)
        }
        Err(e) => {
            let e = FederationError::from(e);
            error!(
                source = ?source,
                error = %e,
                connection = e.is_connection_error(),
                "Failed to fetch profile"
            );
            Err(SkipReason::from(&e))
        }
    }
}

async fn fetch_groups(
    gateway: &dyn DirectoryGateway,
    context: &mut BrokerContext<'_>,
    token: &BrokerToken,
) -> Result<Vec<GraphGroup>, SkipReason> {
    let me = UserRef::Me;
    let mut cache = SessionProfileCache::new(&mut *context.auth_session);
    let fetched = cache
        .get_or_fetch(GROUPS_CACHE_KEY, || gateway.get_transitive_groups(token, &me))
        .await;

    match fetched {
        Ok(Some(groups)) => Ok(groups),
        Ok(None) => {
            warn!("Group memberships not found in directory");
            Err(SkipReason::NotFound)
        }
        Err(e) => {
            let e = FederationError::from(e);
            error!(
                error = %e,
                connection = e.is_connection_error(),
                "Failed to fetch group memberships"
            );
            Err(SkipReason::from(&e))
        }
    }
}

/// Normalised, de-duplicated display names in directory order.
fn normalized_names(groups: &[GraphGroup]) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(groups.len());
    for group in groups {
        if let Some(name) = GroupNameNormalizer::normalize(Some(group.display_name.as_str())) {
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }
    names
}

/// Reads a required config entry, logging when it is missing.
fn required<'c>(config: &'c MapperConfig, key: &str) -> Result<&'c str, SkipReason> {
    config.require(key).map_err(|e| {
        warn!(mapper = %config.name, error = %e, "Mapper is not configured");
        SkipReason::from(&e)
    })
}

/// Runs a profile attribute mapper.
async fn map_profile_attribute(
    gateway: &dyn DirectoryGateway,
    source: ProfileSource,
    field_key: &str,
    attribute_key: &str,
    context: &mut BrokerContext<'_>,
    user: &mut User,
    config: &MapperConfig,
) -> Result<(), SkipReason> {
    let field_name = required(config, field_key)?;
    let attribute_name = required(config, attribute_key)?;

    let registry = source.registry();
    let Some(field) = registry.resolve(field_name) else {
        warn!(mapper = %config.name, field = %field_name, "Unsupported Graph API field");
        return Err(SkipReason::UnsupportedField);
    };

    let token = resolve_token(context, &config.name)?;
    let profile = fetch_profile(gateway, context, &token, source).await?;

    apply_attribute(user, attribute_name, field.extract(&profile));
    debug!(
        mapper = %config.name,
        field = %field_name,
        attribute = %attribute_name,
        "Attribute mapped"
    );
    Ok(())
}

fn outcome(result: Result<(), SkipReason>) -> MapperOutcome {
    match result {
        Ok(()) => MapperOutcome::Applied,
        Err(reason) => MapperOutcome::Skipped(reason),
    }
}

// ============================================================================
// User Attribute Mapper
// ============================================================================

/// Maps a field of the user's own directory profile to a user attribute.
#[derive(Clone)]
pub struct GraphUserAttributeMapper {
    gateway: Arc<dyn DirectoryGateway>,
}

impl GraphUserAttributeMapper {
    /// Provider ID.
    pub const PROVIDER_ID: &'static str = "graph-api-user-identity-provider-mapper";

    /// Config key for the remote field name.
    pub const FIELD_NAME: &'static str = "graph-api-user-attribute-name";

    /// Config key for the local attribute name.
    pub const ATTRIBUTE_NAME: &'static str = "graph-api-user-attribute-keycloak-name";

    /// Creates a new mapper.
    #[must_use]
    pub fn new(gateway: Arc<dyn DirectoryGateway>) -> Self {
        Self { gateway }
    }
}

impl FederationMapper for GraphUserAttributeMapper {
    fn mapper_type(&self) -> &'static str {
        Self::PROVIDER_ID
    }

    fn display_name(&self) -> &'static str {
        "Graph API User Attributes"
    }

    fn help_text(&self) -> &'static str {
        "Graph API User Identity Provider Mapper"
    }

    fn display_category(&self) -> &'static str {
        DISPLAY_CATEGORY
    }

    fn config_properties(&self) -> Vec<ConfigProperty> {
        vec![
            ConfigProperty {
                name: Self::FIELD_NAME,
                label: "User attribute",
                help_text: "User attribute to map",
                kind: ConfigPropertyKind::List(FieldRegistry::USER.field_names()),
            },
            ConfigProperty {
                name: Self::ATTRIBUTE_NAME,
                label: "Keycloak attribute name",
                help_text: "Keycloak attribute to map the user attribute to",
                kind: ConfigPropertyKind::String,
            },
        ]
    }
}

#[async_trait]
impl IdentityProviderMapper for GraphUserAttributeMapper {
    async fn update_brokered_user(
        &self,
        context: &mut BrokerContext<'_>,
        user: &mut User,
        config: &MapperConfig,
    ) -> MapperOutcome {
        outcome(
            map_profile_attribute(
                self.gateway.as_ref(),
                ProfileSource::User,
                Self::FIELD_NAME,
                Self::ATTRIBUTE_NAME,
                context,
                user,
                config,
            )
            .await,
        )
    }
}

// ============================================================================
// Manager Attribute Mapper
// ============================================================================

/// Maps a field of the user's manager's directory profile to a user attribute.
#[derive(Clone)]
pub struct GraphManagerAttributeMapper {
    gateway: Arc<dyn DirectoryGateway>,
}

impl GraphManagerAttributeMapper {
    /// Provider ID.
    pub const PROVIDER_ID: &'static str = "graph-api-user-manager-identity-provider-mapper";

    /// Config key for the remote field name.
    pub const FIELD_NAME: &'static str = "graph-api-user-manager-attribute-name";

    /// Config key for the local attribute name.
    pub const ATTRIBUTE_NAME: &'static str = "graph-api-user-manager-attribute-keycloak-name";

    /// Creates a new mapper.
    #[must_use]
    pub fn new(gateway: Arc<dyn DirectoryGateway>) -> Self {
        Self { gateway }
    }
}

impl FederationMapper for GraphManagerAttributeMapper {
    fn mapper_type(&self) -> &'static str {
        Self::PROVIDER_ID
    }

    fn display_name(&self) -> &'static str {
        "Graph API User Manager Attributes"
    }

    fn help_text(&self) -> &'static str {
        "Graph API User Manager Identity Provider Mapper"
    }

    fn display_category(&self) -> &'static str {
        DISPLAY_CATEGORY
    }

    fn config_properties(&self) -> Vec<ConfigProperty> {
        vec![
            ConfigProperty {
                name: Self::FIELD_NAME,
                label: "Manager attribute",
                help_text: "Manager attribute to map",
                kind: ConfigPropertyKind::List(FieldRegistry::MANAGER.field_names()),
            },
            ConfigProperty {
                name: Self::ATTRIBUTE_NAME,
                label: "Keycloak attribute name",
                help_text: "Keycloak attribute to map the manager attribute to",
                kind: ConfigPropertyKind::String,
            },
        ]
    }
}

#[async_trait]
impl IdentityProviderMapper for GraphManagerAttributeMapper {
    async fn update_brokered_user(
        &self,
        context: &mut BrokerContext<'_>,
        user: &mut User,
        config: &MapperConfig,
    ) -> MapperOutcome {
        outcome(
            map_profile_attribute(
                self.gateway.as_ref(),
                ProfileSource::Manager,
                Self::FIELD_NAME,
                Self::ATTRIBUTE_NAME,
                context,
                user,
                config,
            )
            .await,
        )
    }
}

// ============================================================================
// Groups Mapper
// ============================================================================

/// Reconciles managed local group memberships against directory groups.
#[derive(Clone)]
pub struct GraphGroupsMapper {
    gateway: Arc<dyn DirectoryGateway>,
}

impl GraphGroupsMapper {
    /// Provider ID.
    pub const PROVIDER_ID: &'static str = "graph-api-groups-identity-provider-mapper";

    /// Config key for the group mapping.
    pub const GROUP_MAPPING: &'static str = "graph-api-group-mapping";

    /// Creates a new mapper.
    #[must_use]
    pub fn new(gateway: Arc<dyn DirectoryGateway>) -> Self {
        Self { gateway }
    }

    async fn reconcile(
        &self,
        context: &mut BrokerContext<'_>,
        user: &User,
        config: &MapperConfig,
    ) -> Result<(), SkipReason> {
        // Read fresh on every run.
        let raw = config.get_config_map(Self::GROUP_MAPPING).map_err(|e| {
            warn!(mapper = %config.name, error = %e, "Group mapping could not be read");
            SkipReason::from(&e)
        })?;
        let mapping = ManagedGroupMapping::from_config_map(raw);
        if mapping.is_empty() {
            warn!(mapper = %config.name, "No group mapping configured");
            return Err(SkipReason::MissingConfig);
        }

        let token = resolve_token(context, &config.name)?;
        let groups = fetch_groups(self.gateway.as_ref(), context, &token).await?;
        let names = normalized_names(&groups);

        let result = GroupReconciler::new(mapping)
            .reconcile(context.groups, context.realm_id, user.id, &names)
            .await
            .map_err(|e| {
                error!(mapper = %config.name, error = %e, "Group reconciliation failed");
                SkipReason::from(&e)
            })?;

        info!(
            mapper = %config.name,
            user_id = %user.id,
            joined = result.joined,
            left = result.left,
            failed = result.failed,
            "Group memberships reconciled"
        );
        Ok(())
    }
}

impl FederationMapper for GraphGroupsMapper {
    fn mapper_type(&self) -> &'static str {
        Self::PROVIDER_ID
    }

    fn display_name(&self) -> &'static str {
        "Graph API Groups"
    }

    fn help_text(&self) -> &'static str {
        "Graph API Groups Identity Provider Mapper"
    }

    fn display_category(&self) -> &'static str {
        DISPLAY_CATEGORY
    }

    fn config_properties(&self) -> Vec<ConfigProperty> {
        vec![ConfigProperty {
            name: Self::GROUP_MAPPING,
            label: "Groups",
            help_text: "Map Azure groups to Keycloak groups",
            kind: ConfigPropertyKind::Map,
        }]
    }
}

#[async_trait]
impl IdentityProviderMapper for GraphGroupsMapper {
    async fn update_brokered_user(
        &self,
        context: &mut BrokerContext<'_>,
        user: &mut User,
        config: &MapperConfig,
    ) -> MapperOutcome {
        outcome(self.reconcile(context, user, config).await)
    }
}

// ============================================================================
// Group Names Mapper
// ============================================================================

/// Writes the user's normalised directory group names to a multi-valued
/// user attribute.
#[derive(Clone)]
pub struct GraphGroupNamesMapper {
    gateway: Arc<dyn DirectoryGateway>,
}

impl GraphGroupNamesMapper {
    /// Provider ID.
    pub const PROVIDER_ID: &'static str = "graph-api-group-names-identity-provider-mapper";

    /// Config key for the local attribute name.
    pub const ATTRIBUTE_NAME: &'static str = "graph-api-group-names-attribute-keycloak-name";

    /// Creates a new mapper.
    #[must_use]
    pub fn new(gateway: Arc<dyn DirectoryGateway>) -> Self {
        Self { gateway }
    }

    async fn map_names(
        &self,
        context: &mut BrokerContext<'_>,
        user: &mut User,
        config: &MapperConfig,
    ) -> Result<(), SkipReason> {
        let attribute_name = required(config, Self::ATTRIBUTE_NAME)?;
        let token = resolve_token(context, &config.name)?;
        let groups = fetch_groups(self.gateway.as_ref(), context, &token).await?;

        let names = normalized_names(&groups);
        let value = if names.is_empty() {
            AttributeValue::Absent
        } else {
            AttributeValue::List(names)
        };

        apply_attribute(user, attribute_name, value);
        Ok(())
    }
}

impl FederationMapper for GraphGroupNamesMapper {
    fn mapper_type(&self) -> &'static str {
        Self::PROVIDER_ID
    }

    fn display_name(&self) -> &'static str {
        "Graph API Group Names"
    }

    fn help_text(&self) -> &'static str {
        "Graph API Group Names Identity Provider Mapper"
    }

    fn display_category(&self) -> &'static str {
        DISPLAY_CATEGORY
    }

    fn config_properties(&self) -> Vec<ConfigProperty> {
        vec![ConfigProperty {
            name: Self::ATTRIBUTE_NAME,
            label: "Keycloak attribute name",
            help_text: "Keycloak attribute to write the group names to",
            kind: ConfigPropertyKind::String,
        }]
    }
}

#[async_trait]
impl IdentityProviderMapper for GraphGroupNamesMapper {
    async fn update_brokered_user(
        &self,
        context: &mut BrokerContext<'_>,
        user: &mut User,
        config: &MapperConfig,
    ) -> MapperOutcome {
        outcome(self.map_names(context, user, config).await)
    }
}
