//! Identity provider mappers.
//!
//! Mappers run after a user authenticates through an external identity
//! provider. Each one reads what the provider (or a directory behind it)
//! knows about the user and writes it onto the local user.
//!
//! A mapper never fails a login. Hooks report a [`MapperOutcome`] instead
//! of an error, and [`run_mappers`] runs every configured mapper even
//! when earlier ones were skipped.

use async_trait::async_trait;
use kc_model::User;
use kc_session::AuthenticationSession;
use kc_storage::GroupProvider;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::{MapperConfig, SyncMode};
use crate::error::FederationError;

// ============================================================================
// Mapper Metadata
// ============================================================================

/// Kind of value a configuration property holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigPropertyKind {
    /// Free text.
    String,
    /// One of a fixed set of options.
    List(Vec<String>),
    /// Key/value pairs with repeatable keys.
    Map,
}

/// Describes one configuration property a mapper accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigProperty {
    /// Configuration key.
    pub name: &'static str,
    /// Label shown to administrators.
    pub label: &'static str,
    /// Help text shown to administrators.
    pub help_text: &'static str,
    /// Kind of value.
    pub kind: ConfigPropertyKind,
}

/// Base trait for all mappers.
pub trait FederationMapper: Send + Sync {
    /// Returns the mapper type identifier.
    fn mapper_type(&self) -> &'static str;

    /// Returns the display name for this mapper.
    fn display_name(&self) -> &'static str;

    /// Returns help text describing this mapper.
    fn help_text(&self) -> &'static str;

    /// Returns the category this mapper is listed under.
    fn display_category(&self) -> &'static str;

    /// Returns the identity provider types this mapper can attach to.
    fn compatible_providers(&self) -> &'static [&'static str] {
        &["oidc"]
    }

    /// Returns true if this mapper can run under the given sync mode.
    fn supports_sync_mode(&self, _mode: SyncMode) -> bool {
        true
    }

    /// Returns the configuration properties this mapper accepts.
    fn config_properties(&self) -> Vec<ConfigProperty>;
}

// ============================================================================
// Outcomes
// ============================================================================

/// Why a mapper did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SkipReason {
    /// No usable broker credential was stored for the login.
    NoCredential,
    /// The remote directory has no such record.
    NotFound,
    /// The remote directory could not be reached or answered badly.
    RemoteFailure,
    /// The configured field is not one the mapper knows.
    UnsupportedField,
    /// A required configuration entry is missing.
    MissingConfig,
    /// A configuration entry could not be parsed.
    InvalidConfig,
    /// Reading or writing local state failed.
    StorageFailure,
    /// The mapper only runs when the user is first imported.
    ImportOnly,
}

impl From<&FederationError> for SkipReason {
    fn from(err: &FederationError) -> Self {
        match err {
            FederationError::MissingConfig(_) => Self::MissingConfig,
            FederationError::Configuration(_) => Self::InvalidConfig,
            FederationError::Storage(_)
            | FederationError::GroupNotFound(_)
            | FederationError::GroupCycle(_) => Self::StorageFailure,
            FederationError::Connection(_)
            | FederationError::Remote(_)
            | FederationError::Parse(_)
            | FederationError::Timeout(_) => Self::RemoteFailure,
        }
    }
}

/// Result of running one mapper hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MapperOutcome {
    /// The mapper wrote its result.
    Applied,
    /// The mapper did nothing.
    Skipped(SkipReason),
}

impl MapperOutcome {
    /// Returns true if the mapper wrote its result.
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }

    /// Returns the skip reason, if skipped.
    #[must_use]
    pub const fn skip_reason(&self) -> Option<SkipReason> {
        match self {
            Self::Applied => None,
            Self::Skipped(reason) => Some(*reason),
        }
    }
}

// ============================================================================
// Broker Context
// ============================================================================

/// Everything a mapper sees about the current brokered login.
pub struct BrokerContext<'a> {
    /// Realm the login happens in.
    pub realm_id: Uuid,

    /// Raw token response stored by the broker, if any.
    pub broker_token: Option<&'a str>,

    /// The login transaction's authentication session.
    pub auth_session: &'a mut AuthenticationSession,

    /// Local group store.
    pub groups: &'a dyn GroupProvider,
}

impl<'a> BrokerContext<'a> {
    /// Creates a new broker context.
    #[must_use]
    pub fn new(
        realm_id: Uuid,
        broker_token: Option<&'a str>,
        auth_session: &'a mut AuthenticationSession,
        groups: &'a dyn GroupProvider,
    ) -> Self {
        Self {
            realm_id,
            broker_token,
            auth_session,
            groups,
        }
    }
}

impl std::fmt::Debug for BrokerContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrokerContext")
            .field("realm_id", &self.realm_id)
            .field("broker_token", &self.broker_token.map(|_| "[REDACTED]"))
            .field("auth_session", &self.auth_session.id())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Identity Provider Mapper
// ============================================================================

/// A mapper attached to an identity provider.
#[async_trait]
pub trait IdentityProviderMapper: FederationMapper {
    /// Runs when a brokered user is imported for the first time.
    async fn import_new_user(
        &self,
        context: &mut BrokerContext<'_>,
        user: &mut User,
        config: &MapperConfig,
    ) -> MapperOutcome {
        self.update_brokered_user(context, user, config).await
    }

    /// Runs when an existing brokered user logs in again.
    async fn update_brokered_user(
        &self,
        context: &mut BrokerContext<'_>,
        user: &mut User,
        config: &MapperConfig,
    ) -> MapperOutcome;
}

/// Which point of the brokered login mappers run at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrokerEvent {
    /// The user was just created from the brokered identity.
    NewUser,
    /// The user already existed and logged in again.
    ExistingUser,
}

/// Outcome of one mapper within [`run_mappers`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapperRun {
    /// Configured mapper name.
    pub mapper_name: String,
    /// What the mapper did.
    pub outcome: MapperOutcome,
}

/// Runs configured mappers in order for one brokered login.
///
/// Mappers whose config names [`SyncMode::Import`] only run for
/// [`BrokerEvent::NewUser`]. Every mapper runs regardless of how the
/// previous ones fared.
pub async fn run_mappers(
    mappers: &[(&dyn IdentityProviderMapper, &MapperConfig)],
    event: BrokerEvent,
    context: &mut BrokerContext<'_>,
    user: &mut User,
) -> Vec<MapperRun> {
    let mut runs = Vec::with_capacity(mappers.len());

    for (mapper, config) in mappers {
        let outcome = match event {
            BrokerEvent::NewUser => mapper.import_new_user(context, user, config).await,
            BrokerEvent::ExistingUser if config.sync_mode == SyncMode::Import => {
                MapperOutcome::Skipped(SkipReason::ImportOnly)
            }
            BrokerEvent::ExistingUser => {
                mapper.update_brokered_user(context, user, config).await
            }
        };

        debug!(
            mapper = %config.name,
            mapper_type = mapper.mapper_type(),
            ?outcome,
            "Mapper finished"
        );
        runs.push(MapperRun {
            mapper_name: config.name.clone(),
            outcome,
        });
    }

    let applied = runs.iter().filter(|r| r.outcome.is_applied()).count();
    info!(
        user_id = %user.id,
        applied,
        skipped = runs.len() - applied,
        "Brokered login mappers complete"
    );
    runs
}
