//! Broker mapper configuration.
//!
//! Mapper configuration is an opaque string map owned by the host. Map-typed
//! entries use the host's serialisation: a JSON array of `{"key", "value"}`
//! objects, where repeated keys carry multiple values.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{FederationError, FederationResult};

/// When brokered data is re-applied to an existing user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncMode {
    /// Follow the identity provider's own setting.
    #[default]
    Legacy,

    /// Apply only when the user is first imported.
    Import,

    /// Apply on every login.
    Force,
}

impl SyncMode {
    /// Every sync mode, in declaration order.
    pub const ALL: [Self; 3] = [Self::Legacy, Self::Import, Self::Force];
}

/// Configuration for one broker mapper instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapperConfig {
    /// Mapper ID.
    pub id: Uuid,

    /// Mapper name.
    pub name: String,

    /// Mapper type (provider id of the mapper implementation).
    pub mapper_type: String,

    /// Alias of the identity provider this mapper is attached to.
    pub identity_provider_alias: String,

    /// Sync mode.
    pub sync_mode: SyncMode,

    /// Mapper-specific configuration.
    pub config: HashMap<String, String>,
}

/// One entry of a map-typed configuration value.
#[derive(Debug, Deserialize)]
struct ConfigMapEntry {
    key: String,
    #[serde(default)]
    value: Option<String>,
}

impl MapperConfig {
    /// Creates a new mapper config.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        mapper_type: impl Into<String>,
        identity_provider_alias: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            name: name.into(),
            mapper_type: mapper_type.into(),
            identity_provider_alias: identity_provider_alias.into(),
            sync_mode: SyncMode::default(),
            config: HashMap::new(),
        }
    }

    /// Adds a config value.
    #[must_use]
    pub fn with_config(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.insert(key.into(), value.into());
        self
    }

    /// Adds a map-typed config value from `(key, value)` pairs.
    #[must_use]
    pub fn with_config_map<K, V>(mut self, key: impl Into<String>, entries: &[(K, V)]) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let encoded: Vec<serde_json::Value> = entries
            .iter()
            .map(|(k, v)| serde_json::json!({ "key": k.as_ref(), "value": v.as_ref() }))
            .collect();
        self.config
            .insert(key.into(), serde_json::Value::Array(encoded).to_string());
        self
    }

    /// Sets the sync mode.
    #[must_use]
    pub const fn with_sync_mode(mut self, mode: SyncMode) -> Self {
        self.sync_mode = mode;
        self
    }

    /// Gets a config value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.config.get(key).map(String::as_str)
    }

    /// Gets a non-blank config value or a [`FederationError::MissingConfig`].
    pub fn require(&self, key: &str) -> FederationResult<&str> {
        self.get(key)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| FederationError::missing_config(key))
    }

    /// Reads a map-typed config value.
    ///
    /// A missing or blank entry is an empty map. Entries without a value are
    /// ignored; repeated keys accumulate values in configuration order.
    ///
    /// ## Errors
    ///
    /// Returns [`FederationError::Configuration`] if the entry is not a JSON
    /// array of key/value objects.
    pub fn get_config_map(&self, key: &str) -> FederationResult<HashMap<String, Vec<String>>> {
        let Some(raw) = self.get(key).filter(|v| !v.trim().is_empty()) else {
            return Ok(HashMap::new());
        };

        let entries: Vec<ConfigMapEntry> = serde_json::from_str(raw)
            .map_err(|e| FederationError::config(format!("invalid map value for '{key}': {e}")))?;

        let mut map: HashMap<String, Vec<String>> = HashMap::new();
        for entry in entries {
            if let Some(value) = entry.value {
                map.entry(entry.key).or_default().push(value);
            }
        }
        Ok(map)
    }
}
