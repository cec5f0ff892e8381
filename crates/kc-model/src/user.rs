//! User domain model.
//!
//! A brokered user is the local account an external login is linked to.
//! Mappers only ever touch its attribute map.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A local user.
///
/// Attributes are always multi-valued; a single-valued attribute is a
/// list with one entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier.
    pub id: Uuid,
    /// Realm this user belongs to.
    pub realm_id: Uuid,
    /// Username, unique within the realm.
    pub username: String,
    /// Custom attributes.
    pub attributes: HashMap<String, Vec<String>>,
    /// Last attribute change.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Creates a user without attributes.
    #[must_use]
    pub fn new(realm_id: Uuid, username: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            realm_id,
            username: username.into(),
            attributes: HashMap::new(),
            updated_at: Utc::now(),
        }
    }

    /// Sets an attribute at construction time.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, values: Vec<String>) -> Self {
        self.attributes.insert(name.into(), values);
        self
    }

    /// All values of an attribute.
    #[must_use]
    pub fn get_attribute(&self, name: &str) -> Option<&Vec<String>> {
        self.attributes.get(name)
    }

    /// First value of an attribute.
    #[must_use]
    pub fn get_first_attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Replaces an attribute's values.
    pub fn set_attribute(&mut self, name: impl Into<String>, values: Vec<String>) {
        self.attributes.insert(name.into(), values);
        self.updated_at = Utc::now();
    }

    /// Replaces an attribute with a single value.
    pub fn set_single_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.set_attribute(name, vec![value.into()]);
    }

    /// Removes an attribute, returning its previous values.
    pub fn remove_attribute(&mut self, name: &str) -> Option<Vec<String>> {
        let removed = self.attributes.remove(name);
        if removed.is_some() {
            self.updated_at = Utc::now();
        }
        removed
    }
}
