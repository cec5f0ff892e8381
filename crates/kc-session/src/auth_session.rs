//! Authentication session model.
//!
//! One session spans one login transaction. Broker mappers share data
//! through its notes, and the notes are dropped with the session, so
//! anything cached there never outlives the login.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// State of one in-flight login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticationSession {
    id: Uuid,
    /// Realm the login happens in.
    pub realm_id: Uuid,
    /// Alias of the identity provider the login went through.
    pub identity_provider: Option<String>,
    notes: HashMap<String, String>,
}

impl AuthenticationSession {
    /// Starts a session for a new login.
    #[must_use]
    pub fn new(realm_id: Uuid) -> Self {
        Self {
            id: Uuid::now_v7(),
            realm_id,
            identity_provider: None,
            notes: HashMap::new(),
        }
    }

    /// Records the identity provider alias.
    #[must_use]
    pub fn with_identity_provider(mut self, alias: impl Into<String>) -> Self {
        self.identity_provider = Some(alias.into());
        self
    }

    /// Session identifier.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Stores a note, replacing any previous value.
    pub fn set_note(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.notes.insert(key.into(), value.into());
    }

    /// Reads a note.
    #[must_use]
    pub fn get_note(&self, key: &str) -> Option<&str> {
        self.notes.get(key).map(String::as_str)
    }

    /// Removes a note, returning its value.
    pub fn remove_note(&mut self, key: &str) -> Option<String> {
        self.notes.remove(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sessions_are_distinct() {
        let realm_id = Uuid::now_v7();
        let first = AuthenticationSession::new(realm_id).with_identity_provider("azure");
        let second = AuthenticationSession::new(realm_id);

        assert_ne!(first.id(), second.id());
        assert_eq!(first.identity_provider.as_deref(), Some("azure"));
        assert_eq!(second.identity_provider, None);
    }

    #[test]
    fn notes_are_scoped_to_the_session() {
        let realm_id = Uuid::now_v7();
        let mut session = AuthenticationSession::new(realm_id);
        session.set_note("graph-api-user", "{}");

        assert_eq!(session.get_note("graph-api-user"), Some("{}"));
        assert_eq!(AuthenticationSession::new(realm_id).get_note("graph-api-user"), None);

        assert_eq!(session.remove_note("graph-api-user"), Some("{}".to_string()));
        assert_eq!(session.get_note("graph-api-user"), None);
    }
}
