//! Per-login profile cache.
//!
//! Remote records fetched during one login are stored as JSON in the
//! authentication session's notes, so every mapper of the same login
//! shares a single fetch per resource. The cache lives and dies with the
//! session; nothing is kept across logins.
//!
//! A "not found" answer is cached too, as JSON `null`, so a user without a
//! manager is asked about once per login.

use std::future::Future;

use kc_session::AuthenticationSession;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::GraphResult;

/// Session note holding the user's profile.
pub const USER_CACHE_KEY: &str = "graph-api-user";

/// Session note holding the user's manager profile.
pub const MANAGER_CACHE_KEY: &str = "graph-api-user-manager";

/// Session note holding the user's transitive groups.
pub const GROUPS_CACHE_KEY: &str = "graph-api-groups";

/// Profile cache backed by authentication session notes.
#[derive(Debug)]
pub struct SessionProfileCache<'a> {
    session: &'a mut AuthenticationSession,
}

impl<'a> SessionProfileCache<'a> {
    /// Wraps a session.
    #[must_use]
    pub fn new(session: &'a mut AuthenticationSession) -> Self {
        Self { session }
    }

    /// Looks up a cached record.
    ///
    /// - `None`: nothing cached (or the entry was malformed and dropped)
    /// - `Some(None)`: the directory reported the resource as not found
    /// - `Some(Some(_))`: the cached record
    pub fn get<T: DeserializeOwned>(&mut self, key: &str) -> Option<Option<T>> {
        let raw = self.session.get_note(key)?;

        match serde_json::from_str::<Option<T>>(raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key = %key, error = %e, "Dropping malformed cached profile");
                self.session.remove_note(key);
                None
            }
        }
    }

    /// Stores a record, or a not-found marker for `None`.
    pub fn put<T: Serialize>(&mut self, key: &str, value: Option<&T>) {
        match serde_json::to_string(&value) {
            Ok(json) => self.session.set_note(key, json),
            Err(e) => warn!(key = %key, error = %e, "Profile could not be cached"),
        }
    }

    /// Returns the cached record, fetching and caching it on a miss.
    ///
    /// Errors from `fetch` are returned as-is and nothing is cached.
    ///
    /// ## Errors
    ///
    /// Propagates the fetch error.
    pub async fn get_or_fetch<T, F, Fut>(&mut self, key: &str, fetch: F) -> GraphResult<Option<T>>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = GraphResult<Option<T>>>,
    {
        if let Some(cached) = self.get(key) {
            debug!(key = %key, "Profile served from session cache");
            return Ok(cached);
        }

        let fetched = fetch().await?;
        self.put(key, fetched.as_ref());
        Ok(fetched)
    }
}
