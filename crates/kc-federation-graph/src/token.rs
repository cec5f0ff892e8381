//! Broker credential resolution.
//!
//! The broker stores the identity provider's token response as a JSON
//! string. Resolution never fails: anything unusable means "no credential".

use serde::Deserialize;
use tracing::warn;

/// Token response stored by the broker after an OIDC login.
#[derive(Clone, Deserialize)]
pub struct BrokerToken {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    id_token: Option<String>,
    #[serde(default)]
    scope: Option<String>,
}

impl BrokerToken {
    /// Creates a token holding only an access token.
    #[must_use]
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: Some("Bearer".to_string()),
            expires_in: None,
            refresh_token: None,
            id_token: None,
            scope: None,
        }
    }

    /// Resolves the broker's raw token payload.
    ///
    /// Returns `None` when the payload is absent, blank, malformed, or
    /// carries an empty access token.
    #[must_use]
    pub fn resolve(raw: Option<&str>) -> Option<Self> {
        let raw = raw.map(str::trim).filter(|r| !r.is_empty())?;

        match serde_json::from_str::<Self>(raw) {
            Ok(token) if token.access_token.trim().is_empty() => None,
            Ok(token) => Some(token),
            Err(e) => {
                warn!(error = %e, "Stored broker token could not be parsed");
                None
            }
        }
    }

    /// Returns the access token.
    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Returns the token type, if given.
    #[must_use]
    pub fn token_type(&self) -> Option<&str> {
        self.token_type.as_deref()
    }

    /// Returns the access token lifetime in seconds, if given.
    #[must_use]
    pub const fn expires_in(&self) -> Option<i64> {
        self.expires_in
    }

    /// Returns the granted scope, if given.
    #[must_use]
    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    /// Returns true if a refresh token was issued.
    #[must_use]
    pub const fn has_refresh_token(&self) -> bool {
        self.refresh_token.is_some()
    }

    /// Returns true if an ID token was issued.
    #[must_use]
    pub const fn has_id_token(&self) -> bool {
        self.id_token.is_some()
    }
}

impl std::fmt::Debug for BrokerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrokerToken")
            .field("access_token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}
