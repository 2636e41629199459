//! In-memory session state
//!
//! A [`Session`] is a cheap, cloneable handle to the credential and identity
//! of the current user. The root context creates one at startup and hands
//! clones to the dispatcher (which only reads it) and to the action layer
//! (which replaces it after register/login and clears it on sign-out).
//!
//! Nothing here is persisted. A restarted process starts unauthenticated.
//!
//! # Invariants
//!
//! - A token is held iff the session is authenticated.
//! - Role, label and expiry only exist alongside a token; they live in one
//!   [`Identity`] value that is swapped wholesale, so readers never see
//!   fields from two different logins.

use crate::clock::Clock;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Role string the server uses for administrators
pub const ADMIN_ROLE: &str = "ADMIN";

/// Role attached to an authenticated identity
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    /// Administrator, may use admin-only endpoints
    Admin,
    /// Any other role the server hands out
    Other(String),
}

impl Role {
    /// Parse a role as returned by the auth endpoints
    #[must_use]
    pub fn parse(value: &str) -> Self {
        if value == ADMIN_ROLE {
            Self::Admin
        } else {
            Self::Other(value.to_string())
        }
    }

    /// Wire representation
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Admin => ADMIN_ROLE,
            Self::Other(value) => value,
        }
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        if value == ADMIN_ROLE {
            Self::Admin
        } else {
            Self::Other(value)
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::Admin => ADMIN_ROLE.to_string(),
            Role::Other(value) => value,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capabilities a session may be checked for
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Capability {
    /// Access to the `/api/v1/admin/**` endpoints
    AdminOnly,
}

/// Credential plus the identity it was issued for
#[derive(Clone, PartialEq, Eq)]
pub struct Identity {
    token: String,
    role: Option<Role>,
    label: Option<String>,
    expires_at: Option<DateTime<Utc>>,
}

impl Identity {
    /// Create an identity with no known expiry
    #[must_use]
    pub fn new(token: impl Into<String>, role: Option<Role>, label: Option<String>) -> Self {
        Self {
            token: token.into(),
            role,
            label,
            expires_at: None,
        }
    }

    /// Builder: record when the token stops being valid
    #[must_use]
    pub const fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Bearer token
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Role, if the server reported one
    #[must_use]
    pub const fn role(&self) -> Option<&Role> {
        self.role.as_ref()
    }

    /// Display label (the email address for this API)
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Expiry, if known
    #[must_use]
    pub const fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// `Authorization` header value for this credential
    #[must_use]
    pub fn authorization_header_value(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

// Tokens must never reach logs.
impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("token", &"<redacted>")
            .field("role", &self.role)
            .field("label", &self.label)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Point-in-time view of a session
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionState {
    identity: Option<Identity>,
}

impl SessionState {
    /// Whether a credential is held
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    /// The held identity
    #[must_use]
    pub const fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// Role of the held identity
    #[must_use]
    pub fn role(&self) -> Option<&Role> {
        self.identity.as_ref().and_then(Identity::role)
    }

    /// Label of the held identity
    #[must_use]
    pub fn identity_label(&self) -> Option<&str> {
        self.identity.as_ref().and_then(Identity::label)
    }

    /// `"Bearer <token>"` when authenticated
    #[must_use]
    pub fn authorization_header_value(&self) -> Option<String> {
        self.identity.as_ref().map(Identity::authorization_header_value)
    }

    /// Capability check against the held role
    #[must_use]
    pub fn has_capability(&self, capability: Capability) -> bool {
        match capability {
            Capability::AdminOnly => matches!(self.role(), Some(Role::Admin)),
        }
    }

    /// Whether the held token is past its recorded expiry
    ///
    /// Unauthenticated sessions and tokens without a known expiry are never
    /// expired.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.identity
            .as_ref()
            .and_then(Identity::expires_at)
            .is_some_and(|expires_at| now >= expires_at)
    }
}

/// Shared handle to the session state
#[derive(Clone, Debug, Default)]
pub struct Session {
    inner: Arc<RwLock<SessionState>>,
}

impl Session {
    /// Create an empty, unauthenticated session
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // A panicking writer cannot leave a half-written identity behind (the
    // swap is a single assignment), so a poisoned lock is still consistent.
    fn read(&self) -> RwLockReadGuard<'_, SessionState> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether a credential is held
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.read().is_authenticated()
    }

    /// Replace token, role and label in one step
    ///
    /// An empty token leaves the session unauthenticated.
    pub fn set_identity(
        &self,
        token: impl Into<String>,
        role: Option<&str>,
        identity_label: Option<&str>,
    ) {
        self.replace(Identity::new(
            token,
            role.map(Role::parse),
            identity_label.map(str::to_string),
        ));
    }

    /// Replace the whole identity
    pub fn replace(&self, identity: Identity) {
        if identity.token.is_empty() {
            tracing::warn!("refusing empty token, session cleared");
            self.clear();
            return;
        }

        tracing::info!(
            role = identity.role().map(Role::as_str),
            label = identity.label(),
            expires_at = ?identity.expires_at(),
            "session identity replaced"
        );
        self.write().identity = Some(identity);
    }

    /// Drop the credential
    pub fn clear(&self) {
        let previous = self.write().identity.take();
        if previous.is_some() {
            tracing::info!("session cleared");
        }
    }

    /// Drop the credential only if it is still `token`
    ///
    /// Returns whether the session was cleared. An identity applied after
    /// `token` was read is left in place.
    pub fn clear_if_token(&self, token: &str) -> bool {
        let mut state = self.write();
        if !state.identity.as_ref().is_some_and(|identity| identity.token == token) {
            return false;
        }
        state.identity = None;
        drop(state);
        tracing::info!("session cleared");
        true
    }

    /// Drop the credential if it is past its recorded expiry
    ///
    /// Check and clear happen under one write lock.
    pub fn clear_if_expired(&self, clock: &impl Clock) -> bool {
        let mut state = self.write();
        if !state.is_expired(clock.now()) {
            return false;
        }
        state.identity = None;
        drop(state);
        tracing::info!("expired session cleared");
        true
    }

    /// The held access token
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.read().identity().map(|identity| identity.token().to_string())
    }

    /// `"Bearer <token>"` when authenticated
    #[must_use]
    pub fn current_authorization_header_value(&self) -> Option<String> {
        self.read().authorization_header_value()
    }

    /// Capability check against the held role
    #[must_use]
    pub fn has_capability(&self, capability: Capability) -> bool {
        self.read().has_capability(capability)
    }

    /// Whether the held token is past its recorded expiry
    #[must_use]
    pub fn is_expired(&self, clock: &impl Clock) -> bool {
        self.read().is_expired(clock.now())
    }

    /// Copy of the current state, for display
    #[must_use]
    pub fn snapshot(&self) -> SessionState {
        self.read().clone()
    }
}
