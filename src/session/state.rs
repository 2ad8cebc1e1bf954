//! Session state and user claims.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

use crate::provider::ProviderHandle;

/// Lifecycle of the application session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Uninitialized,
    Initializing,
    Ready,
    Connected,
    Errored,
}

impl SessionStatus {
    /// Whether `connect` may be called in this state.
    pub fn can_connect(&self) -> bool {
        matches!(self, SessionStatus::Ready | SessionStatus::Connected)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionStatus::Uninitialized => "uninitialized",
            SessionStatus::Initializing => "initializing",
            SessionStatus::Ready => "ready",
            SessionStatus::Connected => "connected",
            SessionStatus::Errored => "errored",
        };
        f.write_str(s)
    }
}

/// Profile claims returned by the adapter on login.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserInfo(pub Map<String, Value>);

impl UserInfo {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Builder-style insert.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The single authenticated state of the application.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub status: SessionStatus,
    pub active_provider: Option<ProviderHandle>,
    pub user_info: Option<UserInfo>,
    /// Adapter and login provider of the active connection.
    pub adapter: Option<String>,
    pub login_provider: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            status: SessionStatus::Uninitialized,
            active_provider: None,
            user_info: None,
            adapter: None,
            login_provider: None,
        }
    }

    /// Drop the provider and claims, returning to `Ready`.
    pub fn release(&mut self) {
        if let Some(provider) = self.active_provider.take() {
            provider.revoke();
        }
        self.user_info = None;
        self.adapter = None;
        self.login_provider = None;
        self.status = SessionStatus::Ready;
    }

    pub fn is_connected(&self) -> bool {
        self.status == SessionStatus::Connected && self.active_provider.is_some()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable view of the session for the console.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub status: SessionStatus,
    pub adapter: Option<String>,
    pub login_provider: Option<String>,
    pub chain_id: Option<String>,
    pub accounts: Vec<String>,
}

impl From<&Session> for SessionSnapshot {
    fn from(session: &Session) -> Self {
        let (chain_id, accounts) = match &session.active_provider {
            Some(handle) => (
                Some(handle.chain_id().to_string()),
                handle.accounts().iter().map(|a| a.to_string()).collect(),
            ),
            None => (None, Vec::new()),
        };
        Self {
            session_id: session.id,
            status: session.status,
            adapter: session.adapter.clone(),
            login_provider: session.login_provider.clone(),
            chain_id,
            accounts,
        }
    }
}
