//! Adapter contract and login options.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

use crate::chain::ChainConfig;
use crate::config::schema::{AdapterKind, RpcConfig};
use crate::error::WalletResult;
use crate::provider::ProviderHandle;
use crate::session::UserInfo;

/// Registration entry for an adapter built from configuration.
#[derive(Debug, Clone)]
pub struct AdapterDescriptor {
    pub name: String,
    pub kind: AdapterKind,
    /// Opaque settings bag, interpreted by the adapter.
    pub settings: toml::Table,
    /// Higher priority adapters are listed (and chosen by default) first.
    pub priority: i32,
}

impl AdapterDescriptor {
    pub fn new(name: impl Into<String>, kind: AdapterKind) -> Self {
        Self {
            name: name.into(),
            kind,
            settings: toml::Table::new(),
            priority: 0,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_setting(mut self, key: &str, value: impl Into<toml::Value>) -> Self {
        self.settings.insert(key.to_string(), value.into());
        self
    }
}

/// Options for a single login attempt.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginOptions {
    /// Login method, e.g. "line", "google" or "jwt".
    pub login_provider: String,

    /// Identity token for `jwt` logins (e.g. from an in-app browser bridge).
    #[serde(skip_serializing)]
    pub id_token: Option<String>,

    /// JWT claim carrying the verifier id. Defaults to "sub".
    pub verifier_id_field: Option<String>,

    /// Additional login parameters (e.g. a login hint), echoed into the
    /// user's claims by adapters that understand them.
    pub extra: Map<String, Value>,

    /// Set when the login is replayed from the session cache.
    #[serde(skip)]
    pub resumed: bool,
}

impl LoginOptions {
    pub fn new(login_provider: impl Into<String>) -> Self {
        Self {
            login_provider: login_provider.into(),
            ..Self::default()
        }
    }

    pub fn jwt(id_token: impl Into<String>) -> Self {
        Self {
            login_provider: "jwt".to_string(),
            id_token: Some(id_token.into()),
            ..Self::default()
        }
    }
}

/// Outcome of a successful adapter connect.
#[derive(Debug, Clone)]
pub struct Connected {
    pub provider: ProviderHandle,
    pub user_info: UserInfo,
}

/// A pluggable strategy for establishing a wallet session.
#[async_trait]
pub trait WalletAdapter: Send + Sync {
    /// Registry name of this adapter.
    fn name(&self) -> &str;

    /// Session lifetime override for logins through this adapter.
    fn session_time(&self) -> Option<Duration> {
        None
    }

    /// One-time preparation during `initialize()`.
    async fn init(&self, chain: &ChainConfig) -> WalletResult<()>;

    /// Establish a session and hand back a provider.
    async fn connect(
        &self,
        chain: &ChainConfig,
        options: &LoginOptions,
        rpc: &RpcConfig,
    ) -> WalletResult<Connected>;

    /// Tear down adapter-side state for the session.
    async fn disconnect(&self) -> WalletResult<()> {
        Ok(())
    }
}
