//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the wallet
//! session. All types derive Serde traits for deserialization from TOML.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

pub use crate::chain::ChainConfig;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Client identifier (API key) issued by the auth dashboard.
    pub client_id: String,

    /// Auth network environment.
    pub network: Web3AuthNetwork,

    /// Target chain.
    pub chain: ChainConfig,

    /// Wallet adapters. Later entries with the same name replace earlier ones.
    pub adapters: Vec<AdapterConfig>,

    /// Plugins run around connect/disconnect.
    pub plugins: Vec<PluginConfig>,

    /// Session lifetime and persistence.
    pub session: SessionConfig,

    /// RPC call limits.
    pub rpc: RpcConfig,

    /// HTTP console settings.
    pub console: ConsoleConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            network: Web3AuthNetwork::default(),
            chain: ChainConfig::default(),
            adapters: vec![
                AdapterConfig {
                    name: "openlogin".to_string(),
                    kind: AdapterKind::LocalKey,
                    priority: 10,
                    settings: toml::Table::new(),
                },
                AdapterConfig {
                    name: "injected".to_string(),
                    kind: AdapterKind::NodeAccounts,
                    priority: 0,
                    settings: toml::Table::new(),
                },
            ],
            plugins: vec![PluginConfig {
                name: "chain-guard".to_string(),
                kind: PluginKind::ChainGuard,
                settings: toml::Table::new(),
            }],
            session: SessionConfig::default(),
            rpc: RpcConfig::default(),
            console: ConsoleConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Auth network environment tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Web3AuthNetwork {
    Mainnet,
    Testnet,
    Cyan,
    Aqua,
    #[default]
    SapphireDevnet,
    SapphireMainnet,
}

impl Web3AuthNetwork {
    pub fn is_production(&self) -> bool {
        matches!(
            self,
            Web3AuthNetwork::Mainnet
                | Web3AuthNetwork::Cyan
                | Web3AuthNetwork::Aqua
                | Web3AuthNetwork::SapphireMainnet
        )
    }
}

impl fmt::Display for Web3AuthNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Web3AuthNetwork::Mainnet => "mainnet",
            Web3AuthNetwork::Testnet => "testnet",
            Web3AuthNetwork::Cyan => "cyan",
            Web3AuthNetwork::Aqua => "aqua",
            Web3AuthNetwork::SapphireDevnet => "sapphire_devnet",
            Web3AuthNetwork::SapphireMainnet => "sapphire_mainnet",
        };
        f.write_str(tag)
    }
}

/// Kind of wallet adapter to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterKind {
    /// Login provider backed by a locally held key.
    LocalKey,
    /// External wallet whose accounts live in the node.
    NodeAccounts,
}

/// One adapter entry.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AdapterConfig {
    /// Unique adapter name used by `connect`.
    pub name: String,

    pub kind: AdapterKind,

    /// Ordering hint (higher = preferred default).
    #[serde(default)]
    pub priority: i32,

    /// Adapter-specific settings, interpreted by the adapter.
    #[serde(default)]
    pub settings: toml::Table,
}

/// Kind of plugin to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PluginKind {
    ChainGuard,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PluginConfig {
    pub name: String,
    pub kind: PluginKind,
    #[serde(default)]
    pub settings: toml::Table,
}

/// Session lifetime and cache.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// How long a cached login stays valid, in seconds.
    pub session_time_secs: u64,

    /// Where the session cache is written. Empty disables persistence.
    pub cache_path: String,

    /// Reconnect from the cache during `initialize()`.
    pub restore: bool,
}

impl SessionConfig {
    pub fn session_time(&self) -> Duration {
        Duration::from_secs(self.session_time_secs)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_time_secs: 86_400,
            cache_path: ".wallet-session/session.json".to_string(),
            restore: true,
        }
    }
}

/// RPC call limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RpcConfig {
    /// Per-call timeout in seconds.
    pub timeout_secs: u64,

    /// Maximum time to wait for a transaction receipt in seconds.
    pub receipt_timeout_secs: u64,

    /// Receipt polling interval in milliseconds.
    pub poll_interval_ms: u64,
}

impl RpcConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn receipt_timeout(&self) -> Duration {
        Duration::from_secs(self.receipt_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            receipt_timeout_secs: 120,
            poll_interval_ms: 2_000,
        }
    }
}

/// HTTP console configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Bind address of the HTTP console.
    pub bind_address: String,

    /// Number of console entries kept in memory.
    pub history: usize,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8085".to_string(),
            history: 50,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log filter directive used when RUST_LOG is unset.
    pub log_level: String,

    /// Serve Prometheus metrics from the HTTP console.
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "wallet_session=info,tower_http=info".to_string(),
            metrics_enabled: true,
        }
    }
}
