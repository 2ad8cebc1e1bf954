//! Plugins that augment adapters around connect and disconnect.

use alloy::providers::Provider;
use async_trait::async_trait;
use serde::Deserialize;
use tokio::time::timeout;

use crate::chain::ChainConfig;
use crate::config::schema::RpcConfig;
use crate::error::{WalletError, WalletResult};
use crate::provider::ProviderHandle;

/// Hook invoked by the session manager for every adapter.
#[async_trait]
pub trait AdapterPlugin: Send + Sync {
    fn name(&self) -> &str;

    /// Runs after the adapter connected; an error rejects the connection.
    async fn on_connected(
        &self,
        provider: &ProviderHandle,
        chain: &ChainConfig,
        rpc: &RpcConfig,
    ) -> WalletResult<()>;

    async fn on_disconnected(&self) -> WalletResult<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChainGuardSettings {
    /// Reject the connection on mismatch instead of warning.
    pub strict: bool,
}

/// Verifies the connected node serves the configured chain.
pub struct ChainGuardPlugin {
    name: String,
    settings: ChainGuardSettings,
}

impl ChainGuardPlugin {
    pub fn new(name: impl Into<String>, strict: bool) -> Self {
        Self {
            name: name.into(),
            settings: ChainGuardSettings { strict },
        }
    }

    pub fn from_settings(name: impl Into<String>, settings: &toml::Table) -> WalletResult<Self> {
        let name = name.into();
        let settings: ChainGuardSettings = toml::Value::Table(settings.clone())
            .try_into()
            .map_err(|e| {
                WalletError::Initialization(format!("invalid settings for plugin '{}': {}", name, e))
            })?;
        Ok(Self { name, settings })
    }

    fn reject_or_warn(&self, reason: String) -> WalletResult<()> {
        if self.settings.strict {
            return Err(WalletError::Connection(reason));
        }
        tracing::warn!(plugin = %self.name, reason = %reason, "Chain verification failed");
        Ok(())
    }
}

#[async_trait]
impl AdapterPlugin for ChainGuardPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    async fn on_connected(
        &self,
        provider: &ProviderHandle,
        chain: &ChainConfig,
        rpc: &RpcConfig,
    ) -> WalletResult<()> {
        let expected = chain.chain_id_u64()?;
        match timeout(rpc.timeout(), provider.client().get_chain_id()).await {
            Ok(Ok(actual)) if actual == expected.0 => {
                tracing::debug!(plugin = %self.name, chain_id = %expected, "Chain verified");
                Ok(())
            }
            Ok(Ok(actual)) => self.reject_or_warn(format!(
                "Chain ID mismatch: expected {}, got {:#x}",
                expected, actual
            )),
            Ok(Err(e)) => self.reject_or_warn(format!("could not query chain id: {}", e)),
            Err(_) => self.reject_or_warn(format!(
                "chain id query timed out after {} seconds",
                rpc.timeout_secs
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_setting() {
        let table: toml::Table = toml::from_str("strict = true").unwrap();
        let plugin = ChainGuardPlugin::from_settings("chain-guard", &table).unwrap();
        assert!(plugin.reject_or_warn("x".into()).is_err());

        let lenient = ChainGuardPlugin::new("chain-guard", false);
        assert!(lenient.reject_or_warn("x".into()).is_ok());
    }
}
