//! External-wallet adapter whose accounts are managed by the node.
//!
//! The node answers `eth_accounts`, signs with `personal_sign` and submits
//! with `eth_sendTransaction`, much like an injected browser wallet or a
//! bridged mobile wallet would.

use alloy::providers::{Provider, ProviderBuilder};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tokio::time::timeout;

use crate::adapters::types::{Connected, LoginOptions, WalletAdapter};
use crate::chain::ChainConfig;
use crate::config::schema::RpcConfig;
use crate::error::{WalletError, WalletResult};
use crate::provider::{AccountSigner, ProviderHandle};
use crate::session::UserInfo;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NodeAccountsSettings {
    /// Session lifetime for logins through this adapter, in seconds.
    pub session_time_secs: Option<u64>,
}

pub struct NodeAccountsAdapter {
    name: String,
    settings: NodeAccountsSettings,
}

impl NodeAccountsAdapter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            settings: NodeAccountsSettings::default(),
        }
    }

    pub fn from_settings(name: impl Into<String>, settings: &toml::Table) -> WalletResult<Self> {
        let name = name.into();
        let settings: NodeAccountsSettings = toml::Value::Table(settings.clone())
            .try_into()
            .map_err(|e| {
                WalletError::Initialization(format!("invalid settings for adapter '{}': {}", name, e))
            })?;
        Ok(Self { name, settings })
    }
}

#[async_trait]
impl WalletAdapter for NodeAccountsAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn session_time(&self) -> Option<Duration> {
        self.settings.session_time_secs.map(Duration::from_secs)
    }

    async fn init(&self, chain: &ChainConfig) -> WalletResult<()> {
        tracing::debug!(adapter = %self.name, rpc_target = %chain.rpc_target, "Node accounts adapter ready");
        Ok(())
    }

    async fn connect(
        &self,
        chain: &ChainConfig,
        options: &LoginOptions,
        rpc: &RpcConfig,
    ) -> WalletResult<Connected> {
        chain.require_eip155()?;

        let chain_id = chain.chain_id_u64()?;
        let rpc_url = chain.rpc_url()?;
        let provider = ProviderBuilder::new().connect_http(rpc_url.clone()).erased();

        let accounts = match timeout(rpc.timeout(), provider.get_accounts()).await {
            Ok(Ok(accounts)) => accounts,
            Ok(Err(e)) => {
                return Err(WalletError::Connection(format!(
                    "wallet rejected account request: {}",
                    e
                )))
            }
            Err(_) => {
                return Err(WalletError::Connection(format!(
                    "account request timed out after {} seconds",
                    rpc.timeout_secs
                )))
            }
        };

        let primary = match accounts.first() {
            Some(address) => *address,
            None => {
                return Err(WalletError::Connection(
                    "wallet exposes no accounts".to_string(),
                ))
            }
        };

        let login = if options.login_provider.is_empty() {
            self.name.as_str()
        } else {
            options.login_provider.as_str()
        };
        let user_info = UserInfo::new()
            .with("typeOfLogin", login)
            .with("verifierId", primary.to_string().to_lowercase())
            .with("walletAddress", primary.to_string());

        tracing::info!(
            adapter = %self.name,
            accounts = accounts.len(),
            primary = %primary,
            "Node wallet connected"
        );

        Ok(Connected {
            provider: ProviderHandle::new(
                self.name.clone(),
                chain_id,
                rpc_url,
                provider,
                AccountSigner::Node(accounts),
            ),
            user_info,
        })
    }
}
