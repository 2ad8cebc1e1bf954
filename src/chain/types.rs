//! Chain descriptors and identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{WalletError, WalletResult};

/// Chain ID type for strong typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChainId(pub u64);

impl ChainId {
    /// Parse a `0x`-prefixed hex chain id such as `"0x89"`.
    pub fn from_hex(value: &str) -> WalletResult<Self> {
        let digits = value
            .strip_prefix("0x")
            .or_else(|| value.strip_prefix("0X"))
            .ok_or_else(|| {
                WalletError::Config(format!("chain id '{}' must be 0x-prefixed hex", value))
            })?;
        u64::from_str_radix(digits, 16)
            .map(ChainId)
            .map_err(|e| WalletError::Config(format!("invalid chain id '{}': {}", value, e)))
    }
}

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ChainId> for u64 {
    fn from(id: ChainId) -> Self {
        id.0
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Account-model family a chain belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainNamespace {
    Eip155,
    Solana,
    Other,
}

impl Default for ChainNamespace {
    fn default() -> Self {
        ChainNamespace::Eip155
    }
}

/// Static description of one target network.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Account model of the chain. Only EIP-155 chains can be connected.
    pub chain_namespace: ChainNamespace,

    /// Hex chain id, e.g. "0x1".
    pub chain_id: String,

    /// JSON-RPC endpoint.
    pub rpc_target: String,

    pub display_name: String,
    pub block_explorer_url: String,
    pub ticker: String,
    pub ticker_name: String,
}

impl ChainConfig {
    pub fn ethereum_mainnet() -> Self {
        Self {
            chain_namespace: ChainNamespace::Eip155,
            chain_id: "0x1".to_string(),
            rpc_target: "https://rpc.ankr.com/eth".to_string(),
            display_name: "Ethereum Mainnet".to_string(),
            block_explorer_url: "https://etherscan.io/".to_string(),
            ticker: "ETH".to_string(),
            ticker_name: "Ethereum".to_string(),
        }
    }

    pub fn polygon_mainnet() -> Self {
        Self {
            chain_namespace: ChainNamespace::Eip155,
            chain_id: "0x89".to_string(),
            rpc_target: "https://rpc-mainnet.matic.network".to_string(),
            display_name: "Polygon Mainnet".to_string(),
            block_explorer_url: "https://polygonscan.com/".to_string(),
            ticker: "MATIC".to_string(),
            ticker_name: "Polygon".to_string(),
        }
    }

    pub fn sepolia() -> Self {
        Self {
            chain_namespace: ChainNamespace::Eip155,
            chain_id: "0xaa36a7".to_string(),
            rpc_target: "https://rpc.ankr.com/eth_sepolia".to_string(),
            display_name: "Sepolia Testnet".to_string(),
            block_explorer_url: "https://sepolia.etherscan.io/".to_string(),
            ticker: "ETH".to_string(),
            ticker_name: "Ethereum".to_string(),
        }
    }

    /// Local development node (Anvil/Hardhat defaults).
    pub fn local(rpc_target: impl Into<String>) -> Self {
        Self {
            chain_namespace: ChainNamespace::Eip155,
            chain_id: "0x7a69".to_string(),
            rpc_target: rpc_target.into(),
            display_name: "Local Devnet".to_string(),
            block_explorer_url: String::new(),
            ticker: "ETH".to_string(),
            ticker_name: "Ethereum".to_string(),
        }
    }

    /// Numeric form of `chain_id`.
    pub fn chain_id_u64(&self) -> WalletResult<ChainId> {
        ChainId::from_hex(&self.chain_id)
    }

    /// Parsed `rpc_target`.
    pub fn rpc_url(&self) -> WalletResult<url::Url> {
        self.rpc_target.parse().map_err(|e| {
            WalletError::Config(format!("invalid RPC URL '{}': {}", self.rpc_target, e))
        })
    }

    /// Reject chains the RPC facade cannot talk to.
    pub fn require_eip155(&self) -> WalletResult<()> {
        match self.chain_namespace {
            ChainNamespace::Eip155 => Ok(()),
            other => Err(WalletError::Connection(format!(
                "chain namespace {:?} is not supported, only eip155",
                other
            ))),
        }
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self::ethereum_mainnet()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_id_from_hex() {
        assert_eq!(ChainId::from_hex("0x1").unwrap(), ChainId(1));
        assert_eq!(ChainId::from_hex("0x89").unwrap(), ChainId(137));
        assert!(ChainId::from_hex("137").is_err());
        assert!(ChainId::from_hex("0xzz").is_err());
    }

    #[test]
    fn test_chain_id_display_is_hex() {
        assert_eq!(ChainId(137).to_string(), "0x89");
        assert_eq!(ChainId(1).to_string(), "0x1");
    }

    #[test]
    fn test_presets() {
        assert_eq!(ChainConfig::polygon_mainnet().chain_id_u64().unwrap(), ChainId(137));
        assert_eq!(ChainConfig::sepolia().chain_id_u64().unwrap(), ChainId(11155111));
        assert!(ChainConfig::default().rpc_url().is_ok());
    }

    #[test]
    fn test_namespace_guard() {
        let mut chain = ChainConfig::default();
        assert!(chain.require_eip155().is_ok());
        chain.chain_namespace = ChainNamespace::Solana;
        assert!(matches!(
            chain.require_eip155(),
            Err(WalletError::Connection(_))
        ));
    }

    #[test]
    fn test_namespace_serde() {
        let chain: ChainConfig = toml::from_str(
            r#"
            chain_namespace = "eip155"
            chain_id = "0x5"
            rpc_target = "http://localhost:8545"
            "#,
        )
        .unwrap();
        assert_eq!(chain.chain_namespace, ChainNamespace::Eip155);
        assert_eq!(chain.chain_id_u64().unwrap(), ChainId(5));
        // unspecified display fields fall back to the mainnet preset
        assert_eq!(chain.ticker, "ETH");
    }
}
