//! Target network descriptions.
//!
//! A `ChainConfig` is immutable once constructed; one per target network.
//! Only EIP-155 (account-based EVM) chains can be connected.

pub mod types;

pub use types::{ChainConfig, ChainId, ChainNamespace};
