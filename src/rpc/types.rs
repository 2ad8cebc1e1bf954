//! Result shapes returned by the RPC facade.

use alloy::primitives::{Address, TxHash, U256};
use alloy::rpc::types::TransactionReceipt;
use serde::Serialize;

/// Native balance of the primary account.
#[derive(Debug, Clone, Serialize)]
pub struct Balance {
    pub address: Address,
    pub wei: U256,
    /// Balance in ether, as a decimal string.
    pub ether: String,
}

/// The parts of a receipt worth showing to a user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TxReceiptSummary {
    pub transaction_hash: TxHash,
    pub block_number: Option<u64>,
    pub gas_used: u64,
    pub success: bool,
    pub contract_address: Option<Address>,
}

impl From<&TransactionReceipt> for TxReceiptSummary {
    fn from(receipt: &TransactionReceipt) -> Self {
        Self {
            transaction_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
            gas_used: receipt.gas_used,
            success: receipt.status(),
            contract_address: receipt.contract_address,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DeployedContract {
    pub address: Address,
    pub transaction_hash: TxHash,
}

/// Signed statement proving control of the session's account.
#[derive(Debug, Clone, Serialize)]
pub struct IdentityProof {
    pub address: Address,
    pub message: String,
    /// 65-byte signature, 0x-prefixed hex.
    pub signature: String,
    /// Seconds since epoch.
    pub issued_at: u64,
}
