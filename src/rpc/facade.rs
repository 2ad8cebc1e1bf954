//! Chain operations over the active provider.
//!
//! # Responsibilities
//! - Refuse every call when no provider is connected, without network I/O
//! - Bound each RPC call by the configured timeout
//! - Build, submit and confirm value transfers
//! - Sign and verify EIP-191 messages

use alloy::network::TransactionBuilder;
use alloy::primitives::utils::{format_ether, parse_ether};
use alloy::primitives::{Address, Bytes, Signature, TxHash};
use alloy::providers::{DynProvider, Provider};
use alloy::rpc::types::{TransactionReceipt, TransactionRequest};
use alloy::signers::Signer;
use std::fmt;
use std::future::IntoFuture;
use tokio::time::{interval, timeout};

use crate::chain::ChainId;
use crate::config::schema::RpcConfig;
use crate::error::{WalletError, WalletResult};
use crate::observability::metrics;
use crate::provider::{AccountSigner, ProviderHandle};
use crate::rpc::types::{Balance, TxReceiptSummary};

/// Facade over the session's provider. Cheap to create per request.
#[derive(Debug, Clone)]
pub struct ChainRpcFacade {
    provider: Option<ProviderHandle>,
    config: RpcConfig,
}

impl ChainRpcFacade {
    pub fn new(provider: Option<ProviderHandle>, config: RpcConfig) -> Self {
        Self { provider, config }
    }

    /// The live handle; a handle revoked by logout counts as absent.
    pub(crate) fn handle(&self) -> WalletResult<&ProviderHandle> {
        self.provider
            .as_ref()
            .filter(|handle| !handle.is_revoked())
            .ok_or(WalletError::NotConnected)
    }

    pub fn is_connected(&self) -> bool {
        self.handle().is_ok()
    }

    /// Account used as `from` for signing and sending.
    pub fn primary_account(&self) -> WalletResult<Address> {
        self.handle()?.primary_account()
    }

    pub(crate) async fn call<F, T, E>(&self, operation: &'static str, fut: F) -> WalletResult<T>
    where
        F: IntoFuture<Output = Result<T, E>>,
        E: fmt::Display,
    {
        self.call_as(operation, fut, WalletError::Sdk).await
    }

    pub(crate) async fn call_as<F, T, E>(
        &self,
        operation: &'static str,
        fut: F,
        kind: fn(String) -> WalletError,
    ) -> WalletResult<T>
    where
        F: IntoFuture<Output = Result<T, E>>,
        E: fmt::Display,
    {
        let outcome = match timeout(self.config.timeout(), fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(kind(format!("{} failed: {}", operation, e))),
            Err(_) => Err(kind(format!(
                "{} timed out after {} seconds",
                operation, self.config.timeout_secs
            ))),
        };
        metrics::record_rpc_call(operation, outcome.is_ok());
        if let Err(e) = &outcome {
            tracing::warn!(operation, error = %e, "RPC call failed");
        }
        outcome
    }

    /// Chain id reported by the node.
    pub async fn get_chain_id(&self) -> WalletResult<ChainId> {
        let client = self.handle()?.client();
        let id = self.call("eth_chainId", client.get_chain_id()).await?;
        Ok(ChainId(id))
    }

    /// Accounts controlled by the session.
    pub async fn get_accounts(&self) -> WalletResult<Vec<Address>> {
        let handle = self.handle()?;
        match handle.signer() {
            AccountSigner::Local(signer) => Ok(vec![signer.address()]),
            AccountSigner::Node(_) => {
                let client = handle.client();
                self.call("eth_accounts", client.get_accounts()).await
            }
        }
    }

    /// Balance of the primary account.
    pub async fn get_balance(&self) -> WalletResult<Balance> {
        let handle = self.handle()?;
        let address = handle.primary_account()?;
        let client = handle.client();
        let wei = self.call("eth_getBalance", client.get_balance(address)).await?;
        Ok(Balance {
            address,
            wei,
            ether: format_ether(wei),
        })
    }

    /// EIP-191 personal signature over `message` by the primary account.
    pub async fn sign_message(&self, message: &str) -> WalletResult<Signature> {
        let handle = self.handle()?;
        match handle.signer() {
            AccountSigner::Local(signer) => {
                let outcome = signer
                    .sign_message(message.as_bytes())
                    .await
                    .map_err(|e| WalletError::Sdk(format!("Message signing failed: {}", e)));
                // the node path is counted by `call`
                metrics::record_rpc_call("sign_message", outcome.is_ok());
                outcome
            }
            AccountSigner::Node(_) => {
                let from = handle.primary_account()?;
                let client = handle.client();
                let raw: Bytes = self
                    .call(
                        "personal_sign",
                        client.raw_request::<_, Bytes>(
                            "personal_sign".into(),
                            (Bytes::copy_from_slice(message.as_bytes()), from),
                        ),
                    )
                    .await?;
                Signature::from_raw(&raw)
                    .map_err(|e| WalletError::Sdk(format!("wallet returned a bad signature: {}", e)))
            }
        }
    }

    /// Recover the address that produced `signature` over `message`.
    pub fn verify_message(message: &str, signature: &Signature) -> WalletResult<Address> {
        signature
            .recover_address_from_msg(message.as_bytes())
            .map_err(|e| WalletError::InvalidInput(format!("signature does not verify: {}", e)))
    }

    /// Transfer `amount` ether to `destination` and wait for the receipt.
    pub async fn send_transaction(
        &self,
        amount: &str,
        destination: &str,
    ) -> WalletResult<TxReceiptSummary> {
        self.handle()?;
        let to = parse_address(destination)?;
        let value = parse_ether(amount.trim()).map_err(|e| {
            WalletError::InvalidInput(format!("invalid ether amount '{}': {}", amount, e))
        })?;

        let tx = TransactionRequest::default().with_to(to).with_value(value);
        self.submit(tx).await
    }

    /// Hex private key of a locally held account.
    pub fn get_private_key(&self) -> WalletResult<String> {
        match self.handle()?.signer() {
            AccountSigner::Local(signer) => Ok(alloy::hex::encode_prefixed(signer.to_bytes())),
            AccountSigner::Node(_) => Err(WalletError::Unsupported(
                "private key export is not available for wallet-managed accounts".to_string(),
            )),
        }
    }

    /// Fill gas, submit and wait for a successful receipt.
    pub(crate) async fn submit(&self, mut tx: TransactionRequest) -> WalletResult<TxReceiptSummary> {
        let handle = self.handle()?;
        let client = handle.client();
        let from = handle.primary_account()?;

        tx.set_from(from);
        tx.set_chain_id(handle.chain_id().0);

        let gas_price = self.call("eth_gasPrice", client.get_gas_price()).await?;
        tx.set_gas_price(gas_price);

        let gas_limit = self
            .call_as("eth_estimateGas", client.estimate_gas(tx.clone()), WalletError::Transaction)
            .await?;
        tx.set_gas_limit(gas_limit);

        let pending = self
            .call_as("send_transaction", client.send_transaction(tx), WalletError::Transaction)
            .await?;
        let tx_hash = *pending.tx_hash();

        tracing::info!(tx_hash = %tx_hash, from = %from, "Transaction submitted");

        let receipt = self.wait_for_receipt(&client, tx_hash).await?;
        if !receipt.status() {
            return Err(WalletError::Transaction(format!(
                "transaction {} reverted",
                tx_hash
            )));
        }

        tracing::info!(
            tx_hash = %tx_hash,
            block_number = ?receipt.block_number,
            "Transaction confirmed"
        );
        Ok(TxReceiptSummary::from(&receipt))
    }

    async fn wait_for_receipt(
        &self,
        client: &DynProvider,
        tx_hash: TxHash,
    ) -> WalletResult<TransactionReceipt> {
        match timeout(self.config.receipt_timeout(), self.poll_receipt(client, tx_hash)).await {
            Ok(result) => result,
            Err(_) => Err(WalletError::Transaction(format!(
                "transaction {} not mined within {} seconds",
                tx_hash, self.config.receipt_timeout_secs
            ))),
        }
    }

    async fn poll_receipt(
        &self,
        client: &DynProvider,
        tx_hash: TxHash,
    ) -> WalletResult<TransactionReceipt> {
        let mut ticker = interval(self.config.poll_interval());
        loop {
            ticker.tick().await;

            let receipt = self
                .call_as(
                    "eth_getTransactionReceipt",
                    client.get_transaction_receipt(tx_hash),
                    WalletError::Transaction,
                )
                .await?;
            match receipt {
                Some(receipt) => return Ok(receipt),
                None => tracing::debug!(tx_hash = %tx_hash, "Transaction pending"),
            }
        }
    }
}

/// Parse a hex address supplied by a user.
pub fn parse_address(value: &str) -> WalletResult<Address> {
    value
        .trim()
        .parse()
        .map_err(|e| WalletError::InvalidInput(format!("invalid address '{}': {}", value, e)))
}
