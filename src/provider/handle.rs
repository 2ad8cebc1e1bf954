//! Capability handle granting RPC access to the connected chain.

use alloy::primitives::Address;
use alloy::providers::DynProvider;
use alloy::signers::local::PrivateKeySigner;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::chain::ChainId;
use crate::error::{WalletError, WalletResult};

/// Who signs for the connected account.
#[derive(Clone)]
pub enum AccountSigner {
    /// Key held in this process.
    Local(PrivateKeySigner),
    /// Accounts managed by the node (`eth_accounts`, `personal_sign`).
    Node(Vec<Address>),
}

impl AccountSigner {
    pub fn accounts(&self) -> Vec<Address> {
        match self {
            AccountSigner::Local(signer) => vec![signer.address()],
            AccountSigner::Node(accounts) => accounts.clone(),
        }
    }
}

impl fmt::Debug for AccountSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountSigner::Local(signer) => f
                .debug_tuple("Local")
                .field(&signer.address())
                .finish(),
            AccountSigner::Node(accounts) => f.debug_tuple("Node").field(accounts).finish(),
        }
    }
}

struct HandleInner {
    adapter: String,
    chain_id: ChainId,
    rpc_url: url::Url,
    provider: DynProvider,
    signer: AccountSigner,
    revoked: AtomicBool,
}

/// Opaque, cheap-to-clone provider handle owned by the session once connected.
#[derive(Clone)]
pub struct ProviderHandle {
    inner: Arc<HandleInner>,
}

impl ProviderHandle {
    pub fn new(
        adapter: impl Into<String>,
        chain_id: ChainId,
        rpc_url: url::Url,
        provider: DynProvider,
        signer: AccountSigner,
    ) -> Self {
        Self {
            inner: Arc::new(HandleInner {
                adapter: adapter.into(),
                chain_id,
                rpc_url,
                provider,
                signer,
                revoked: AtomicBool::new(false),
            }),
        }
    }

    /// Name of the adapter that produced this handle.
    pub fn adapter(&self) -> &str {
        &self.inner.adapter
    }

    /// Chain the handle was configured for.
    pub fn chain_id(&self) -> ChainId {
        self.inner.chain_id
    }

    pub fn rpc_url(&self) -> &url::Url {
        &self.inner.rpc_url
    }

    /// A client for a single RPC call.
    pub fn client(&self) -> DynProvider {
        self.inner.provider.clone()
    }

    pub fn signer(&self) -> &AccountSigner {
        &self.inner.signer
    }

    pub fn accounts(&self) -> Vec<Address> {
        self.inner.signer.accounts()
    }

    /// First account, used as `from` for signing and sending.
    pub fn primary_account(&self) -> WalletResult<Address> {
        self.accounts()
            .into_iter()
            .next()
            .ok_or_else(|| WalletError::Sdk("provider exposes no accounts".to_string()))
    }

    /// Invalidate this handle and every clone of it.
    pub fn revoke(&self) {
        self.inner.revoked.store(true, Ordering::SeqCst);
    }

    /// Set once the session that owned the handle logged out or was replaced.
    pub fn is_revoked(&self) -> bool {
        self.inner.revoked.load(Ordering::SeqCst)
    }

    /// Two handles are equivalent when they share adapter, chain and accounts.
    pub fn is_equivalent(&self, other: &ProviderHandle) -> bool {
        self.adapter() == other.adapter()
            && self.chain_id() == other.chain_id()
            && self.accounts() == other.accounts()
    }
}

impl fmt::Debug for ProviderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderHandle")
            .field("adapter", &self.inner.adapter)
            .field("chain_id", &self.inner.chain_id)
            .field("rpc_url", &self.inner.rpc_url.as_str())
            .field("signer", &self.inner.signer)
            .field("revoked", &self.is_revoked())
            .finish()
    }
}
