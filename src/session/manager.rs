//! Session lifecycle orchestration.
//!
//! Owns the single [`Session`] and drives it through
//! `Uninitialized → Initializing → Ready ⇄ Connected`. All transitions happen
//! under one async mutex so concurrent logins cannot interleave.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::adapters::{AdapterRegistry, AdapterRegistryBuilder, Connected, LoginOptions, WalletAdapter};
use crate::chain::ChainConfig;
use crate::config::schema::{AppConfig, RpcConfig, SessionConfig};
use crate::error::{WalletError, WalletResult};
use crate::observability::metrics;
use crate::provider::ProviderHandle;
use crate::rpc::{ChainRpcFacade, IdentityProof};
use crate::session::state::{Session, SessionSnapshot, SessionStatus, UserInfo};
use crate::session::store::{CachedSession, SessionStore};

/// Coordinates adapters, the session cache and the active provider.
pub struct AuthSessionManager {
    chain: ChainConfig,
    rpc: RpcConfig,
    session_config: SessionConfig,
    registry: AdapterRegistry,
    store: SessionStore,
    session: Mutex<Session>,
}

impl AuthSessionManager {
    pub fn new(config: &AppConfig, registry: AdapterRegistry, store: SessionStore) -> Self {
        Self {
            chain: config.chain.clone(),
            rpc: config.rpc.clone(),
            session_config: config.session.clone(),
            registry,
            store,
            session: Mutex::new(Session::new()),
        }
    }

    /// Build the registry and cache store described by `config`.
    pub fn from_config(config: &AppConfig) -> WalletResult<Self> {
        let registry = AdapterRegistryBuilder::from_config(config)?.build()?;
        let store = SessionStore::from_path_str(&config.session.cache_path);
        Ok(Self::new(config, registry, store))
    }

    /// Prepare every adapter and resume a cached login when one is active.
    ///
    /// Calling this again once the session is ready is a no-op.
    pub async fn initialize(&self) -> WalletResult<SessionStatus> {
        let mut session = self.session.lock().await;
        if matches!(session.status, SessionStatus::Ready | SessionStatus::Connected) {
            return Ok(session.status);
        }

        session.status = SessionStatus::Initializing;
        tracing::debug!(session_id = %session.id, "Initializing adapters");

        for adapter in self.registry.adapters() {
            if let Err(e) = adapter.init(&self.chain).await {
                session.status = SessionStatus::Errored;
                tracing::error!(adapter = %adapter.name(), error = %e, "Adapter initialization failed");
                return Err(match e {
                    WalletError::Initialization(_) => e,
                    other => WalletError::Initialization(format!(
                        "adapter '{}' failed to initialize: {}",
                        adapter.name(),
                        other
                    )),
                });
            }
        }
        session.status = SessionStatus::Ready;

        if self.session_config.restore {
            self.restore(&mut session).await;
        }

        tracing::info!(
            session_id = %session.id,
            status = %session.status,
            adapters = self.registry.len(),
            "Session initialized"
        );
        Ok(session.status)
    }

    async fn restore(&self, session: &mut Session) {
        let cached = match self.store.load() {
            Ok(Some(cached)) => cached,
            Ok(None) => return,
            Err(e) => {
                tracing::warn!(error = %e, "Cannot read session cache");
                return;
            }
        };

        if !cached.is_active() {
            tracing::debug!(adapter = %cached.adapter, "Cached session expired");
            self.forget();
            return;
        }

        let Some(adapter) = self.registry.get(&cached.adapter) else {
            tracing::warn!(adapter = %cached.adapter, "Cached session names an unknown adapter");
            self.forget();
            return;
        };

        let options = LoginOptions {
            login_provider: cached.login_provider.clone(),
            id_token: None,
            verifier_id_field: cached.verifier_id_field.clone(),
            resumed: true,
            ..LoginOptions::default()
        };

        match self.establish(&adapter, &options, None).await {
            Ok(connected) => {
                metrics::record_connect(adapter.name(), true);
                // Claims from the first login survive a resume.
                let user_info = if cached.user_info.is_empty() {
                    connected.user_info
                } else {
                    cached.user_info
                };
                activate(session, adapter.name(), &options, connected.provider, user_info);
                tracing::info!(adapter = %adapter.name(), "Session restored from cache");
            }
            Err(e) => {
                metrics::record_connect(adapter.name(), false);
                tracing::warn!(adapter = %adapter.name(), error = %e, "Cannot resume cached session");
                self.forget();
            }
        }
    }

    fn forget(&self) {
        if let Err(e) = self.store.clear() {
            tracing::warn!(error = %e, "Cannot clear session cache");
        }
    }

    /// Connect through `adapter` and run the plugins. `active` names the
    /// adapter backing the live session, which a rejection must not tear down.
    async fn establish(
        &self,
        adapter: &Arc<dyn WalletAdapter>,
        options: &LoginOptions,
        active: Option<&str>,
    ) -> WalletResult<Connected> {
        let connected = adapter.connect(&self.chain, options, &self.rpc).await?;

        for plugin in self.registry.plugins() {
            if let Err(e) = plugin.on_connected(&connected.provider, &self.chain, &self.rpc).await {
                tracing::warn!(plugin = %plugin.name(), error = %e, "Plugin rejected connection");
                if active == Some(adapter.name()) {
                    return Err(e);
                }
                if let Err(e) = adapter.disconnect().await {
                    tracing::debug!(adapter = %adapter.name(), error = %e, "Disconnect after rejection failed");
                }
                return Err(e);
            }
        }
        Ok(connected)
    }

    /// Log in through `adapter` (the highest priority adapter when `None`).
    ///
    /// A successful connect replaces any active provider. On failure the
    /// previous session is left untouched.
    pub async fn connect(
        &self,
        adapter: Option<&str>,
        options: LoginOptions,
    ) -> WalletResult<ProviderHandle> {
        let mut session = self.session.lock().await;
        if !session.status.can_connect() {
            return Err(WalletError::Initialization(
                "web3auth not initialized yet".to_string(),
            ));
        }

        let adapter = match adapter {
            Some(name) => self
                .registry
                .get(name)
                .ok_or_else(|| WalletError::Connection(format!("unknown adapter '{}'", name)))?,
            None => self.registry.default_adapter(),
        };

        tracing::info!(
            adapter = %adapter.name(),
            login_provider = %options.login_provider,
            "Connecting"
        );

        let active = session.adapter.clone();
        let connected = match self.establish(&adapter, &options, active.as_deref()).await {
            Ok(connected) => connected,
            Err(e) => {
                metrics::record_connect(adapter.name(), false);
                tracing::warn!(adapter = %adapter.name(), error = %e, "Connect failed");
                return Err(match e {
                    WalletError::Connection(_) | WalletError::Config(_) => e,
                    other => WalletError::Connection(other.to_string()),
                });
            }
        };
        metrics::record_connect(adapter.name(), true);

        if let Some(previous) = active.as_deref() {
            if previous != adapter.name() {
                if let Some(old) = self.registry.get(previous) {
                    if let Err(e) = old.disconnect().await {
                        tracing::debug!(adapter = %previous, error = %e, "Previous adapter disconnect failed");
                    }
                }
            }
            self.plugins_disconnected().await;
        }

        let ttl = adapter
            .session_time()
            .unwrap_or_else(|| self.session_config.session_time());
        let cached = CachedSession::new(
            adapter.name(),
            options.login_provider.clone(),
            options.verifier_id_field.clone(),
            ttl,
            connected.user_info.clone(),
        );
        if let Err(e) = self.store.save(&cached) {
            tracing::warn!(error = %e, "Cannot persist session cache");
        }

        let provider = connected.provider.clone();
        activate(&mut session, adapter.name(), &options, connected.provider, connected.user_info);

        tracing::info!(
            session_id = %session.id,
            adapter = %adapter.name(),
            account = ?provider.accounts().first(),
            "Connected"
        );
        Ok(provider)
    }

    /// End the session. Does nothing when not connected.
    pub async fn disconnect(&self) -> WalletResult<()> {
        let mut session = self.session.lock().await;
        if !session.is_connected() {
            tracing::debug!("Disconnect requested without an active session");
            return Ok(());
        }

        if let Some(adapter) = session.adapter.as_deref().and_then(|n| self.registry.get(n)) {
            if let Err(e) = adapter.disconnect().await {
                tracing::warn!(adapter = %adapter.name(), error = %e, "Adapter disconnect failed");
            }
        }
        self.plugins_disconnected().await;

        self.forget();
        session.release();
        metrics::set_connected(false);

        tracing::info!(session_id = %session.id, "Logged out");
        Ok(())
    }

    async fn plugins_disconnected(&self) {
        for plugin in self.registry.plugins() {
            if let Err(e) = plugin.on_disconnected().await {
                tracing::warn!(plugin = %plugin.name(), error = %e, "Plugin disconnect hook failed");
            }
        }
    }

    /// Claims of the logged-in user.
    pub async fn user_info(&self) -> WalletResult<UserInfo> {
        let session = self.session.lock().await;
        if !session.is_connected() {
            return Err(WalletError::NotConnected);
        }
        session.user_info.clone().ok_or(WalletError::NotConnected)
    }

    /// Sign a fresh statement with the session account to prove control of it.
    pub async fn authenticate_user(&self) -> WalletResult<IdentityProof> {
        let (session_id, provider) = {
            let session = self.session.lock().await;
            if !session.is_connected() {
                return Err(WalletError::NotConnected);
            }
            (session.id, session.active_provider.clone())
        };

        let facade = ChainRpcFacade::new(provider, self.rpc.clone());
        let address = facade.primary_account()?;
        let issued_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let message = format!(
            "wallet-session authentication\naddress: {}\nsession: {}\nissued at: {}",
            address, session_id, issued_at
        );

        let signature = facade.sign_message(&message).await?;
        Ok(IdentityProof {
            address,
            message,
            signature: alloy::hex::encode_prefixed(signature.as_bytes()),
            issued_at,
        })
    }

    pub async fn status(&self) -> SessionStatus {
        self.session.lock().await.status
    }

    /// Active provider, if connected.
    pub async fn provider(&self) -> Option<ProviderHandle> {
        self.session.lock().await.active_provider.clone()
    }

    pub async fn session_id(&self) -> Uuid {
        self.session.lock().await.id
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot::from(&*self.session.lock().await)
    }

    /// RPC facade bound to the current provider (which may be absent).
    pub async fn rpc(&self) -> ChainRpcFacade {
        ChainRpcFacade::new(self.provider().await, self.rpc.clone())
    }

    pub fn registry(&self) -> &AdapterRegistry {
        &self.registry
    }

    pub fn chain(&self) -> &ChainConfig {
        &self.chain
    }
}

fn activate(
    session: &mut Session,
    adapter: &str,
    options: &LoginOptions,
    provider: ProviderHandle,
    user_info: UserInfo,
) {
    if let Some(previous) = session.active_provider.replace(provider) {
        previous.revoke();
    }
    session.user_info = Some(user_info);
    session.adapter = Some(adapter.to_string());
    session.login_provider = Some(options.login_provider.clone());
    session.status = SessionStatus::Connected;
    metrics::set_connected(true);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{AdapterPlugin, LocalKeyAdapter};
    use alloy::signers::local::PrivateKeySigner;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    const TEST_PRIVATE_KEY: &str =
        "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn manager() -> AuthSessionManager {
        let mut config = AppConfig::default();
        config.plugins.clear();
        config.chain = ChainConfig::local("http://127.0.0.1:9");
        let signer: PrivateKeySigner = TEST_PRIVATE_KEY.parse().unwrap();
        let registry = AdapterRegistry::builder()
            .with_instance(Arc::new(LocalKeyAdapter::with_signer("openlogin", signer)), 0)
            .build()
            .unwrap();
        AuthSessionManager::new(&config, registry, SessionStore::disabled())
    }

    /// Local-key adapter that counts its teardowns.
    struct CountingAdapter {
        inner: LocalKeyAdapter,
        disconnects: AtomicUsize,
    }

    #[async_trait]
    impl WalletAdapter for CountingAdapter {
        fn name(&self) -> &str {
            self.inner.name()
        }

        async fn init(&self, chain: &ChainConfig) -> WalletResult<()> {
            self.inner.init(chain).await
        }

        async fn connect(
            &self,
            chain: &ChainConfig,
            options: &LoginOptions,
            rpc: &RpcConfig,
        ) -> WalletResult<Connected> {
            self.inner.connect(chain, options, rpc).await
        }

        async fn disconnect(&self) -> WalletResult<()> {
            self.disconnects.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[derive(Default)]
    struct GatePlugin {
        reject: AtomicBool,
        disconnects: AtomicUsize,
    }

    #[async_trait]
    impl AdapterPlugin for GatePlugin {
        fn name(&self) -> &str {
            "gate"
        }

        async fn on_connected(
            &self,
            _provider: &ProviderHandle,
            _chain: &ChainConfig,
            _rpc: &RpcConfig,
        ) -> WalletResult<()> {
            if self.reject.load(Ordering::SeqCst) {
                return Err(WalletError::Connection("gate closed".to_string()));
            }
            Ok(())
        }

        async fn on_disconnected(&self) -> WalletResult<()> {
            self.disconnects.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn gated_manager() -> (AuthSessionManager, Arc<CountingAdapter>, Arc<GatePlugin>) {
        let mut config = AppConfig::default();
        config.plugins.clear();
        config.chain = ChainConfig::local("http://127.0.0.1:9");
        let signer: PrivateKeySigner = TEST_PRIVATE_KEY.parse().unwrap();
        let adapter = Arc::new(CountingAdapter {
            inner: LocalKeyAdapter::with_signer("openlogin", signer),
            disconnects: AtomicUsize::new(0),
        });
        let plugin = Arc::new(GatePlugin::default());
        let registry = AdapterRegistry::builder()
            .with_instance(adapter.clone(), 0)
            .with_plugin(plugin.clone())
            .build()
            .unwrap();
        let manager = AuthSessionManager::new(&config, registry, SessionStore::disabled());
        (manager, adapter, plugin)
    }

    #[tokio::test]
    async fn test_connect_before_initialize_fails() {
        let manager = manager();
        let err = manager
            .connect(None, LoginOptions::new("line"))
            .await
            .unwrap_err();
        assert!(matches!(err, WalletError::Initialization(_)));
        assert_eq!(manager.status().await, SessionStatus::Uninitialized);
    }

    #[tokio::test]
    async fn test_login_logout_cycle() {
        let manager = manager();
        assert_eq!(manager.initialize().await.unwrap(), SessionStatus::Ready);
        // idempotent
        assert_eq!(manager.initialize().await.unwrap(), SessionStatus::Ready);

        manager.connect(None, LoginOptions::new("line")).await.unwrap();
        assert_eq!(manager.status().await, SessionStatus::Connected);
        let info = manager.user_info().await.unwrap();
        assert_eq!(info.get_str("typeOfLogin"), Some("line"));

        manager.disconnect().await.unwrap();
        assert_eq!(manager.status().await, SessionStatus::Ready);
        assert!(manager.provider().await.is_none());
        assert!(matches!(manager.user_info().await, Err(WalletError::NotConnected)));
        // second logout is a no-op
        manager.disconnect().await.unwrap();
    }

    #[tokio::test]
    async fn test_unknown_adapter_is_connection_error() {
        let manager = manager();
        manager.initialize().await.unwrap();
        let err = manager
            .connect(Some("phantom"), LoginOptions::new("line"))
            .await
            .unwrap_err();
        assert!(matches!(err, WalletError::Connection(_)));
        assert_eq!(manager.status().await, SessionStatus::Ready);
    }

    #[tokio::test]
    async fn test_authenticate_user_signs_with_session_account() {
        let manager = manager();
        manager.initialize().await.unwrap();
        assert!(matches!(
            manager.authenticate_user().await,
            Err(WalletError::NotConnected)
        ));

        manager.connect(None, LoginOptions::new("google")).await.unwrap();
        let proof = manager.authenticate_user().await.unwrap();
        let raw = alloy::hex::decode(&proof.signature).unwrap();
        let signature = alloy::primitives::Signature::from_raw(&raw).unwrap();
        let recovered = ChainRpcFacade::verify_message(&proof.message, &signature).unwrap();
        assert_eq!(recovered, proof.address);
    }

    #[tokio::test]
    async fn test_facade_taken_before_logout_is_revoked() {
        let manager = manager();
        manager.initialize().await.unwrap();
        manager.connect(None, LoginOptions::new("google")).await.unwrap();

        let rpc = manager.rpc().await;
        assert!(rpc.get_private_key().is_ok());

        manager.disconnect().await.unwrap();
        assert!(!rpc.is_connected());
        assert!(matches!(rpc.get_private_key(), Err(WalletError::NotConnected)));
        assert!(matches!(rpc.get_balance().await, Err(WalletError::NotConnected)));
        assert!(matches!(rpc.sign_message("hi").await, Err(WalletError::NotConnected)));
    }

    #[tokio::test]
    async fn test_replaced_provider_is_revoked() {
        let manager = manager();
        manager.initialize().await.unwrap();
        let first = manager.connect(None, LoginOptions::new("google")).await.unwrap();
        let stale = manager.rpc().await;

        let second = manager.connect(None, LoginOptions::new("line")).await.unwrap();
        assert!(first.is_revoked());
        assert!(!second.is_revoked());
        assert!(matches!(stale.get_private_key(), Err(WalletError::NotConnected)));
        assert!(manager.rpc().await.get_private_key().is_ok());
    }

    #[tokio::test]
    async fn test_rejected_reconnect_keeps_active_adapter() {
        let (manager, adapter, plugin) = gated_manager();
        manager.initialize().await.unwrap();
        manager.connect(None, LoginOptions::new("google")).await.unwrap();

        plugin.reject.store(true, Ordering::SeqCst);
        let err = manager
            .connect(None, LoginOptions::new("line"))
            .await
            .unwrap_err();
        assert!(matches!(err, WalletError::Connection(_)));

        assert_eq!(adapter.disconnects.load(Ordering::SeqCst), 0);
        assert_eq!(manager.status().await, SessionStatus::Connected);
        assert!(manager.rpc().await.get_private_key().is_ok());
    }

    #[tokio::test]
    async fn test_rejected_first_connect_tears_adapter_down() {
        let (manager, adapter, plugin) = gated_manager();
        manager.initialize().await.unwrap();
        plugin.reject.store(true, Ordering::SeqCst);

        assert!(manager.connect(None, LoginOptions::new("google")).await.is_err());
        assert_eq!(adapter.disconnects.load(Ordering::SeqCst), 1);
        assert_eq!(manager.status().await, SessionStatus::Ready);
    }

    #[tokio::test]
    async fn test_replacing_session_runs_plugin_teardown() {
        let (manager, _, plugin) = gated_manager();
        manager.initialize().await.unwrap();

        manager.connect(None, LoginOptions::new("google")).await.unwrap();
        assert_eq!(plugin.disconnects.load(Ordering::SeqCst), 0);

        manager.connect(None, LoginOptions::new("line")).await.unwrap();
        assert_eq!(plugin.disconnects.load(Ordering::SeqCst), 1);

        manager.disconnect().await.unwrap();
        assert_eq!(plugin.disconnects.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_rpc_without_session_is_not_connected() {
        let manager = manager();
        manager.initialize().await.unwrap();
        let rpc = manager.rpc().await;
        assert!(!rpc.is_connected());
        assert!(matches!(rpc.get_balance().await, Err(WalletError::NotConnected)));
    }
}
