//! Login-provider adapter backed by a locally held key.
//!
//! Plays the role of a social-login adapter paired with a private-key
//! provider: the login method decides the identity claims, the key signs.
//!
//! # Security
//! - Keys come from an environment variable or are injected programmatically
//! - Keys and id tokens are never logged or written to the session cache

use alloy::network::EthereumWallet;
use alloy::providers::{Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::adapters::types::{Connected, LoginOptions, WalletAdapter};
use crate::chain::ChainConfig;
use crate::config::schema::RpcConfig;
use crate::error::{WalletError, WalletResult};
use crate::provider::{AccountSigner, ProviderHandle};
use crate::session::UserInfo;

/// Default environment variable holding the key.
pub const PRIVATE_KEY_ENV_VAR: &str = "WALLET_SESSION_PRIVATE_KEY";

/// How the login UI is presented. Informational for non-browser hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UxMode {
    #[default]
    Redirect,
    Popup,
}

impl UxMode {
    fn as_str(&self) -> &'static str {
        match self {
            UxMode::Redirect => "redirect",
            UxMode::Popup => "popup",
        }
    }
}

/// Settings accepted in `[adapters.settings]`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LocalKeySettings {
    /// Environment variable holding the hex private key.
    pub private_key_env: String,

    /// Login providers this adapter accepts.
    pub login_providers: Vec<String>,

    pub ux_mode: UxMode,

    /// Verifier name reported in user info.
    pub verifier: String,
}

impl Default for LocalKeySettings {
    fn default() -> Self {
        Self {
            private_key_env: PRIVATE_KEY_ENV_VAR.to_string(),
            login_providers: ["line", "google", "jwt", "email_passwordless"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            ux_mode: UxMode::Redirect,
            verifier: "wallet-session".to_string(),
        }
    }
}

enum KeySource {
    Env(String),
    Signer(PrivateKeySigner),
}

/// Adapter that signs with a local secp256k1 key.
pub struct LocalKeyAdapter {
    name: String,
    settings: LocalKeySettings,
    key: KeySource,
}

impl LocalKeyAdapter {
    /// Build from a registry settings bag. The key is read from the
    /// configured environment variable at connect time.
    pub fn from_settings(name: impl Into<String>, settings: &toml::Table) -> WalletResult<Self> {
        let name = name.into();
        let settings: LocalKeySettings = toml::Value::Table(settings.clone())
            .try_into()
            .map_err(|e| {
                WalletError::Initialization(format!("invalid settings for adapter '{}': {}", name, e))
            })?;
        let key = KeySource::Env(settings.private_key_env.clone());
        Ok(Self {
            name,
            settings,
            key,
        })
    }

    /// Build around an already loaded signer.
    pub fn with_signer(name: impl Into<String>, signer: PrivateKeySigner) -> Self {
        Self {
            name: name.into(),
            settings: LocalKeySettings::default(),
            key: KeySource::Signer(signer),
        }
    }

    /// Parse a hex key (with or without 0x prefix) into a signer.
    pub fn parse_key(private_key_hex: &str) -> WalletResult<PrivateKeySigner> {
        let key_hex = private_key_hex
            .trim()
            .strip_prefix("0x")
            .unwrap_or(private_key_hex.trim());
        key_hex
            .parse()
            .map_err(|e| WalletError::Connection(format!("Invalid private key format: {}", e)))
    }

    pub fn settings(&self) -> &LocalKeySettings {
        &self.settings
    }

    fn load_signer(&self) -> WalletResult<PrivateKeySigner> {
        match &self.key {
            KeySource::Signer(signer) => Ok(signer.clone()),
            KeySource::Env(var) => {
                let value = std::env::var(var).map_err(|_| {
                    WalletError::Connection(format!("Environment variable {} not set", var))
                })?;
                Self::parse_key(&value)
            }
        }
    }
}

/// Decode the claims of a compact JWT without verifying its signature.
///
/// Signature verification belongs to the identity backend; here the token
/// only supplies the verifier id and profile claims.
pub fn decode_jwt_claims(token: &str) -> WalletResult<Map<String, Value>> {
    let mut parts = token.split('.');
    let payload = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(payload), Some(_), None) => payload,
        _ => {
            return Err(WalletError::Connection(
                "id token is not a compact JWT".to_string(),
            ))
        }
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| WalletError::Connection(format!("id token payload is not base64url: {}", e)))?;
    let claims: Map<String, Value> = serde_json::from_slice(&bytes)
        .map_err(|e| WalletError::Connection(format!("id token payload is not JSON: {}", e)))?;

    if let Some(exp) = claims.get("exp").and_then(Value::as_u64) {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        if exp <= now {
            return Err(WalletError::Connection("id token has expired".to_string()));
        }
    }

    Ok(claims)
}

#[async_trait]
impl WalletAdapter for LocalKeyAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn init(&self, chain: &ChainConfig) -> WalletResult<()> {
        if let KeySource::Env(var) = &self.key {
            if std::env::var_os(var).is_none() {
                tracing::warn!(
                    adapter = %self.name,
                    env_var = %var,
                    "Private key variable not set; logins through this adapter will fail"
                );
            }
        }
        tracing::debug!(adapter = %self.name, chain_id = %chain.chain_id, "Local key adapter ready");
        Ok(())
    }

    async fn connect(
        &self,
        chain: &ChainConfig,
        options: &LoginOptions,
        _rpc: &RpcConfig,
    ) -> WalletResult<Connected> {
        chain.require_eip155()?;

        let login = options.login_provider.as_str();
        if !self.settings.login_providers.iter().any(|p| p == login) {
            return Err(WalletError::Connection(format!(
                "login provider '{}' is not enabled for adapter '{}'",
                login, self.name
            )));
        }

        let claims = match (&options.id_token, login) {
            (Some(token), _) => decode_jwt_claims(token)?,
            (None, "jwt") if !options.resumed => {
                return Err(WalletError::Connection(
                    "jwt login requires an id token".to_string(),
                ))
            }
            (None, _) => Map::new(),
        };

        let signer = self.load_signer()?;
        let address = signer.address();

        let field = options.verifier_id_field.as_deref().unwrap_or("sub");
        let verifier_id = match claims.get(field).and_then(Value::as_str) {
            Some(id) => id.to_string(),
            None if options.id_token.is_some() => {
                return Err(WalletError::Connection(format!(
                    "id token has no '{}' claim",
                    field
                )))
            }
            None => address.to_string().to_lowercase(),
        };

        let chain_id = chain.chain_id_u64()?;
        let rpc_url = chain.rpc_url()?;
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer.clone()))
            .connect_http(rpc_url.clone())
            .erased();

        let mut user_info = UserInfo::new()
            .with("typeOfLogin", login)
            .with("verifier", self.settings.verifier.as_str())
            .with("verifierId", verifier_id)
            .with("aggregateVerifier", self.settings.verifier.as_str())
            .with("uxMode", self.settings.ux_mode.as_str());
        for (key, value) in &options.extra {
            user_info = user_info.with(key, value.clone());
        }
        for (claim, key) in [("name", "name"), ("email", "email"), ("picture", "profileImage")] {
            if let Some(value) = claims.get(claim) {
                user_info = user_info.with(key, value.clone());
            }
        }

        tracing::info!(
            adapter = %self.name,
            login_provider = %login,
            address = %address,
            resumed = options.resumed,
            "Local key session established"
        );

        Ok(Connected {
            provider: ProviderHandle::new(
                self.name.clone(),
                chain_id,
                rpc_url,
                provider,
                AccountSigner::Local(signer),
            ),
            user_info,
        })
    }
}
