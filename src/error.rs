//! Crate-wide error taxonomy.

use thiserror::Error;

/// Errors surfaced by session, adapter and RPC operations.
#[derive(Debug, Error)]
pub enum WalletError {
    /// Adapters could not be constructed or initialized, or an operation ran
    /// before `initialize()`.
    #[error("initialization error: {0}")]
    Initialization(String),

    /// The chosen adapter rejected the login (cancelled, bad token, network).
    #[error("connection error: {0}")]
    Connection(String),

    /// An operation needed an active provider and there is none.
    #[error("provider not initialized yet")]
    NotConnected,

    /// Submission failed, the transaction reverted or was never mined.
    #[error("transaction error: {0}")]
    Transaction(String),

    /// Any other RPC or signer failure.
    #[error("sdk error: {0}")]
    Sdk(String),

    /// Caller supplied a malformed address, amount, ABI or argument.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Configuration could not be loaded or is semantically invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// The active adapter cannot perform this operation.
    #[error("operation not supported: {0}")]
    Unsupported(String),
}

impl WalletError {
    /// Short machine-readable tag for logs, metrics and HTTP bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            WalletError::Initialization(_) => "initialization",
            WalletError::Connection(_) => "connection",
            WalletError::NotConnected => "not_connected",
            WalletError::Transaction(_) => "transaction",
            WalletError::Sdk(_) => "sdk",
            WalletError::InvalidInput(_) => "invalid_input",
            WalletError::Config(_) => "config",
            WalletError::Unsupported(_) => "unsupported",
        }
    }
}

impl From<crate::config::loader::ConfigError> for WalletError {
    fn from(err: crate::config::loader::ConfigError) -> Self {
        WalletError::Config(err.to_string())
    }
}

/// Result type for wallet operations.
pub type WalletResult<T> = Result<T, WalletError>;
