//! Wallet session library.
//!
//! Models a login-gated wallet session: pluggable adapters establish a
//! provider for one EVM chain, and a thin RPC facade exposes balance,
//! signing, transfer and contract calls over it.

pub mod adapters;
pub mod chain;
pub mod config;
pub mod console;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod provider;
pub mod rpc;
pub mod session;

pub use config::schema::AppConfig;
pub use error::{WalletError, WalletResult};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use session::AuthSessionManager;
