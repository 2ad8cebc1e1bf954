//! Wallet adapters and plugins.
//!
//! # Data Flow
//! ```text
//! AppConfig.adapters / AppConfig.plugins
//!     → registry.rs (builder, upsert by name, frozen on build)
//!     → local_key.rs | node_accounts.rs (connect → ProviderHandle + UserInfo)
//!     → plugin.rs (post-connect checks such as chain verification)
//! ```

pub mod local_key;
pub mod node_accounts;
pub mod plugin;
pub mod registry;
pub mod types;

pub use local_key::LocalKeyAdapter;
pub use node_accounts::NodeAccountsAdapter;
pub use plugin::{AdapterPlugin, ChainGuardPlugin};
pub use registry::{AdapterRegistry, AdapterRegistryBuilder};
pub use types::{AdapterDescriptor, Connected, LoginOptions, WalletAdapter};
