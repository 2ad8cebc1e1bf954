//! Chain RPC operations over the session's provider.
//!
//! # Data Flow
//! ```text
//! AuthSessionManager::rpc() → facade.rs (NotConnected guard, timeout, metrics)
//!     → alloy DynProvider (eth_* JSON-RPC)
//!     → types.rs (Balance, TxReceiptSummary)
//! contract.rs extends the facade with ABI encode/decode for deploy/read/write.
//! ```

pub mod contract;
pub mod facade;
pub mod types;

pub use contract::{demo_update_message, greeter_abi, parse_abi, GREETER_ABI};
pub use facade::{parse_address, ChainRpcFacade};
pub use types::{Balance, DeployedContract, IdentityProof, TxReceiptSummary};
