//! HTTP console subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum router, TraceLayer, graceful shutdown)
//!     → handlers.rs (one handler per console action)
//!     → AuthSessionManager / ChainRpcFacade
//!     → response.rs (WalletError → status code + {"error": ...})
//! ```

pub mod handlers;
pub mod response;
pub mod server;

pub use response::{status_for, ApiError, ApiResult};
pub use server::{ConsoleState, HttpServer};
