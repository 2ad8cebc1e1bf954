//! Lifecycle management for the console server.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGINT/SIGTERM → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     trigger → subscribers wake → axum stops accepting → in-flight requests drain
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
