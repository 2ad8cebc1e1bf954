//! Provider handles produced by adapters.
//!
//! A `ProviderHandle` is owned by the session once connected and released on
//! logout or error. RPC operations clone a transient client out of it.

pub mod handle;

pub use handle::{AccountSigner, ProviderHandle};
