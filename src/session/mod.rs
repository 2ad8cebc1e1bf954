//! Authenticated session state.
//!
//! # Data Flow
//! ```text
//! initialize() → adapters init → Ready ─┬─ store.rs restore (cached login)
//!                                       └─ connect(adapter, LoginOptions)
//!                                            → plugins → Connected (ProviderHandle + UserInfo)
//!                                            → store.rs save
//! disconnect() → adapter/plugin teardown → store.rs clear → Ready
//! ```

pub mod manager;
pub mod state;
pub mod store;

pub use manager::AuthSessionManager;
pub use state::{Session, SessionSnapshot, SessionStatus, UserInfo};
pub use store::{CachedSession, SessionStore};
