//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! session manager, RPC facade, HTTP console
//!     → logging.rs (tracing events to stderr)
//!     → metrics.rs (connect / RPC counters, connected gauge)
//!
//! Consumers:
//!     → terminal or log collector (stderr)
//!     → GET /metrics (Prometheus scrape, console mode only)
//! ```

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
