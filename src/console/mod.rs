//! Output surface for operation results.
//!
//! # Data Flow
//! ```text
//! CLI subcommand / HTTP handler result
//!     → sink.rs ConsoleSink::log / log_result (pretty JSON)
//!     → StdoutConsole (terminal) | BufferConsole (GET /console, tests)
//! ```

pub mod sink;

pub use sink::{BufferConsole, ConsoleSink, StdoutConsole};
