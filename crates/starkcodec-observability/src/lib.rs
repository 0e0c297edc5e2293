//! # starkcodec-observability
//!
//! Structured logging for StarkCodec binaries.
//!
//! Library crates only emit `tracing` events; this crate installs the
//! subscriber. Levels are configurable globally and per component, and
//! output is human-readable text or JSON lines for log shippers.

pub mod tracing_setup;

pub use tracing_setup::{init_tracing, InitError, LogConfig};
