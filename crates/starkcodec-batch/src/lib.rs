//! # starkcodec-batch
//!
//! Aggregate decoding: JSON arrays whose elements are envelopes of a single
//! family (transactions, broadcast transactions, classes, traces).
//!
//! ## Features
//! - Fail-fast decoding that names the offending element's index
//! - CPU-parallel decoding via Rayon above a configurable threshold
//! - A lenient collect mode that attempts every element
//!
//! ## Usage
//! ```
//! use starkcodec_batch::decode_aggregate;
//! use starkcodec_txn::BroadcastTxn;
//!
//! let txs: Vec<BroadcastTxn> = decode_aggregate("[]").unwrap();
//! assert!(txs.is_empty());
//! ```

pub mod aggregate;
pub mod engine;

pub use aggregate::{decode_aggregate, decode_elements, encode_aggregate, split_elements};
pub use engine::{AggregateDecoder, AggregateReport};
