//! # starkcodec-txn
//!
//! Transaction-shaped envelope families for the Starknet JSON-RPC API:
//!
//! - [`Transaction`]: transactions as stored on chain, keyed by `(type, version)`
//! - [`BroadcastTxn`]: transactions as submitted, declares embedding their class
//! - [`ClassDefinition`]: contract classes, resolved by structure
//! - [`TransactionWithHash`]: a transaction plus its sequencer-assigned hash
//!
//! # Example
//!
//! ```
//! use starkcodec_core::Envelope;
//! use starkcodec_txn::Transaction;
//!
//! let raw = r#"{"type":"INVOKE","version":"0x1","sender_address":"0x1",
//!     "calldata":["0x2","0x3"],"max_fee":"0x4","signature":["0x5"],"nonce":"0x6"}"#;
//! let tx = Transaction::decode(raw).unwrap();
//! assert_eq!(tx.sender_address().unwrap().to_string(), "0x1");
//! ```

/// Bind a payload struct to its `(type, version)` key.
macro_rules! variant {
    ($payload:ty => $kind:ident, $version:ident) => {
        impl starkcodec_core::Variant for $payload {
            type Key = starkcodec_core::Discriminator;
            const KEY: starkcodec_core::Discriminator = starkcodec_core::Discriminator::new(
                starkcodec_core::TransactionType::$kind,
                starkcodec_core::TransactionVersion::$version,
            );
        }
    };
}

pub mod broadcast;
pub mod class;
pub mod resource;
pub mod transaction;

pub use broadcast::{
    BroadcastDeclareTxnV1, BroadcastDeclareTxnV2, BroadcastDeclareTxnV3, BroadcastTxn,
    BROADCAST_TRANSACTIONS,
};
pub use class::{
    decode_class, ClassDefinition, ContractClass, DeprecatedCairoEntryPoint,
    DeprecatedContractClass, DeprecatedEntryPointsByType, EntryPointsByType, SierraEntryPoint,
};
pub use resource::{DataAvailabilityMode, ResourceBounds, ResourceBoundsMapping};
pub use transaction::{
    DeclareTxnV0, DeclareTxnV1, DeclareTxnV2, DeclareTxnV3, DeployAccountTxnV1, DeployAccountTxnV3,
    DeployTxn, InvokeTxnV0, InvokeTxnV1, InvokeTxnV3, L1HandlerTxn, Transaction,
    TransactionWithHash, TRANSACTIONS,
};
