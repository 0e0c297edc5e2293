//! # starkcodec-trace
//!
//! Execution traces for the Starknet JSON-RPC trace API.
//!
//! - [`FunctionInvocation`] trees of any depth, decoded without recursion
//! - ordered events and L1 messages, preserved as reported
//! - [`TxnTrace`] envelopes keyed by transaction `type`
//! - simulation requests and results, with fee estimates

pub mod invocation;
pub mod side_effect;
pub mod simulate;
pub mod trace;

pub use invocation::{decode_invocation, CallType, ComputationResources, EntryPointType, FunctionInvocation};
pub use side_effect::{collect_ordered_events, collect_ordered_messages, OrderedEvent, OrderedMessage};
pub use simulate::{
    FeeEstimate, PriceUnit, SimulateTransactionInput, SimulateTransactionOutput,
    SimulatedTransaction, SimulationFlag,
};
pub use trace::{
    ContractStorageDiff, DataAvailabilityResources, DeclareTxnTrace, DeclaredClass,
    DeployAccountTxnTrace, DeployedContract, ExecuteInvocation, ExecutionResources,
    InvokeTxnTrace, L1HandlerTxnTrace, NonceUpdate, ReplacedClass, StateDiff, StorageEntry,
    TransactionTrace, TxnTrace, TRACES,
};
