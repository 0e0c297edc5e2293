//! Transaction execution traces, keyed by transaction `type` alone.

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use serde_json::Value;

use starkcodec_core::{
    decode_with_path, embed, encode_variant_text, strategy, CodecError, Envelope, EnvelopeFamily,
    Felt, Keyed, TransactionType, Variant, VariantRegistry,
};

use crate::invocation::{decode_invocation, ComputationResources, FunctionInvocation};

/// Outcome of the `__execute__` call of an invoke transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecuteInvocation {
    Success(FunctionInvocation),
    Reverted { revert_reason: String },
}

#[derive(Deserialize)]
struct RevertMarker {
    #[serde(default)]
    revert_reason: Option<String>,
}

impl ExecuteInvocation {
    pub fn decode(raw: &str) -> Result<Self, CodecError> {
        // `revert_reason` is the only member of the reverted shape.
        let marker: RevertMarker = decode_with_path(raw)?;
        match marker.revert_reason {
            Some(revert_reason) => Ok(ExecuteInvocation::Reverted { revert_reason }),
            None => decode_invocation(raw).map(ExecuteInvocation::Success),
        }
    }

    pub fn invocation(&self) -> Option<&FunctionInvocation> {
        match self {
            ExecuteInvocation::Success(invocation) => Some(invocation),
            ExecuteInvocation::Reverted { .. } => None,
        }
    }

    pub fn is_reverted(&self) -> bool {
        matches!(self, ExecuteInvocation::Reverted { .. })
    }
}

impl Serialize for ExecuteInvocation {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        match self {
            ExecuteInvocation::Success(invocation) => invocation.serialize(serializer),
            ExecuteInvocation::Reverted { revert_reason } => {
                let mut state = serializer.serialize_struct("RevertedInvocation", 1)?;
                state.serialize_field("revert_reason", revert_reason)?;
                state.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for ExecuteInvocation {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::Error;

        let raw = Box::<RawValue>::deserialize(deserializer)?;
        ExecuteInvocation::decode(raw.get()).map_err(D::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageEntry {
    pub key: Felt,
    pub value: Felt,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractStorageDiff {
    pub address: Felt,
    pub storage_entries: Vec<StorageEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclaredClass {
    pub class_hash: Felt,
    pub compiled_class_hash: Felt,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployedContract {
    pub address: Felt,
    pub class_hash: Felt,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplacedClass {
    pub contract_address: Felt,
    pub class_hash: Felt,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonceUpdate {
    pub contract_address: Felt,
    pub nonce: Felt,
}

/// State changes made by a transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateDiff {
    #[serde(default)]
    pub storage_diffs: Vec<ContractStorageDiff>,
    #[serde(default)]
    pub deprecated_declared_classes: Vec<Felt>,
    #[serde(default)]
    pub declared_classes: Vec<DeclaredClass>,
    #[serde(default)]
    pub deployed_contracts: Vec<DeployedContract>,
    #[serde(default)]
    pub replaced_classes: Vec<ReplacedClass>,
    #[serde(default)]
    pub nonces: Vec<NonceUpdate>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataAvailabilityResources {
    pub l1_gas: u64,
    pub l1_data_gas: u64,
}

/// Resources consumed by a whole transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResources {
    #[serde(flatten)]
    pub computation: ComputationResources,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_availability: Option<DataAvailabilityResources>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvokeTxnTrace {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validate_invocation: Option<FunctionInvocation>,
    pub execute_invocation: ExecuteInvocation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_transfer_invocation: Option<FunctionInvocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_diff: Option<StateDiff>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_resources: Option<ExecutionResources>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclareTxnTrace {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validate_invocation: Option<FunctionInvocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_transfer_invocation: Option<FunctionInvocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_diff: Option<StateDiff>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_resources: Option<ExecutionResources>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployAccountTxnTrace {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validate_invocation: Option<FunctionInvocation>,
    pub constructor_invocation: FunctionInvocation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_transfer_invocation: Option<FunctionInvocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_diff: Option<StateDiff>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_resources: Option<ExecutionResources>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct L1HandlerTxnTrace {
    pub function_invocation: FunctionInvocation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_diff: Option<StateDiff>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_resources: Option<ExecutionResources>,
}

macro_rules! trace_variant {
    ($payload:ty => $kind:ident) => {
        impl Variant for $payload {
            type Key = TransactionType;
            const KEY: TransactionType = TransactionType::$kind;
        }
    };
}

trace_variant!(InvokeTxnTrace => Invoke);
trace_variant!(DeclareTxnTrace => Declare);
trace_variant!(DeployAccountTxnTrace => DeployAccount);
trace_variant!(L1HandlerTxnTrace => L1Handler);

/// The execution trace of one transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxnTrace {
    Invoke(InvokeTxnTrace),
    Declare(DeclareTxnTrace),
    DeployAccount(DeployAccountTxnTrace),
    L1Handler(L1HandlerTxnTrace),
}

const FAMILY: EnvelopeFamily = EnvelopeFamily::TransactionTrace;

pub static TRACES: VariantRegistry<TransactionType, TxnTrace> = VariantRegistry::new(
    FAMILY,
    &[
        strategy!(TxnTrace::Invoke(InvokeTxnTrace), FAMILY),
        strategy!(TxnTrace::Declare(DeclareTxnTrace), FAMILY),
        strategy!(TxnTrace::DeployAccount(DeployAccountTxnTrace), FAMILY),
        strategy!(TxnTrace::L1Handler(L1HandlerTxnTrace), FAMILY),
    ],
);

impl Keyed for TxnTrace {
    type Key = TransactionType;

    fn key(&self) -> TransactionType {
        match self {
            TxnTrace::Invoke(_) => InvokeTxnTrace::KEY,
            TxnTrace::Declare(_) => DeclareTxnTrace::KEY,
            TxnTrace::DeployAccount(_) => DeployAccountTxnTrace::KEY,
            TxnTrace::L1Handler(_) => L1HandlerTxnTrace::KEY,
        }
    }
}

impl TxnTrace {
    pub fn kind(&self) -> TransactionType {
        self.key()
    }

    /// The top-level invocations of the trace, in execution order.
    pub fn root_invocations(&self) -> Vec<&FunctionInvocation> {
        match self {
            TxnTrace::Invoke(trace) => trace
                .validate_invocation
                .iter()
                .chain(trace.execute_invocation.invocation())
                .chain(trace.fee_transfer_invocation.iter())
                .collect(),
            TxnTrace::Declare(trace) => trace
                .validate_invocation
                .iter()
                .chain(trace.fee_transfer_invocation.iter())
                .collect(),
            TxnTrace::DeployAccount(trace) => trace
                .validate_invocation
                .iter()
                .chain(Some(&trace.constructor_invocation))
                .chain(trace.fee_transfer_invocation.iter())
                .collect(),
            TxnTrace::L1Handler(trace) => vec![&trace.function_invocation],
        }
    }

    pub fn state_diff(&self) -> Option<&StateDiff> {
        match self {
            TxnTrace::Invoke(trace) => trace.state_diff.as_ref(),
            TxnTrace::Declare(trace) => trace.state_diff.as_ref(),
            TxnTrace::DeployAccount(trace) => trace.state_diff.as_ref(),
            TxnTrace::L1Handler(trace) => trace.state_diff.as_ref(),
        }
    }
}

impl Envelope for TxnTrace {
    const FAMILY: EnvelopeFamily = FAMILY;

    fn decode(raw: &str) -> Result<Self, CodecError> {
        TRACES.decode(raw)
    }

    /// Bounded by serde_json's nesting limit; deeper trees fail here but
    /// still [`encode`](Envelope::encode).
    fn to_value(&self) -> Result<Value, CodecError> {
        TRACES.encode_value(self.key(), self)
    }

    fn encode(&self) -> Result<Vec<u8>, CodecError> {
        let text = match self {
            TxnTrace::Invoke(trace) => encode_variant_text(trace),
            TxnTrace::Declare(trace) => encode_variant_text(trace),
            TxnTrace::DeployAccount(trace) => encode_variant_text(trace),
            TxnTrace::L1Handler(trace) => encode_variant_text(trace),
        }?;
        Ok(text.into_bytes())
    }
}

starkcodec_core::envelope_serde!(TxnTrace);

/// One entry of a block's traces: a transaction hash and its trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionTrace {
    pub transaction_hash: Felt,
    pub trace_root: TxnTrace,
}

#[derive(Deserialize, Serialize)]
struct TraceEntry<'a> {
    transaction_hash: Felt,
    #[serde(borrow)]
    trace_root: &'a RawValue,
}

impl Envelope for TransactionTrace {
    const FAMILY: EnvelopeFamily = FAMILY;

    fn decode(raw: &str) -> Result<Self, CodecError> {
        let entry: TraceEntry<'_> = decode_with_path(raw)?;
        Ok(Self {
            transaction_hash: entry.transaction_hash,
            trace_root: TxnTrace::decode(entry.trace_root.get())?,
        })
    }

    fn to_value(&self) -> Result<Value, CodecError> {
        let mut object = serde_json::Map::new();
        object.insert(
            "transaction_hash".into(),
            Value::String(self.transaction_hash.to_string()),
        );
        object.insert("trace_root".into(), self.trace_root.to_value()?);
        Ok(Value::Object(object))
    }

    fn encode(&self) -> Result<Vec<u8>, CodecError> {
        let trace_root = embed(self.trace_root.encode()?)?;
        let entry = TraceEntry {
            transaction_hash: self.transaction_hash,
            trace_root: &trace_root,
        };
        Ok(serde_json::to_vec(&entry)?)
    }
}

starkcodec_core::envelope_serde!(TransactionTrace);
