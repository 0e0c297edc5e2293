//! Simulation requests and results, and fee estimates.

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use serde_json::Value;
use tracing::debug;

use starkcodec_batch::{decode_aggregate, encode_aggregate};
use starkcodec_core::{decode_with_path, embed, BlockId, CodecError, Envelope, EnvelopeFamily, Felt};
use starkcodec_txn::BroadcastTxn;

use crate::trace::TxnTrace;

/// Switches that relax how the node replays a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SimulationFlag {
    SkipValidate,
    SkipFeeCharge,
    SkipExecute,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PriceUnit {
    #[serde(rename = "WEI")]
    Wei,
    #[serde(rename = "FRI")]
    Fri,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeEstimate {
    pub gas_consumed: Felt,
    pub gas_price: Felt,
    #[serde(default)]
    pub data_gas_consumed: Felt,
    #[serde(default)]
    pub data_gas_price: Felt,
    pub overall_fee: Felt,
    pub unit: PriceUnit,
}

/// A sequence of transactions to simulate, each applied on the state left
/// by the previous ones.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulateTransactionInput {
    pub transactions: Vec<BroadcastTxn>,
    pub block_id: BlockId,
    pub simulation_flags: Vec<SimulationFlag>,
}

#[derive(Deserialize)]
struct InputFields<'a> {
    #[serde(borrow)]
    transactions: &'a RawValue,
    block_id: BlockId,
    #[serde(default)]
    simulation_flags: Vec<SimulationFlag>,
}

impl SimulateTransactionInput {
    pub fn new(transactions: Vec<BroadcastTxn>, block_id: BlockId) -> Self {
        Self {
            transactions,
            block_id,
            simulation_flags: Vec::new(),
        }
    }

    pub fn flag(mut self, flag: SimulationFlag) -> Self {
        if !self.simulation_flags.contains(&flag) {
            self.simulation_flags.push(flag);
        }
        self
    }

    /// Decode a request body. Every transaction goes through the broadcast
    /// resolver; a bad element is reported by its index.
    pub fn decode(raw: &str) -> Result<Self, CodecError> {
        let fields: InputFields<'_> = decode_with_path(raw)?;
        let transactions = decode_aggregate::<BroadcastTxn>(fields.transactions.get())?;
        debug!(transactions = transactions.len(), "decoded simulation input");
        Ok(Self {
            transactions,
            block_id: fields.block_id,
            simulation_flags: fields.simulation_flags,
        })
    }

    pub fn to_value(&self) -> Result<Value, CodecError> {
        let mut object = serde_json::Map::new();
        object.insert("transactions".into(), encode_aggregate(&self.transactions)?);
        object.insert("block_id".into(), serde_json::to_value(self.block_id)?);
        object.insert(
            "simulation_flags".into(),
            serde_json::to_value(&self.simulation_flags)?,
        );
        Ok(Value::Object(object))
    }
}

impl Serialize for SimulateTransactionInput {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::Error;

        self.to_value().map_err(S::Error::custom)?.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SimulateTransactionInput {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::Error;

        let raw = Box::<RawValue>::deserialize(deserializer)?;
        Self::decode(raw.get()).map_err(D::Error::custom)
    }
}

/// The trace and fee of one simulated transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatedTransaction {
    pub transaction_trace: TxnTrace,
    pub fee_estimation: FeeEstimate,
}

#[derive(Deserialize)]
struct SimulatedFields<'a> {
    #[serde(borrow)]
    transaction_trace: &'a RawValue,
    fee_estimation: FeeEstimate,
}

#[derive(Serialize)]
struct EncodedSimulation<'a> {
    transaction_trace: &'a RawValue,
    fee_estimation: &'a FeeEstimate,
}

impl Envelope for SimulatedTransaction {
    const FAMILY: EnvelopeFamily = EnvelopeFamily::TransactionTrace;

    fn decode(raw: &str) -> Result<Self, CodecError> {
        let fields: SimulatedFields<'_> = decode_with_path(raw)?;
        Ok(Self {
            transaction_trace: TxnTrace::decode(fields.transaction_trace.get())?,
            fee_estimation: fields.fee_estimation,
        })
    }

    fn to_value(&self) -> Result<Value, CodecError> {
        let mut object = serde_json::Map::new();
        object.insert("transaction_trace".into(), self.transaction_trace.to_value()?);
        object.insert(
            "fee_estimation".into(),
            serde_json::to_value(&self.fee_estimation)?,
        );
        Ok(Value::Object(object))
    }

    fn encode(&self) -> Result<Vec<u8>, CodecError> {
        let transaction_trace = embed(self.transaction_trace.encode()?)?;
        let encoded = EncodedSimulation {
            transaction_trace: &transaction_trace,
            fee_estimation: &self.fee_estimation,
        };
        Ok(serde_json::to_vec(&encoded)?)
    }
}

starkcodec_core::envelope_serde!(SimulatedTransaction);

/// Simulation results, one per input transaction and in the same order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SimulateTransactionOutput(pub Vec<SimulatedTransaction>);

impl SimulateTransactionOutput {
    pub fn decode(raw: &str) -> Result<Self, CodecError> {
        decode_aggregate(raw).map(Self)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SimulatedTransaction> {
        self.0.iter()
    }

    /// Check that result `i` is a trace of the same kind as input `i`, for
    /// every `i`, and that nothing is missing or extra.
    pub fn check_alignment(&self, input: &SimulateTransactionInput) -> Result<(), CodecError> {
        if self.0.len() != input.transactions.len() {
            return Err(CodecError::TypeMismatch {
                expected: format!("{} simulated transactions", input.transactions.len()),
                got: self.0.len().to_string(),
            });
        }

        for (index, (simulated, submitted)) in self.0.iter().zip(&input.transactions).enumerate() {
            let traced = simulated.transaction_trace.kind();
            if traced != submitted.kind() {
                let mismatch = CodecError::TypeMismatch {
                    expected: submitted.kind().to_string(),
                    got: traced.to_string(),
                };
                return Err(mismatch.at_index(index));
            }
        }
        Ok(())
    }
}

impl IntoIterator for SimulateTransactionOutput {
    type Item = SimulatedTransaction;
    type IntoIter = std::vec::IntoIter<SimulatedTransaction>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
