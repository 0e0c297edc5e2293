//! Envelope family selection shared by the codec commands.

use clap::ValueEnum;
use serde_json::Value;

use starkcodec_batch::{AggregateDecoder, AggregateReport};
use starkcodec_core::{CodecError, Envelope, EnvelopeFamily};
use starkcodec_trace::{TransactionTrace, TxnTrace, TRACES};
use starkcodec_txn::{BroadcastTxn, ClassDefinition, Transaction, BROADCAST_TRANSACTIONS, TRANSACTIONS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Family {
    /// Transactions as stored on chain, keyed by (type, version)
    Transaction,
    /// Transactions as submitted to the node
    Broadcast,
    /// Contract classes, resolved by structure
    Class,
    /// Execution traces, keyed by type
    Trace,
    /// Block trace entries: a transaction hash plus its trace
    BlockTrace,
}

/// Label of block trace entries, which have no envelope family of their own.
const BLOCK_TRACE_LABEL: &str = "block trace";

impl Family {
    /// Map a fixture's `expected.family` label back to a family.
    pub fn from_label(label: &str) -> Option<Self> {
        if label == BLOCK_TRACE_LABEL {
            return Some(Family::BlockTrace);
        }
        [
            (EnvelopeFamily::Transaction, Family::Transaction),
            (EnvelopeFamily::BroadcastTransaction, Family::Broadcast),
            (EnvelopeFamily::ContractClass, Family::Class),
            (EnvelopeFamily::TransactionTrace, Family::Trace),
        ]
        .into_iter()
        .find(|(family, _)| family.to_string() == label)
        .map(|(_, family)| family)
    }
}

/// A decoded envelope of any family.
#[derive(Debug)]
pub enum Decoded {
    Transaction(Transaction),
    Broadcast(BroadcastTxn),
    Class(ClassDefinition),
    Trace(TxnTrace),
    BlockTrace(TransactionTrace),
}

impl Decoded {
    pub fn decode(family: Family, raw: &str) -> Result<Self, CodecError> {
        Ok(match family {
            Family::Transaction => Decoded::Transaction(Transaction::decode(raw)?),
            Family::Broadcast => Decoded::Broadcast(BroadcastTxn::decode(raw)?),
            Family::Class => Decoded::Class(ClassDefinition::decode(raw)?),
            Family::Trace => Decoded::Trace(TxnTrace::decode(raw)?),
            Family::BlockTrace => Decoded::BlockTrace(TransactionTrace::decode(raw)?),
        })
    }

    pub fn to_value(&self) -> Result<Value, CodecError> {
        match self {
            Decoded::Transaction(tx) => tx.to_value(),
            Decoded::Broadcast(tx) => tx.to_value(),
            Decoded::Class(class) => class.to_value(),
            Decoded::Trace(trace) => trace.to_value(),
            Decoded::BlockTrace(entry) => entry.to_value(),
        }
    }

    /// The discriminator that selected this variant, as text.
    pub fn discriminator(&self) -> String {
        match self {
            Decoded::Transaction(tx) => format!("{} {}", tx.kind(), tx.version()),
            Decoded::Broadcast(tx) => format!("{} {}", tx.kind(), tx.version()),
            Decoded::Class(ClassDefinition::Sierra(_)) => "sierra".into(),
            Decoded::Class(ClassDefinition::Deprecated(_)) => "deprecated".into(),
            Decoded::Trace(trace) => trace.kind().to_string(),
            Decoded::BlockTrace(entry) => entry.trace_root.kind().to_string(),
        }
    }

    /// One line describing the envelope.
    pub fn summary(&self) -> String {
        match self {
            Decoded::Transaction(tx) => {
                let mut line = self.discriminator();
                if let Some(sender) = tx.sender_address() {
                    line.push_str(&format!(" sender={sender}"));
                }
                if let Some(nonce) = tx.nonce() {
                    line.push_str(&format!(" nonce={nonce}"));
                }
                line
            }
            Decoded::Broadcast(tx) => match tx.sender_address() {
                Some(sender) => format!("{} sender={sender}", self.discriminator()),
                None => self.discriminator(),
            },
            Decoded::Class(ClassDefinition::Sierra(class)) => format!(
                "sierra class {} ({} program felts)",
                class.contract_class_version,
                class.sierra_program.len()
            ),
            Decoded::Class(ClassDefinition::Deprecated(class)) => format!(
                "deprecated class ({} external entry points)",
                class.entry_points_by_type.external.len()
            ),
            Decoded::Trace(trace) => trace_summary(trace),
            Decoded::BlockTrace(entry) => {
                format!("{} {}", entry.transaction_hash, trace_summary(&entry.trace_root))
            }
        }
    }
}

fn trace_summary(trace: &TxnTrace) -> String {
    let roots = trace.root_invocations();
    let calls: usize = roots.iter().map(|root| root.node_count()).sum();
    format!("{} trace, {} root invocations, {} calls", trace.kind(), roots.len(), calls)
}

/// Read only the discriminator of `raw`, without decoding the body.
pub fn resolve(family: Family, raw: &str) -> Result<String, CodecError> {
    match family {
        Family::Transaction => TRANSACTIONS.resolve(raw).map(|key| key.to_string()),
        Family::Broadcast => BROADCAST_TRANSACTIONS.resolve(raw).map(|key| key.to_string()),
        Family::Trace => TRACES.resolve(raw).map(|key| key.to_string()),
        // No discriminator member; the shape decides.
        Family::Class | Family::BlockTrace => {
            Decoded::decode(family, raw).map(|decoded| decoded.discriminator())
        }
    }
}

fn aggregate_of<E: Envelope + Send>(
    decoder: &AggregateDecoder,
    raw: &str,
    collect: bool,
    wrap: fn(E) -> Decoded,
) -> Result<AggregateReport<Decoded>, CodecError> {
    let report = if collect {
        decoder.decode_collect::<E>(raw)?
    } else {
        let decoded = decoder.decode::<E>(raw)?;
        AggregateReport {
            total_input: decoded.len(),
            decoded,
            errors: Vec::new(),
        }
    };
    Ok(AggregateReport {
        decoded: report.decoded.into_iter().map(wrap).collect(),
        errors: report.errors,
        total_input: report.total_input,
    })
}

/// Decode a JSON array of envelopes. With `collect`, every element is
/// attempted and failures are reported alongside the successes.
pub fn decode_aggregate(
    family: Family,
    decoder: &AggregateDecoder,
    raw: &str,
    collect: bool,
) -> Result<AggregateReport<Decoded>, CodecError> {
    match family {
        Family::Transaction => aggregate_of::<Transaction>(decoder, raw, collect, Decoded::Transaction),
        Family::Broadcast => aggregate_of::<BroadcastTxn>(decoder, raw, collect, Decoded::Broadcast),
        Family::Class => aggregate_of::<ClassDefinition>(decoder, raw, collect, Decoded::Class),
        Family::Trace => aggregate_of::<TxnTrace>(decoder, raw, collect, Decoded::Trace),
        Family::BlockTrace => aggregate_of::<TransactionTrace>(decoder, raw, collect, Decoded::BlockTrace),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INVOKE_V1: &str = r#"{"type":"INVOKE","version":"0x1","sender_address":"0x1","calldata":["0x2","0x3"],"max_fee":"0x4","signature":["0x5"],"nonce":"0x6"}"#;

    #[test]
    fn labels_map_back_to_families() {
        assert_eq!(Family::from_label("broadcast transaction"), Some(Family::Broadcast));
        assert_eq!(Family::from_label("contract class"), Some(Family::Class));
        assert_eq!(Family::from_label("transaction trace"), Some(Family::Trace));
        assert_eq!(Family::from_label("block trace"), Some(Family::BlockTrace));
        assert_eq!(Family::from_label("receipt"), None);
    }

    #[test]
    fn resolve_and_summarize_a_transaction() {
        assert_eq!(resolve(Family::Transaction, INVOKE_V1).unwrap(), "INVOKE v1");
        let decoded = Decoded::decode(Family::Transaction, INVOKE_V1).unwrap();
        assert_eq!(decoded.summary(), "INVOKE v1 sender=0x1 nonce=0x6");
    }

    #[test]
    fn aggregate_collect_reports_every_failure() {
        let raw = format!(r#"[{INVOKE_V1},{{"type":"INVOKE"}},{INVOKE_V1},{{"version":"0x1"}}]"#);
        let report = decode_aggregate(Family::Transaction, &AggregateDecoder::sequential(), &raw, true).unwrap();
        assert_eq!(report.total_input, 4);
        assert_eq!(report.decoded.len(), 2);
        let indices: Vec<usize> = report.errors.iter().map(|(i, _)| *i).collect();
        assert_eq!(indices, [1, 3]);

        let err = decode_aggregate(Family::Transaction, &AggregateDecoder::sequential(), &raw, false).unwrap_err();
        assert!(matches!(err, CodecError::Aggregate { index: 1, .. }));
    }
}
