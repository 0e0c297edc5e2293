//! Error types for the StarkCodec decode/encode pipeline.

use std::fmt;
use thiserror::Error;

use crate::discriminator::TransactionType;

/// The envelope families a payload can be resolved into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvelopeFamily {
    Transaction,
    BroadcastTransaction,
    ContractClass,
    TransactionTrace,
}

impl fmt::Display for EnvelopeFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvelopeFamily::Transaction => write!(f, "transaction"),
            EnvelopeFamily::BroadcastTransaction => write!(f, "broadcast transaction"),
            EnvelopeFamily::ContractClass => write!(f, "contract class"),
            EnvelopeFamily::TransactionTrace => write!(f, "transaction trace"),
        }
    }
}

/// Errors that can occur while decoding or encoding a single envelope.
///
/// Every failure is scoped to the call that produced it; nothing here is
/// retried or swallowed.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("missing discriminator field `{field}`")]
    MissingDiscriminator { field: &'static str },

    #[error("unknown {family} variant: {found}")]
    UnknownVariant { family: EnvelopeFamily, found: String },

    #[error("unrecognized version {version} for {kind}")]
    UnrecognizedVersion { kind: TransactionType, version: String },

    #[error("type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },

    #[error("malformed field `{field}`: {reason}")]
    MalformedField { field: String, reason: String },

    #[error("element {index} failed to decode: {source}")]
    Aggregate {
        index: usize,
        #[source]
        source: Box<CodecError>,
    },

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl CodecError {
    pub fn malformed(field: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::MalformedField {
            field: field.into(),
            reason: reason.to_string(),
        }
    }

    /// Wrap an element failure with its position in an aggregate.
    pub fn at_index(self, index: usize) -> Self {
        Self::Aggregate {
            index,
            source: Box::new(self),
        }
    }

    /// Short, stable name of the error kind, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            CodecError::MissingDiscriminator { .. } => "MissingDiscriminator",
            CodecError::UnknownVariant { .. } => "UnknownVariant",
            CodecError::UnrecognizedVersion { .. } => "UnrecognizedVersion",
            CodecError::TypeMismatch { .. } => "TypeMismatch",
            CodecError::MalformedField { .. } => "MalformedField",
            CodecError::Aggregate { .. } => "AggregateDecodeError",
            CodecError::Serde(_) => "Serde",
        }
    }

    /// The innermost error below any `Aggregate` wrappers.
    pub fn root_cause(&self) -> &CodecError {
        let mut current = self;
        while let CodecError::Aggregate { source, .. } = current {
            current = source;
        }
        current
    }
}
