//! Sequential aggregate decoding.
//!
//! An aggregate is a JSON array whose elements are envelopes of one family.
//! Elements are decoded in input order and the first failure aborts the
//! whole aggregate; callers never see a partial result.

use serde_json::value::RawValue;
use tracing::debug;

use starkcodec_core::{CodecError, Envelope};

/// Borrow every element of a JSON array without decoding any of them.
pub fn split_elements(raw: &str) -> Result<Vec<&RawValue>, CodecError> {
    if !raw.trim_start().starts_with('[') {
        return Err(CodecError::malformed("<root>", "expected a JSON array"));
    }
    serde_json::from_str(raw).map_err(|err| CodecError::malformed("<root>", err))
}

/// Decode a JSON array of `E` envelopes, failing fast on the first element
/// that does not decode.
///
/// The error is `CodecError::Aggregate` carrying the zero-based position of
/// the offending element and its own decode error.
pub fn decode_aggregate<E: Envelope>(raw: &str) -> Result<Vec<E>, CodecError> {
    let elements = split_elements(raw)?;
    decode_elements(&elements)
}

/// Decode already-split elements in order.
pub fn decode_elements<E: Envelope>(elements: &[&RawValue]) -> Result<Vec<E>, CodecError> {
    let mut decoded = Vec::with_capacity(elements.len());
    for (index, element) in elements.iter().enumerate() {
        match E::decode(element.get()) {
            Ok(envelope) => decoded.push(envelope),
            Err(err) => {
                debug!(family = %E::FAMILY, index, kind = err.kind(), "aggregate element rejected");
                return Err(err.at_index(index));
            }
        }
    }
    Ok(decoded)
}

/// Encode envelopes back into a JSON array value.
pub fn encode_aggregate<E: Envelope>(envelopes: &[E]) -> Result<serde_json::Value, CodecError> {
    envelopes
        .iter()
        .map(Envelope::to_value)
        .collect::<Result<Vec<_>, _>>()
        .map(serde_json::Value::Array)
}
