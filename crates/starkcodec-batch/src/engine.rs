//! `AggregateDecoder`: decode large aggregates across a Rayon pool.

use rayon::prelude::*;
use serde::Deserialize;
use serde_json::value::RawValue;
use tracing::{debug, info};

use starkcodec_core::{CodecError, Envelope};

use crate::aggregate::{decode_elements, split_elements};

/// Result of a lenient decode: every element is attempted.
#[derive(Debug)]
pub struct AggregateReport<E> {
    /// Successfully decoded envelopes, in input order
    pub decoded: Vec<E>,
    /// (original_index, error) pairs, in input order
    pub errors: Vec<(usize, CodecError)>,
    /// Total elements in the input array
    pub total_input: usize,
}

impl<E> AggregateReport<E> {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Aggregate decode engine.
///
/// Aggregates with more than `parallel_threshold` elements are decoded on
/// the Rayon pool. Either way the result is identical to sequential
/// decoding: elements keep their input order and a failure reports the
/// lowest failing index.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct AggregateDecoder {
    pub parallel_threshold: usize,
}

impl Default for AggregateDecoder {
    fn default() -> Self {
        Self {
            parallel_threshold: 64,
        }
    }
}

impl AggregateDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parallel_threshold(mut self, n: usize) -> Self {
        self.parallel_threshold = n;
        self
    }

    /// Always decode sequentially.
    pub fn sequential() -> Self {
        Self {
            parallel_threshold: usize::MAX,
        }
    }

    /// Decode a JSON array of envelopes, failing on the first bad element.
    pub fn decode<E>(&self, raw: &str) -> Result<Vec<E>, CodecError>
    where
        E: Envelope + Send,
    {
        let elements = split_elements(raw)?;
        let total = elements.len();

        if total <= self.parallel_threshold {
            debug!(family = %E::FAMILY, total, "decoding aggregate sequentially");
            return decode_elements(&elements);
        }

        info!(family = %E::FAMILY, total, "decoding aggregate in parallel");
        let results: Vec<Result<E, CodecError>> = decode_parallel(&elements);

        // Scan in input order so the reported index is the lowest failure.
        let mut decoded = Vec::with_capacity(total);
        for (index, result) in results.into_iter().enumerate() {
            decoded.push(result.map_err(|err| err.at_index(index))?);
        }
        Ok(decoded)
    }

    /// Attempt every element and report failures alongside the successes.
    pub fn decode_collect<E>(&self, raw: &str) -> Result<AggregateReport<E>, CodecError>
    where
        E: Envelope + Send,
    {
        let elements = split_elements(raw)?;
        let total_input = elements.len();

        let results: Vec<Result<E, CodecError>> = if total_input > self.parallel_threshold {
            decode_parallel(&elements)
        } else {
            elements.iter().map(|element| E::decode(element.get())).collect()
        };

        let mut decoded = Vec::with_capacity(total_input);
        let mut errors = Vec::new();
        for (index, result) in results.into_iter().enumerate() {
            match result {
                Ok(envelope) => decoded.push(envelope),
                Err(err) => errors.push((index, err)),
            }
        }

        info!(
            family = %E::FAMILY,
            total_input,
            decoded = decoded.len(),
            errors = errors.len(),
            "aggregate decode complete"
        );

        Ok(AggregateReport {
            decoded,
            errors,
            total_input,
        })
    }
}

fn decode_parallel<E>(elements: &[&RawValue]) -> Vec<Result<E, CodecError>>
where
    E: Envelope + Send,
{
    elements
        .par_iter()
        .map(|element| E::decode(element.get()))
        .collect()
}
