//! `starkcodec resolve | decode | roundtrip` on local JSON files.

use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::io::Read;

use starkcodec_batch::AggregateDecoder;

use crate::family::{self, Decoded, Family};

/// Read a file, or stdin when `path` is `-`.
pub fn read_input(path: &str) -> Result<String> {
    if path == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("read stdin")?;
        Ok(text)
    } else {
        std::fs::read_to_string(path).with_context(|| format!("read '{path}'"))
    }
}

pub fn resolve(family: Family, path: &str) -> Result<()> {
    let raw = read_input(path)?;
    let key = family::resolve(family, &raw).with_context(|| format!("resolve '{path}'"))?;
    println!("{key}");
    Ok(())
}

pub fn decode(
    family: Family,
    path: &str,
    aggregate: bool,
    collect: bool,
    parallel_threshold: usize,
    as_json: bool,
) -> Result<()> {
    let raw = read_input(path)?;

    if !aggregate {
        let decoded = Decoded::decode(family, &raw).with_context(|| format!("decode '{path}'"))?;
        if as_json {
            println!("{}", serde_json::to_string_pretty(&decoded.to_value()?)?);
        } else {
            println!("{}", decoded.summary());
        }
        return Ok(());
    }

    let decoder = AggregateDecoder::new().parallel_threshold(parallel_threshold);
    let report = family::decode_aggregate(family, &decoder, &raw, collect)
        .with_context(|| format!("decode '{path}'"))?;

    if as_json {
        let values = report
            .decoded
            .iter()
            .map(Decoded::to_value)
            .collect::<Result<Vec<_>, _>>()?;
        println!("{}", serde_json::to_string_pretty(&Value::Array(values))?);
    } else {
        for (i, decoded) in report.decoded.iter().enumerate() {
            println!("[{i}] {}", decoded.summary());
        }
        println!(
            "{} of {} elements decoded",
            report.decoded.len(),
            report.total_input
        );
    }
    for (index, err) in &report.errors {
        eprintln!("  ✗ element {index}: {err}");
    }
    if !report.is_clean() {
        bail!("{} elements failed to decode", report.errors.len());
    }
    Ok(())
}

/// Outcome of decoding, re-encoding and decoding again.
#[derive(Debug, PartialEq, Eq)]
pub enum RoundTrip {
    /// Input was already canonical.
    Identical,
    /// Input decoded to the same value but was written differently
    /// (padded felts, query version, absent optionals).
    Canonicalized,
}

pub fn check_round_trip(family: Family, raw: &str) -> Result<RoundTrip> {
    let first = Decoded::decode(family, raw).context("decode input")?;
    let encoded = first.to_value()?;
    let second = Decoded::decode(family, &encoded.to_string()).context("decode re-encoded output")?;
    if second.to_value()? != encoded {
        bail!("re-encoding is not stable for {}", first.discriminator());
    }

    let input: Value = serde_json::from_str(raw).context("input is not JSON")?;
    Ok(if input == encoded {
        RoundTrip::Identical
    } else {
        RoundTrip::Canonicalized
    })
}

pub fn roundtrip(family: Family, path: &str) -> Result<()> {
    let raw = read_input(path)?;
    match check_round_trip(family, &raw).with_context(|| format!("round-trip '{path}'"))? {
        RoundTrip::Identical => println!("✓ {path}: identical"),
        RoundTrip::Canonicalized => println!("✓ {path}: stable after canonicalization"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_input_is_identical() {
        let raw = r#"{"type":"INVOKE","version":"0x1","sender_address":"0x1","calldata":[],"max_fee":"0x4","signature":[],"nonce":"0x6"}"#;
        assert_eq!(check_round_trip(Family::Transaction, raw).unwrap(), RoundTrip::Identical);
    }

    #[test]
    fn padded_felts_are_canonicalized() {
        let raw = r#"{"type":"INVOKE","version":"0x1","sender_address":"0x0001","calldata":[],"max_fee":"0x4","signature":[],"nonce":"0x6"}"#;
        assert_eq!(check_round_trip(Family::Transaction, raw).unwrap(), RoundTrip::Canonicalized);
    }

    #[test]
    fn wrong_family_fails() {
        let raw = r#"{"type":"DEPLOY","version":"0x0","class_hash":"0x1","contract_address_salt":"0x2","constructor_calldata":[]}"#;
        assert!(check_round_trip(Family::Broadcast, raw).is_err());
    }
}
