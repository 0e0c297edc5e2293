//! `starkcodec test`: run golden fixture files.
//!
//! Fixture format (JSON):
//! ```json
//! {
//!   "description": "Invoke V1 as returned by starknet_getTransactionByHash",
//!   "input": { "type": "INVOKE", "version": "0x1", "...": "..." },
//!   "expected": {
//!     "family": "transaction",
//!     "discriminator": "INVOKE v1",
//!     "canonical": { "...": "..." }
//!   }
//! }
//! ```
//!
//! `expected.family` selects the resolver; trace fixtures carry
//! `expected.kind` instead. Fixtures matching neither are skipped.
//!
//! An array `input` is checked element by element, against
//! `expected.kinds` when present.

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::cmd_codec::check_round_trip;
use crate::family::{Decoded, Family};

#[derive(Deserialize)]
struct Fixture {
    description: Option<String>,
    input: Value,
    #[serde(default)]
    expected: Value,
}

impl Fixture {
    fn family(&self) -> Option<Family> {
        if let Some(label) = self.expected.get("family").and_then(Value::as_str) {
            return Family::from_label(label);
        }
        if self.input.is_object() && self.expected.get("kind").is_some() {
            return Some(Family::Trace);
        }
        None
    }
}

pub enum Outcome {
    Passed,
    Skipped,
}

/// Check one fixture: decode, expected discriminator, canonical form and
/// round-trip stability.
pub fn check_fixture(text: &str, filter: Option<Family>) -> Result<Outcome> {
    let fixture: Fixture = serde_json::from_str(text).map_err(|e| anyhow!("parse error: {e}"))?;
    let Some(family) = fixture.family() else {
        return Ok(Outcome::Skipped);
    };
    if filter.is_some_and(|wanted| wanted != family) {
        return Ok(Outcome::Skipped);
    }

    if let Value::Array(items) = &fixture.input {
        return check_elements(family, items, &fixture.expected);
    }

    let raw = fixture.input.to_string();
    let decoded = Decoded::decode(family, &raw)?;

    if let Some(expected) = fixture.expected.get("discriminator").and_then(Value::as_str) {
        let found = decoded.discriminator();
        if found != expected {
            bail!("discriminator: expected {expected}, got {found}");
        }
    }
    if let Some(expected) = fixture.expected.get("kind").and_then(Value::as_str) {
        let found = decoded.discriminator();
        if found != expected {
            bail!("kind: expected {expected}, got {found}");
        }
    }
    if let Some(canonical) = fixture.expected.get("canonical") {
        if decoded.to_value()? != *canonical {
            bail!("canonical encoding differs");
        }
    }
    check_round_trip(family, &raw)?;
    Ok(Outcome::Passed)
}

fn check_elements(family: Family, items: &[Value], expected: &Value) -> Result<Outcome> {
    let mut kinds = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let raw = item.to_string();
        let decoded = Decoded::decode(family, &raw).with_context(|| format!("element {index}"))?;
        kinds.push(decoded.discriminator());
        check_round_trip(family, &raw).with_context(|| format!("element {index}"))?;
    }
    if let Some(expected) = expected.get("kinds") {
        let found = Value::from(kinds);
        if found != *expected {
            bail!("kinds: expected {expected}, got {found}");
        }
    }
    Ok(Outcome::Passed)
}

pub fn run(fixtures_dir: &str, filter: Option<Family>, verbose: bool) -> Result<()> {
    let dir = Path::new(fixtures_dir);
    if !dir.exists() {
        bail!("fixtures directory '{fixtures_dir}' not found");
    }

    let mut paths = Vec::new();
    collect_json_files(dir, &mut paths)?;
    paths.sort();

    let (mut passed, mut failed, mut skipped) = (0usize, 0usize, 0usize);
    for path in &paths {
        let text = std::fs::read_to_string(path)?;
        let description = serde_json::from_str::<Fixture>(&text)
            .ok()
            .and_then(|f| f.description)
            .unwrap_or_default();

        match check_fixture(&text, filter) {
            Ok(Outcome::Passed) => {
                passed += 1;
                if verbose {
                    println!("  ✓ {} {}", path.display(), description);
                } else {
                    println!("  ✓ {}", path.display());
                }
            }
            Ok(Outcome::Skipped) => {
                skipped += 1;
                if verbose {
                    println!("  - {} (skipped)", path.display());
                }
            }
            Err(e) => {
                failed += 1;
                eprintln!("  ✗ {}: {e:#}", path.display());
            }
        }
    }

    println!("\n{passed} passed, {failed} failed, {skipped} skipped");
    if failed > 0 {
        bail!("{failed} fixtures failed");
    }
    Ok(())
}

fn collect_json_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_json_files(&path, out)?;
        } else if path.extension().is_some_and(|ext| ext == "json") {
            out.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixtures_dir() -> PathBuf {
        let mut p = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        p.push("../fixtures/starknet");
        p
    }

    #[test]
    fn bundled_fixtures_pass() {
        let mut paths = Vec::new();
        collect_json_files(&fixtures_dir(), &mut paths).unwrap();
        assert!(paths.len() >= 10);
        for path in paths {
            let text = std::fs::read_to_string(&path).unwrap();
            if let Err(e) = check_fixture(&text, None) {
                panic!("{}: {e:#}", path.display());
            }
        }
    }

    #[test]
    fn discriminator_mismatch_fails() {
        let text = r#"{"input":{"type":"INVOKE","version":"0x1","sender_address":"0x1","calldata":[],"max_fee":"0x4","signature":[],"nonce":"0x6"},"expected":{"family":"transaction","discriminator":"INVOKE v3"}}"#;
        let err = check_fixture(text, None).err().unwrap();
        assert_eq!(err.to_string(), "discriminator: expected INVOKE v3, got INVOKE v1");
    }

    #[test]
    fn block_trace_arrays_check_every_element() {
        let text = std::fs::read_to_string(fixtures_dir().join("block-traces.json")).unwrap();
        assert!(matches!(check_fixture(&text, Some(Family::BlockTrace)).unwrap(), Outcome::Passed));

        let mut fixture: Value = serde_json::from_str(&text).unwrap();
        fixture["expected"]["kinds"] = serde_json::json!(["INVOKE", "INVOKE"]);
        let err = check_fixture(&fixture.to_string(), None).err().unwrap();
        assert!(err.to_string().starts_with("kinds: expected"));
    }

    #[test]
    fn filter_skips_other_families() {
        let text = r#"{"input":{},"expected":{"family":"contract class"}}"#;
        assert!(matches!(check_fixture(text, Some(Family::Trace)).unwrap(), Outcome::Skipped));
    }
}
