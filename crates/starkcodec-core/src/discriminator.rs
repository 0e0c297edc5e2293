//! Discriminator resolution.
//!
//! A resolver reads only the `type` (and, where the family needs it,
//! `version`) members of a raw JSON object. The rest of the payload is
//! skipped without being materialised, so resolution stays cheap even for
//! envelopes that embed a full contract class.

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::error::{CodecError, EnvelopeFamily};
use crate::felt::Felt;

/// Query versions are offset by `2^128` from the version they simulate.
const QUERY_VERSION_BASE: U256 = U256::from_limbs([0, 0, 1, 0]);

/// The closed set of transaction kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionType {
    #[serde(rename = "INVOKE")]
    Invoke,
    #[serde(rename = "DECLARE")]
    Declare,
    #[serde(rename = "DEPLOY_ACCOUNT")]
    DeployAccount,
    #[serde(rename = "DEPLOY")]
    Deploy,
    #[serde(rename = "L1_HANDLER")]
    L1Handler,
}

impl TransactionType {
    pub const ALL: [TransactionType; 5] = [
        TransactionType::Invoke,
        TransactionType::Declare,
        TransactionType::DeployAccount,
        TransactionType::Deploy,
        TransactionType::L1Handler,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Invoke => "INVOKE",
            TransactionType::Declare => "DECLARE",
            TransactionType::DeployAccount => "DEPLOY_ACCOUNT",
            TransactionType::Deploy => "DEPLOY",
            TransactionType::L1Handler => "L1_HANDLER",
        }
    }

    /// Exact, case-sensitive match against the wire names.
    pub fn from_wire(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transaction versions with at least one registered variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TransactionVersion {
    V0,
    V1,
    V2,
    V3,
}

impl TransactionVersion {
    /// Canonical wire form.
    pub fn as_hex(&self) -> &'static str {
        match self {
            TransactionVersion::V0 => "0x0",
            TransactionVersion::V1 => "0x1",
            TransactionVersion::V2 => "0x2",
            TransactionVersion::V3 => "0x3",
        }
    }

    pub fn from_number(n: u64) -> Option<Self> {
        match n {
            0 => Some(TransactionVersion::V0),
            1 => Some(TransactionVersion::V1),
            2 => Some(TransactionVersion::V2),
            3 => Some(TransactionVersion::V3),
            _ => None,
        }
    }

    /// Map a version felt onto a known version. Query versions
    /// (`2^128 + v`) fold onto `v`.
    pub fn from_felt(felt: Felt) -> Option<Self> {
        let mut value = felt.as_u256();
        if value >= QUERY_VERSION_BASE {
            value -= QUERY_VERSION_BASE;
        }
        let limbs = value.as_limbs();
        if limbs[1..].iter().any(|limb| *limb != 0) {
            return None;
        }
        Self::from_number(limbs[0])
    }
}

impl fmt::Display for TransactionVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionVersion::V0 => f.write_str("v0"),
            TransactionVersion::V1 => f.write_str("v1"),
            TransactionVersion::V2 => f.write_str("v2"),
            TransactionVersion::V3 => f.write_str("v3"),
        }
    }
}

impl Serialize for TransactionVersion {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_hex())
    }
}

impl<'de> Deserialize<'de> for TransactionVersion {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::Error;

        let felt = Felt::deserialize(deserializer)?;
        Self::from_felt(felt)
            .ok_or_else(|| D::Error::custom(format!("unsupported transaction version {felt}")))
    }
}

/// The `(type, version)` pair that selects a transaction-shaped variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Discriminator {
    pub kind: TransactionType,
    pub version: TransactionVersion,
}

impl Discriminator {
    pub const fn new(kind: TransactionType, version: TransactionVersion) -> Self {
        Self { kind, version }
    }
}

impl fmt::Display for Discriminator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.version)
    }
}

/// A key that selects a strategy in a variant registry.
pub trait DiscriminatorKey:
    Copy + Eq + fmt::Display + fmt::Debug + Send + Sync + 'static
{
    /// Read the key from a raw JSON object without decoding the rest of it.
    fn resolve(raw: &str, family: EnvelopeFamily) -> Result<Self, CodecError>;

    /// Write the key members onto an encoded object.
    fn stamp(&self, object: &mut Map<String, Value>);

    /// The error reported for a well-formed key without a registered strategy.
    fn unregistered(&self, family: EnvelopeFamily) -> CodecError;
}

/// Only the discriminator members; everything else is skipped.
#[derive(Deserialize)]
struct Tags {
    #[serde(rename = "type", default)]
    ty: Option<Value>,
    #[serde(default)]
    version: Option<Value>,
}

fn read_tags(raw: &str) -> Result<Tags, CodecError> {
    // serde would also accept a positional array for a struct.
    if !raw.trim_start().starts_with('{') {
        return Err(CodecError::malformed("<root>", "expected a JSON object"));
    }
    serde_json::from_str(raw).map_err(|err| CodecError::malformed("<root>", err))
}

fn resolve_type(ty: Option<Value>, family: EnvelopeFamily) -> Result<TransactionType, CodecError> {
    let value = ty.ok_or(CodecError::MissingDiscriminator { field: "type" })?;
    let Some(name) = value.as_str() else {
        return Err(CodecError::UnknownVariant {
            family,
            found: value.to_string(),
        });
    };
    TransactionType::from_wire(name).ok_or_else(|| CodecError::UnknownVariant {
        family,
        found: name.to_string(),
    })
}

fn resolve_version(
    kind: TransactionType,
    version: Option<Value>,
) -> Result<TransactionVersion, CodecError> {
    let value = version.ok_or(CodecError::MissingDiscriminator { field: "version" })?;
    let Some(text) = value.as_str() else {
        return Err(CodecError::malformed(
            "version",
            format!("expected a hex string, got {value}"),
        ));
    };
    let felt = Felt::from_hex(text).map_err(|err| CodecError::malformed("version", err))?;
    TransactionVersion::from_felt(felt).ok_or_else(|| CodecError::UnrecognizedVersion {
        kind,
        version: text.to_string(),
    })
}

impl DiscriminatorKey for TransactionType {
    fn resolve(raw: &str, family: EnvelopeFamily) -> Result<Self, CodecError> {
        resolve_type(read_tags(raw)?.ty, family)
    }

    fn stamp(&self, object: &mut Map<String, Value>) {
        object.insert("type".into(), Value::String(self.as_str().into()));
    }

    fn unregistered(&self, family: EnvelopeFamily) -> CodecError {
        CodecError::UnknownVariant {
            family,
            found: self.to_string(),
        }
    }
}

impl DiscriminatorKey for Discriminator {
    fn resolve(raw: &str, family: EnvelopeFamily) -> Result<Self, CodecError> {
        let Tags { ty, version } = read_tags(raw)?;
        let kind = resolve_type(ty, family)?;
        let version = resolve_version(kind, version)?;
        Ok(Discriminator::new(kind, version))
    }

    fn stamp(&self, object: &mut Map<String, Value>) {
        self.kind.stamp(object);
        object.insert("version".into(), Value::String(self.version.as_hex().into()));
    }

    fn unregistered(&self, _family: EnvelopeFamily) -> CodecError {
        CodecError::UnrecognizedVersion {
            kind: self.kind,
            version: self.version.as_hex().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FAMILY: EnvelopeFamily = EnvelopeFamily::Transaction;

    #[test]
    fn resolves_type_and_version() {
        let raw = r#"{"type":"INVOKE","version":"0x1","sender_address":"0x4"}"#;
        let disc = Discriminator::resolve(raw, FAMILY).unwrap();
        assert_eq!(
            disc,
            Discriminator::new(TransactionType::Invoke, TransactionVersion::V1)
        );
        assert_eq!(disc.to_string(), "INVOKE v1");
    }

    #[test]
    fn padded_and_query_versions_normalize() {
        for version in ["0x01", "0x0000001", "0x100000000000000000000000000000001"] {
            let raw = format!(r#"{{"type":"DECLARE","version":"{version}"}}"#);
            let disc = Discriminator::resolve(&raw, FAMILY).unwrap();
            assert_eq!(disc.version, TransactionVersion::V1, "version {version}");
        }
    }

    #[test]
    fn missing_type_is_missing_discriminator() {
        let err = Discriminator::resolve(r#"{"version":"0x1"}"#, FAMILY).unwrap_err();
        assert!(matches!(err, CodecError::MissingDiscriminator { field: "type" }));

        let err = Discriminator::resolve(r#"{"type":null,"version":"0x1"}"#, FAMILY).unwrap_err();
        assert!(matches!(err, CodecError::MissingDiscriminator { field: "type" }));
    }

    #[test]
    fn missing_version_is_missing_discriminator() {
        let err = Discriminator::resolve(r#"{"type":"INVOKE"}"#, FAMILY).unwrap_err();
        assert!(matches!(err, CodecError::MissingDiscriminator { field: "version" }));
    }

    #[test]
    fn unknown_type_is_unknown_variant() {
        let err = Discriminator::resolve(r#"{"type":"BOGUS","version":"0x1"}"#, FAMILY).unwrap_err();
        assert!(matches!(err, CodecError::UnknownVariant { ref found, .. } if found == "BOGUS"));

        // Matching is exact: lower case is not a known kind.
        let err = Discriminator::resolve(r#"{"type":"invoke","version":"0x1"}"#, FAMILY).unwrap_err();
        assert!(matches!(err, CodecError::UnknownVariant { .. }));

        let err = Discriminator::resolve(r#"{"type":7,"version":"0x1"}"#, FAMILY).unwrap_err();
        assert!(matches!(err, CodecError::UnknownVariant { .. }));
    }

    #[test]
    fn out_of_range_version_is_unrecognized() {
        let err = Discriminator::resolve(r#"{"type":"INVOKE","version":"0x7"}"#, FAMILY).unwrap_err();
        assert!(matches!(
            err,
            CodecError::UnrecognizedVersion { kind: TransactionType::Invoke, ref version } if version == "0x7"
        ));
    }

    #[test]
    fn non_hex_version_is_malformed() {
        let err = Discriminator::resolve(r#"{"type":"INVOKE","version":"1"}"#, FAMILY).unwrap_err();
        assert!(matches!(err, CodecError::MalformedField { ref field, .. } if field == "version"));

        let err = Discriminator::resolve(r#"{"type":"INVOKE","version":1}"#, FAMILY).unwrap_err();
        assert!(matches!(err, CodecError::MalformedField { .. }));
    }

    #[test]
    fn type_only_key_ignores_version() {
        let kind = TransactionType::resolve(r#"{"type":"L1_HANDLER"}"#, FAMILY).unwrap();
        assert_eq!(kind, TransactionType::L1Handler);
    }

    #[test]
    fn stamping_writes_canonical_members() {
        let mut object = Map::new();
        Discriminator::new(TransactionType::DeployAccount, TransactionVersion::V3).stamp(&mut object);
        assert_eq!(object["type"], "DEPLOY_ACCOUNT");
        assert_eq!(object["version"], "0x3");
    }

    #[test]
    fn non_object_payload_is_malformed() {
        let err = Discriminator::resolve("[1,2]", FAMILY).unwrap_err();
        assert!(matches!(err, CodecError::MalformedField { ref field, .. } if field == "<root>"));
    }
}
