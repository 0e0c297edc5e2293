//! Contract class envelopes.
//!
//! Classes carry no `type`/`version` members. The shape is told apart by
//! structure alone: a deprecated (Cairo 0) class has a compressed `program`,
//! a Sierra class has a `sierra_program` felt array. Candidates are tried in
//! a fixed order and the first confident candidate that decodes wins.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use starkcodec_core::{decode_with_path, CodecError, Envelope, EnvelopeFamily, Felt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SierraEntryPoint {
    pub selector: Felt,
    pub function_idx: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryPointsByType {
    #[serde(rename = "CONSTRUCTOR")]
    pub constructor: Vec<SierraEntryPoint>,
    #[serde(rename = "EXTERNAL")]
    pub external: Vec<SierraEntryPoint>,
    #[serde(rename = "L1_HANDLER")]
    pub l1_handler: Vec<SierraEntryPoint>,
}

/// A Sierra (Cairo 1+) contract class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractClass {
    pub sierra_program: Vec<Felt>,
    pub contract_class_version: String,
    pub entry_points_by_type: EntryPointsByType,
    /// The class ABI as a JSON string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abi: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeprecatedCairoEntryPoint {
    pub offset: Felt,
    pub selector: Felt,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeprecatedEntryPointsByType {
    #[serde(rename = "CONSTRUCTOR")]
    pub constructor: Vec<DeprecatedCairoEntryPoint>,
    #[serde(rename = "EXTERNAL")]
    pub external: Vec<DeprecatedCairoEntryPoint>,
    #[serde(rename = "L1_HANDLER")]
    pub l1_handler: Vec<DeprecatedCairoEntryPoint>,
}

/// A deprecated (Cairo 0) contract class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeprecatedContractClass {
    /// Base64 of the gzip-compressed program.
    pub program: String,
    pub entry_points_by_type: DeprecatedEntryPointsByType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abi: Option<Vec<Value>>,
}

/// A contract class of either generation.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassDefinition {
    Deprecated(DeprecatedContractClass),
    Sierra(ContractClass),
}

impl ClassDefinition {
    pub fn is_deprecated(&self) -> bool {
        matches!(self, ClassDefinition::Deprecated(_))
    }

    pub fn as_sierra(&self) -> Option<&ContractClass> {
        match self {
            ClassDefinition::Sierra(class) => Some(class),
            ClassDefinition::Deprecated(_) => None,
        }
    }

    pub fn as_deprecated(&self) -> Option<&DeprecatedContractClass> {
        match self {
            ClassDefinition::Deprecated(class) => Some(class),
            ClassDefinition::Sierra(_) => None,
        }
    }
}

impl From<ContractClass> for ClassDefinition {
    fn from(class: ContractClass) -> Self {
        ClassDefinition::Sierra(class)
    }
}

impl From<DeprecatedContractClass> for ClassDefinition {
    fn from(class: DeprecatedContractClass) -> Self {
        ClassDefinition::Deprecated(class)
    }
}

/// The distinguishing members of every candidate shape.
#[derive(Deserialize)]
struct ShapeSignals {
    #[serde(default)]
    program: Option<Value>,
    #[serde(default)]
    sierra_program: Option<Value>,
}

/// One candidate in the ordered fallback.
struct ShapeCandidate {
    name: &'static str,
    confident: fn(&ShapeSignals) -> bool,
    decode: fn(&str) -> Result<ClassDefinition, CodecError>,
}

static CLASS_SHAPES: &[ShapeCandidate] = &[
    ShapeCandidate {
        name: "DeprecatedContractClass",
        confident: |signals| non_empty(&signals.program),
        decode: |raw| decode_with_path(raw).map(ClassDefinition::Deprecated),
    },
    ShapeCandidate {
        name: "ContractClass",
        confident: |signals| non_empty(&signals.sierra_program),
        decode: |raw| decode_with_path(raw).map(ClassDefinition::Sierra),
    },
];

fn non_empty(member: &Option<Value>) -> bool {
    match member {
        Some(Value::String(text)) => !text.is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(fields)) => !fields.is_empty(),
        _ => false,
    }
}

/// Resolve a contract class by structure.
///
/// Fails with `UnknownVariant` when no candidate is confident or every
/// confident candidate rejects the payload.
pub fn decode_class(raw: &str) -> Result<ClassDefinition, CodecError> {
    if !raw.trim_start().starts_with('{') {
        return Err(CodecError::malformed("<root>", "expected a JSON object"));
    }
    let signals: ShapeSignals =
        serde_json::from_str(raw).map_err(|err| CodecError::malformed("<root>", err))?;

    let mut rejected = Vec::new();
    for shape in CLASS_SHAPES {
        if !(shape.confident)(&signals) {
            continue;
        }
        match (shape.decode)(raw) {
            Ok(class) => {
                debug!(shape = shape.name, "resolved contract class shape");
                return Ok(class);
            }
            Err(err) => {
                debug!(shape = shape.name, error = %err, "candidate shape rejected");
                rejected.push(format!("{}: {err}", shape.name));
            }
        }
    }

    let found = if rejected.is_empty() {
        "neither `program` nor `sierra_program` is present and non-empty".to_string()
    } else {
        rejected.join("; ")
    };
    Err(CodecError::UnknownVariant {
        family: EnvelopeFamily::ContractClass,
        found,
    })
}

impl Envelope for ClassDefinition {
    const FAMILY: EnvelopeFamily = EnvelopeFamily::ContractClass;

    fn decode(raw: &str) -> Result<Self, CodecError> {
        decode_class(raw)
    }

    fn to_value(&self) -> Result<Value, CodecError> {
        Ok(match self {
            ClassDefinition::Deprecated(class) => serde_json::to_value(class)?,
            ClassDefinition::Sierra(class) => serde_json::to_value(class)?,
        })
    }
}

starkcodec_core::envelope_serde!(ClassDefinition);
