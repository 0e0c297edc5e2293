//! Block references passed through to the node unchanged.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::felt::Felt;

/// Special tag naming a block relative to the chain head.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockTag {
    #[serde(rename = "latest")]
    Latest,
    #[serde(rename = "pending")]
    Pending,
}

impl fmt::Display for BlockTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockTag::Latest => f.write_str("latest"),
            BlockTag::Pending => f.write_str("pending"),
        }
    }
}

/// A block reference: a tag, an explicit hash, or an explicit number.
///
/// Wire forms: `"latest"`, `{"block_hash":"0x.."}`, `{"block_number":123}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlockId {
    Tag(BlockTag),
    Hash { block_hash: Felt },
    Number { block_number: u64 },
}

impl BlockId {
    pub fn latest() -> Self {
        Self::Tag(BlockTag::Latest)
    }

    pub fn pending() -> Self {
        Self::Tag(BlockTag::Pending)
    }

    pub fn hash(block_hash: Felt) -> Self {
        Self::Hash { block_hash }
    }

    pub fn number(block_number: u64) -> Self {
        Self::Number { block_number }
    }
}

impl Default for BlockId {
    fn default() -> Self {
        Self::latest()
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockId::Tag(tag) => write!(f, "{tag}"),
            BlockId::Hash { block_hash } => write!(f, "{block_hash}"),
            BlockId::Number { block_number } => write!(f, "#{block_number}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_forms() {
        assert_eq!(serde_json::to_string(&BlockId::latest()).unwrap(), "\"latest\"");
        assert_eq!(
            serde_json::to_string(&BlockId::number(15643)).unwrap(),
            r#"{"block_number":15643}"#
        );
        assert_eq!(
            serde_json::to_string(&BlockId::hash(Felt::from(0xdead))).unwrap(),
            r#"{"block_hash":"0xdead"}"#
        );
    }

    #[test]
    fn parses_every_form() {
        let tag: BlockId = serde_json::from_str("\"pending\"").unwrap();
        assert_eq!(tag, BlockId::pending());

        let number: BlockId = serde_json::from_str(r#"{"block_number":58344}"#).unwrap();
        assert_eq!(number, BlockId::number(58344));

        let hash: BlockId = serde_json::from_str(r#"{"block_hash":"0x1"}"#).unwrap();
        assert_eq!(hash, BlockId::hash(Felt::ONE));

        assert!(serde_json::from_str::<BlockId>("\"finalized\"").is_err());
    }
}
