//! Plain request and result shapes that carry no envelope.

use serde::{Deserialize, Serialize};
use starkcodec_core::Felt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHashAndNumber {
    pub block_hash: Felt,
    pub block_number: u64,
}

/// A read-only contract call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub contract_address: Felt,
    pub entry_point_selector: Felt,
    pub calldata: Vec<Felt>,
}

/// A message sent from L1, as priced by `starknet_estimateMessageFee`.
///
/// `from_address` is an Ethereum address and travels as the hex string the
/// caller supplied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgFromL1 {
    pub from_address: String,
    pub to_address: Felt,
    pub entry_point_selector: Felt,
    pub payload: Vec<Felt>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddInvokeTransactionResult {
    pub transaction_hash: Felt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddDeclareTransactionResult {
    pub transaction_hash: Felt,
    pub class_hash: Felt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddDeployAccountTransactionResult {
    pub transaction_hash: Felt,
    pub contract_address: Felt,
}
