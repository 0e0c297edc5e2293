//! The transaction envelope family, as returned by block and transaction
//! queries.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use starkcodec_core::{
    strategy, CodecError, Discriminator, Envelope, EnvelopeFamily, Felt, Keyed, TransactionType,
    TransactionVersion, Variant, VariantRegistry,
};

use crate::resource::{DataAvailabilityMode, ResourceBoundsMapping};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvokeTxnV0 {
    pub max_fee: Felt,
    pub signature: Vec<Felt>,
    pub contract_address: Felt,
    pub entry_point_selector: Felt,
    pub calldata: Vec<Felt>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvokeTxnV1 {
    pub sender_address: Felt,
    pub calldata: Vec<Felt>,
    pub max_fee: Felt,
    pub signature: Vec<Felt>,
    pub nonce: Felt,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvokeTxnV3 {
    pub sender_address: Felt,
    pub calldata: Vec<Felt>,
    pub signature: Vec<Felt>,
    pub nonce: Felt,
    pub resource_bounds: ResourceBoundsMapping,
    pub tip: Felt,
    pub paymaster_data: Vec<Felt>,
    pub account_deployment_data: Vec<Felt>,
    pub nonce_data_availability_mode: DataAvailabilityMode,
    pub fee_data_availability_mode: DataAvailabilityMode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclareTxnV0 {
    pub sender_address: Felt,
    pub max_fee: Felt,
    pub signature: Vec<Felt>,
    pub class_hash: Felt,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclareTxnV1 {
    pub sender_address: Felt,
    pub max_fee: Felt,
    pub signature: Vec<Felt>,
    pub nonce: Felt,
    pub class_hash: Felt,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclareTxnV2 {
    pub sender_address: Felt,
    pub compiled_class_hash: Felt,
    pub max_fee: Felt,
    pub signature: Vec<Felt>,
    pub nonce: Felt,
    pub class_hash: Felt,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclareTxnV3 {
    pub sender_address: Felt,
    pub compiled_class_hash: Felt,
    pub signature: Vec<Felt>,
    pub nonce: Felt,
    pub class_hash: Felt,
    pub resource_bounds: ResourceBoundsMapping,
    pub tip: Felt,
    pub paymaster_data: Vec<Felt>,
    pub account_deployment_data: Vec<Felt>,
    pub nonce_data_availability_mode: DataAvailabilityMode,
    pub fee_data_availability_mode: DataAvailabilityMode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployAccountTxnV1 {
    pub max_fee: Felt,
    pub signature: Vec<Felt>,
    pub nonce: Felt,
    pub contract_address_salt: Felt,
    pub constructor_calldata: Vec<Felt>,
    pub class_hash: Felt,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployAccountTxnV3 {
    pub signature: Vec<Felt>,
    pub nonce: Felt,
    pub contract_address_salt: Felt,
    pub constructor_calldata: Vec<Felt>,
    pub class_hash: Felt,
    pub resource_bounds: ResourceBoundsMapping,
    pub tip: Felt,
    pub paymaster_data: Vec<Felt>,
    pub nonce_data_availability_mode: DataAvailabilityMode,
    pub fee_data_availability_mode: DataAvailabilityMode,
}

/// Legacy deploy; only seen in historical blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployTxn {
    pub class_hash: Felt,
    pub contract_address_salt: Felt,
    pub constructor_calldata: Vec<Felt>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct L1HandlerTxn {
    pub nonce: Felt,
    pub contract_address: Felt,
    pub entry_point_selector: Felt,
    pub calldata: Vec<Felt>,
}

variant!(InvokeTxnV0 => Invoke, V0);
variant!(InvokeTxnV1 => Invoke, V1);
variant!(InvokeTxnV3 => Invoke, V3);
variant!(DeclareTxnV0 => Declare, V0);
variant!(DeclareTxnV1 => Declare, V1);
variant!(DeclareTxnV2 => Declare, V2);
variant!(DeclareTxnV3 => Declare, V3);
variant!(DeployAccountTxnV1 => DeployAccount, V1);
variant!(DeployAccountTxnV3 => DeployAccount, V3);
variant!(DeployTxn => Deploy, V0);
variant!(L1HandlerTxn => L1Handler, V0);

/// A transaction as stored on chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transaction {
    InvokeV0(InvokeTxnV0),
    InvokeV1(InvokeTxnV1),
    InvokeV3(InvokeTxnV3),
    DeclareV0(DeclareTxnV0),
    DeclareV1(DeclareTxnV1),
    DeclareV2(DeclareTxnV2),
    DeclareV3(DeclareTxnV3),
    DeployAccountV1(DeployAccountTxnV1),
    DeployAccountV3(DeployAccountTxnV3),
    Deploy(DeployTxn),
    L1Handler(L1HandlerTxn),
}

const FAMILY: EnvelopeFamily = EnvelopeFamily::Transaction;

/// Every `(type, version)` pair accepted in the transaction family.
pub static TRANSACTIONS: VariantRegistry<Discriminator, Transaction> = VariantRegistry::new(
    FAMILY,
    &[
        strategy!(Transaction::InvokeV0(InvokeTxnV0), FAMILY),
        strategy!(Transaction::InvokeV1(InvokeTxnV1), FAMILY),
        strategy!(Transaction::InvokeV3(InvokeTxnV3), FAMILY),
        strategy!(Transaction::DeclareV0(DeclareTxnV0), FAMILY),
        strategy!(Transaction::DeclareV1(DeclareTxnV1), FAMILY),
        strategy!(Transaction::DeclareV2(DeclareTxnV2), FAMILY),
        strategy!(Transaction::DeclareV3(DeclareTxnV3), FAMILY),
        strategy!(Transaction::DeployAccountV1(DeployAccountTxnV1), FAMILY),
        strategy!(Transaction::DeployAccountV3(DeployAccountTxnV3), FAMILY),
        strategy!(Transaction::Deploy(DeployTxn), FAMILY),
        strategy!(Transaction::L1Handler(L1HandlerTxn), FAMILY),
    ],
);

impl Keyed for Transaction {
    type Key = Discriminator;

    fn key(&self) -> Discriminator {
        match self {
            Transaction::InvokeV0(_) => InvokeTxnV0::KEY,
            Transaction::InvokeV1(_) => InvokeTxnV1::KEY,
            Transaction::InvokeV3(_) => InvokeTxnV3::KEY,
            Transaction::DeclareV0(_) => DeclareTxnV0::KEY,
            Transaction::DeclareV1(_) => DeclareTxnV1::KEY,
            Transaction::DeclareV2(_) => DeclareTxnV2::KEY,
            Transaction::DeclareV3(_) => DeclareTxnV3::KEY,
            Transaction::DeployAccountV1(_) => DeployAccountTxnV1::KEY,
            Transaction::DeployAccountV3(_) => DeployAccountTxnV3::KEY,
            Transaction::Deploy(_) => DeployTxn::KEY,
            Transaction::L1Handler(_) => L1HandlerTxn::KEY,
        }
    }
}

impl Transaction {
    pub fn kind(&self) -> TransactionType {
        self.key().kind
    }

    pub fn version(&self) -> TransactionVersion {
        self.key().version
    }

    /// The account that sent the transaction, where the variant has one.
    pub fn sender_address(&self) -> Option<Felt> {
        match self {
            Transaction::InvokeV1(tx) => Some(tx.sender_address),
            Transaction::InvokeV3(tx) => Some(tx.sender_address),
            Transaction::DeclareV0(tx) => Some(tx.sender_address),
            Transaction::DeclareV1(tx) => Some(tx.sender_address),
            Transaction::DeclareV2(tx) => Some(tx.sender_address),
            Transaction::DeclareV3(tx) => Some(tx.sender_address),
            Transaction::InvokeV0(_)
            | Transaction::DeployAccountV1(_)
            | Transaction::DeployAccountV3(_)
            | Transaction::Deploy(_)
            | Transaction::L1Handler(_) => None,
        }
    }

    pub fn nonce(&self) -> Option<Felt> {
        match self {
            Transaction::InvokeV1(tx) => Some(tx.nonce),
            Transaction::InvokeV3(tx) => Some(tx.nonce),
            Transaction::DeclareV1(tx) => Some(tx.nonce),
            Transaction::DeclareV2(tx) => Some(tx.nonce),
            Transaction::DeclareV3(tx) => Some(tx.nonce),
            Transaction::DeployAccountV1(tx) => Some(tx.nonce),
            Transaction::DeployAccountV3(tx) => Some(tx.nonce),
            Transaction::L1Handler(tx) => Some(tx.nonce),
            Transaction::InvokeV0(_) | Transaction::DeclareV0(_) | Transaction::Deploy(_) => None,
        }
    }
}

impl Envelope for Transaction {
    const FAMILY: EnvelopeFamily = FAMILY;

    fn decode(raw: &str) -> Result<Self, CodecError> {
        TRANSACTIONS.decode(raw)
    }

    fn to_value(&self) -> Result<Value, CodecError> {
        TRANSACTIONS.encode_value(self.key(), self)
    }
}

starkcodec_core::envelope_serde!(Transaction);

/// A transaction together with the hash the sequencer assigned to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionWithHash {
    pub transaction_hash: Felt,
    pub transaction: Transaction,
}

#[derive(Deserialize)]
struct HashMember {
    #[serde(default)]
    transaction_hash: Option<Felt>,
}

impl Envelope for TransactionWithHash {
    const FAMILY: EnvelopeFamily = FAMILY;

    fn decode(raw: &str) -> Result<Self, CodecError> {
        let transaction = Transaction::decode(raw)?;
        let transaction_hash = starkcodec_core::decode_with_path::<HashMember>(raw)?
            .transaction_hash
            .ok_or_else(|| CodecError::malformed("transaction_hash", "missing field"))?;
        Ok(Self {
            transaction_hash,
            transaction,
        })
    }

    fn to_value(&self) -> Result<Value, CodecError> {
        let mut value = self.transaction.to_value()?;
        if let Value::Object(object) = &mut value {
            object.insert(
                "transaction_hash".into(),
                Value::String(self.transaction_hash.to_string()),
            );
        }
        Ok(value)
    }
}

starkcodec_core::envelope_serde!(TransactionWithHash);
