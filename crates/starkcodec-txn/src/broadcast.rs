//! The broadcast transaction family: transactions as a client submits them.
//!
//! Broadcast payloads never carry server-assigned members such as
//! `transaction_hash`. Declare variants embed the full class being declared.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use starkcodec_core::{
    strategy, CodecError, Discriminator, Envelope, EnvelopeFamily, Felt, Keyed, TransactionType,
    TransactionVersion, Variant, VariantRegistry,
};

use crate::class::{ContractClass, DeprecatedContractClass};
use crate::resource::{DataAvailabilityMode, ResourceBoundsMapping};
use crate::transaction::{
    DeployAccountTxnV1, DeployAccountTxnV3, InvokeTxnV0, InvokeTxnV1, InvokeTxnV3, Transaction,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BroadcastDeclareTxnV1 {
    pub sender_address: Felt,
    pub max_fee: Felt,
    pub signature: Vec<Felt>,
    pub nonce: Felt,
    pub contract_class: DeprecatedContractClass,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastDeclareTxnV2 {
    pub sender_address: Felt,
    pub compiled_class_hash: Felt,
    pub max_fee: Felt,
    pub signature: Vec<Felt>,
    pub nonce: Felt,
    pub contract_class: ContractClass,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastDeclareTxnV3 {
    pub sender_address: Felt,
    pub compiled_class_hash: Felt,
    pub signature: Vec<Felt>,
    pub nonce: Felt,
    pub contract_class: ContractClass,
    pub resource_bounds: ResourceBoundsMapping,
    pub tip: Felt,
    pub paymaster_data: Vec<Felt>,
    pub account_deployment_data: Vec<Felt>,
    pub nonce_data_availability_mode: DataAvailabilityMode,
    pub fee_data_availability_mode: DataAvailabilityMode,
}

variant!(BroadcastDeclareTxnV1 => Declare, V1);
variant!(BroadcastDeclareTxnV2 => Declare, V2);
variant!(BroadcastDeclareTxnV3 => Declare, V3);

/// A transaction ready to be submitted, simulated or estimated.
#[derive(Debug, Clone, PartialEq)]
pub enum BroadcastTxn {
    InvokeV0(InvokeTxnV0),
    InvokeV1(InvokeTxnV1),
    InvokeV3(InvokeTxnV3),
    DeclareV1(BroadcastDeclareTxnV1),
    DeclareV2(BroadcastDeclareTxnV2),
    DeclareV3(BroadcastDeclareTxnV3),
    DeployAccountV1(DeployAccountTxnV1),
    DeployAccountV3(DeployAccountTxnV3),
}

const FAMILY: EnvelopeFamily = EnvelopeFamily::BroadcastTransaction;

pub static BROADCAST_TRANSACTIONS: VariantRegistry<Discriminator, BroadcastTxn> =
    VariantRegistry::new(
        FAMILY,
        &[
            strategy!(BroadcastTxn::InvokeV0(InvokeTxnV0), FAMILY),
            strategy!(BroadcastTxn::InvokeV1(InvokeTxnV1), FAMILY),
            strategy!(BroadcastTxn::InvokeV3(InvokeTxnV3), FAMILY),
            strategy!(BroadcastTxn::DeclareV1(BroadcastDeclareTxnV1), FAMILY),
            strategy!(BroadcastTxn::DeclareV2(BroadcastDeclareTxnV2), FAMILY),
            strategy!(BroadcastTxn::DeclareV3(BroadcastDeclareTxnV3), FAMILY),
            strategy!(BroadcastTxn::DeployAccountV1(DeployAccountTxnV1), FAMILY),
            strategy!(BroadcastTxn::DeployAccountV3(DeployAccountTxnV3), FAMILY),
        ],
    );

impl Keyed for BroadcastTxn {
    type Key = Discriminator;

    fn key(&self) -> Discriminator {
        match self {
            BroadcastTxn::InvokeV0(_) => InvokeTxnV0::KEY,
            BroadcastTxn::InvokeV1(_) => InvokeTxnV1::KEY,
            BroadcastTxn::InvokeV3(_) => InvokeTxnV3::KEY,
            BroadcastTxn::DeclareV1(_) => BroadcastDeclareTxnV1::KEY,
            BroadcastTxn::DeclareV2(_) => BroadcastDeclareTxnV2::KEY,
            BroadcastTxn::DeclareV3(_) => BroadcastDeclareTxnV3::KEY,
            BroadcastTxn::DeployAccountV1(_) => DeployAccountTxnV1::KEY,
            BroadcastTxn::DeployAccountV3(_) => DeployAccountTxnV3::KEY,
        }
    }
}

impl BroadcastTxn {
    pub fn kind(&self) -> TransactionType {
        self.key().kind
    }

    pub fn version(&self) -> TransactionVersion {
        self.key().version
    }

    pub fn sender_address(&self) -> Option<Felt> {
        match self {
            BroadcastTxn::InvokeV1(tx) => Some(tx.sender_address),
            BroadcastTxn::InvokeV3(tx) => Some(tx.sender_address),
            BroadcastTxn::DeclareV1(tx) => Some(tx.sender_address),
            BroadcastTxn::DeclareV2(tx) => Some(tx.sender_address),
            BroadcastTxn::DeclareV3(tx) => Some(tx.sender_address),
            BroadcastTxn::InvokeV0(_)
            | BroadcastTxn::DeployAccountV1(_)
            | BroadcastTxn::DeployAccountV3(_) => None,
        }
    }

    /// Fail with `TypeMismatch` unless this is a `kind` transaction.
    pub fn expect_kind(&self, kind: TransactionType) -> Result<(), CodecError> {
        if self.kind() == kind {
            Ok(())
        } else {
            Err(CodecError::TypeMismatch {
                expected: kind.to_string(),
                got: self.key().to_string(),
            })
        }
    }
}

/// Invoke and deploy-account transactions have the same body on chain and on
/// the wire; declares and the legacy kinds cannot be rebroadcast.
impl TryFrom<Transaction> for BroadcastTxn {
    type Error = CodecError;

    fn try_from(tx: Transaction) -> Result<Self, CodecError> {
        match tx {
            Transaction::InvokeV0(tx) => Ok(BroadcastTxn::InvokeV0(tx)),
            Transaction::InvokeV1(tx) => Ok(BroadcastTxn::InvokeV1(tx)),
            Transaction::InvokeV3(tx) => Ok(BroadcastTxn::InvokeV3(tx)),
            Transaction::DeployAccountV1(tx) => Ok(BroadcastTxn::DeployAccountV1(tx)),
            Transaction::DeployAccountV3(tx) => Ok(BroadcastTxn::DeployAccountV3(tx)),
            other => Err(CodecError::TypeMismatch {
                expected: "broadcastable transaction".into(),
                got: other.key().to_string(),
            }),
        }
    }
}

impl Envelope for BroadcastTxn {
    const FAMILY: EnvelopeFamily = FAMILY;

    fn decode(raw: &str) -> Result<Self, CodecError> {
        BROADCAST_TRANSACTIONS.decode(raw)
    }

    fn to_value(&self) -> Result<Value, CodecError> {
        BROADCAST_TRANSACTIONS.encode_value(self.key(), self)
    }
}

starkcodec_core::envelope_serde!(BroadcastTxn);
