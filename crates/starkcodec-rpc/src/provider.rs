//! Typed Starknet JSON-RPC provider.
//!
//! Every method builds named parameters, sends one request through the
//! transport and decodes the raw result with the matching envelope
//! resolver. Broadcast methods check the transaction kind before any I/O.

use serde::de::DeserializeOwned;
use serde_json::value::RawValue;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

use starkcodec_batch::{encode_aggregate, AggregateDecoder};
use starkcodec_core::{decode_with_path, BlockId, Envelope, Felt, TransactionType};
use starkcodec_trace::{
    FeeEstimate, SimulateTransactionInput, SimulateTransactionOutput, SimulationFlag,
    TransactionTrace, TxnTrace,
};
use starkcodec_txn::{BroadcastTxn, ClassDefinition, TransactionWithHash};

use crate::error::ProviderError;
use crate::transport::RpcTransport;
use crate::types::{
    AddDeclareTransactionResult, AddDeployAccountTransactionResult, AddInvokeTransactionResult,
    BlockHashAndNumber, FunctionCall, MsgFromL1,
};

/// A Starknet node reached through any [`RpcTransport`].
pub struct StarknetProvider<T> {
    transport: T,
    next_id: AtomicU64,
    aggregate: AggregateDecoder,
}

impl<T: RpcTransport> StarknetProvider<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            next_id: AtomicU64::new(1),
            aggregate: AggregateDecoder::default(),
        }
    }

    /// Decoder used for array results such as block traces.
    pub fn aggregate_decoder(mut self, decoder: AggregateDecoder) -> Self {
        self.aggregate = decoder;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    async fn raw(&self, method: &str, params: Value) -> Result<Box<RawValue>, ProviderError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        info!(method, id, url = self.transport.url(), "rpc call");
        let raw = self
            .transport
            .request(id, method, params)
            .await
            .map_err(|e| ProviderError::transport(method, e))?;
        debug!(method, id, bytes = raw.get().len(), "rpc result");
        Ok(raw)
    }

    async fn call_plain<R: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<R, ProviderError> {
        let raw = self.raw(method, params).await?;
        decode_with_path(raw.get()).map_err(|e| ProviderError::codec(method, e))
    }

    async fn call_envelope<E: Envelope>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<E, ProviderError> {
        let raw = self.raw(method, params).await?;
        E::decode(raw.get()).map_err(|e| ProviderError::codec(method, e))
    }

    // ─── Node info ───────────────────────────────────────────────────────────

    pub async fn spec_version(&self) -> Result<String, ProviderError> {
        self.call_plain("starknet_specVersion", json!([])).await
    }

    pub async fn chain_id(&self) -> Result<Felt, ProviderError> {
        self.call_plain("starknet_chainId", json!([])).await
    }

    pub async fn block_number(&self) -> Result<u64, ProviderError> {
        self.call_plain("starknet_blockNumber", json!([])).await
    }

    pub async fn block_hash_and_number(&self) -> Result<BlockHashAndNumber, ProviderError> {
        self.call_plain("starknet_blockHashAndNumber", json!([])).await
    }

    // ─── Contract state ──────────────────────────────────────────────────────

    pub async fn class(
        &self,
        block_id: BlockId,
        class_hash: Felt,
    ) -> Result<ClassDefinition, ProviderError> {
        self.call_envelope(
            "starknet_getClass",
            json!({ "block_id": block_id, "class_hash": class_hash }),
        )
        .await
    }

    pub async fn class_at(
        &self,
        block_id: BlockId,
        contract_address: Felt,
    ) -> Result<ClassDefinition, ProviderError> {
        self.call_envelope(
            "starknet_getClassAt",
            json!({ "block_id": block_id, "contract_address": contract_address }),
        )
        .await
    }

    pub async fn class_hash_at(
        &self,
        block_id: BlockId,
        contract_address: Felt,
    ) -> Result<Felt, ProviderError> {
        self.call_plain(
            "starknet_getClassHashAt",
            json!({ "block_id": block_id, "contract_address": contract_address }),
        )
        .await
    }

    pub async fn nonce(&self, block_id: BlockId, contract_address: Felt) -> Result<Felt, ProviderError> {
        self.call_plain(
            "starknet_getNonce",
            json!({ "block_id": block_id, "contract_address": contract_address }),
        )
        .await
    }

    pub async fn storage_at(
        &self,
        contract_address: Felt,
        key: Felt,
        block_id: BlockId,
    ) -> Result<Felt, ProviderError> {
        self.call_plain(
            "starknet_getStorageAt",
            json!({ "contract_address": contract_address, "key": key, "block_id": block_id }),
        )
        .await
    }

    /// Run a read-only call and return its result felts.
    pub async fn call(&self, request: &FunctionCall, block_id: BlockId) -> Result<Vec<Felt>, ProviderError> {
        self.call_plain(
            "starknet_call",
            json!({ "request": request, "block_id": block_id }),
        )
        .await
    }

    // ─── Transactions ────────────────────────────────────────────────────────

    pub async fn transaction_by_hash(
        &self,
        transaction_hash: Felt,
    ) -> Result<TransactionWithHash, ProviderError> {
        self.call_envelope(
            "starknet_getTransactionByHash",
            json!({ "transaction_hash": transaction_hash }),
        )
        .await
    }

    fn broadcast_param(
        method: &str,
        tx: &BroadcastTxn,
        kind: TransactionType,
    ) -> Result<Value, ProviderError> {
        tx.expect_kind(kind).map_err(|e| ProviderError::codec(method, e))?;
        tx.to_value().map_err(|e| ProviderError::codec(method, e))
    }

    pub async fn add_invoke_transaction(
        &self,
        tx: &BroadcastTxn,
    ) -> Result<AddInvokeTransactionResult, ProviderError> {
        const METHOD: &str = "starknet_addInvokeTransaction";
        let tx = Self::broadcast_param(METHOD, tx, TransactionType::Invoke)?;
        self.call_plain(METHOD, json!({ "invoke_transaction": tx })).await
    }

    pub async fn add_declare_transaction(
        &self,
        tx: &BroadcastTxn,
    ) -> Result<AddDeclareTransactionResult, ProviderError> {
        const METHOD: &str = "starknet_addDeclareTransaction";
        let tx = Self::broadcast_param(METHOD, tx, TransactionType::Declare)?;
        self.call_plain(METHOD, json!({ "declare_transaction": tx })).await
    }

    pub async fn add_deploy_account_transaction(
        &self,
        tx: &BroadcastTxn,
    ) -> Result<AddDeployAccountTransactionResult, ProviderError> {
        const METHOD: &str = "starknet_addDeployAccountTransaction";
        let tx = Self::broadcast_param(METHOD, tx, TransactionType::DeployAccount)?;
        self.call_plain(METHOD, json!({ "deploy_account_transaction": tx })).await
    }

    // ─── Fees and simulation ─────────────────────────────────────────────────

    /// One estimate per transaction, in input order.
    pub async fn estimate_fee(
        &self,
        transactions: &[BroadcastTxn],
        simulation_flags: &[SimulationFlag],
        block_id: BlockId,
    ) -> Result<Vec<FeeEstimate>, ProviderError> {
        const METHOD: &str = "starknet_estimateFee";
        let request = encode_aggregate(transactions).map_err(|e| ProviderError::codec(METHOD, e))?;
        let estimates: Vec<FeeEstimate> = self
            .call_plain(
                METHOD,
                json!({
                    "request": request,
                    "simulation_flags": simulation_flags,
                    "block_id": block_id,
                }),
            )
            .await?;
        if estimates.len() != transactions.len() {
            return Err(ProviderError::codec(
                METHOD,
                starkcodec_core::CodecError::TypeMismatch {
                    expected: format!("{} fee estimates", transactions.len()),
                    got: estimates.len().to_string(),
                },
            ));
        }
        Ok(estimates)
    }

    pub async fn estimate_message_fee(
        &self,
        message: &MsgFromL1,
        block_id: BlockId,
    ) -> Result<FeeEstimate, ProviderError> {
        self.call_plain(
            "starknet_estimateMessageFee",
            json!({ "message": message, "block_id": block_id }),
        )
        .await
    }

    /// Simulate `input` and check that the node answered with one result per
    /// transaction, of the same kind and in the same order.
    pub async fn simulate_transactions(
        &self,
        input: &SimulateTransactionInput,
    ) -> Result<SimulateTransactionOutput, ProviderError> {
        const METHOD: &str = "starknet_simulateTransactions";
        let params = input.to_value().map_err(|e| ProviderError::codec(METHOD, e))?;
        let raw = self.raw(METHOD, params).await?;
        let output = SimulateTransactionOutput::decode(raw.get())
            .and_then(|output| output.check_alignment(input).map(|()| output))
            .map_err(|e| ProviderError::codec(METHOD, e))?;
        Ok(output)
    }

    // ─── Traces ──────────────────────────────────────────────────────────────

    pub async fn trace_transaction(&self, transaction_hash: Felt) -> Result<TxnTrace, ProviderError> {
        self.call_envelope(
            "starknet_traceTransaction",
            json!({ "transaction_hash": transaction_hash }),
        )
        .await
    }

    /// Traces of every transaction in a block, in block order.
    pub async fn trace_block_transactions(
        &self,
        block_id: BlockId,
    ) -> Result<Vec<TransactionTrace>, ProviderError> {
        const METHOD: &str = "starknet_traceBlockTransactions";
        let raw = self.raw(METHOD, json!({ "block_id": block_id })).await?;
        let traces = self
            .aggregate
            .decode::<TransactionTrace>(raw.get())
            .map_err(|e| ProviderError::codec(METHOD, e))?;
        info!(method = METHOD, traces = traces.len(), "decoded block traces");
        Ok(traces)
    }
}
