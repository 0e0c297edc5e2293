//! Golden fixture integration tests for traces and simulation results.

use serde_json::Value;
use starkcodec_batch::decode_aggregate;
use starkcodec_core::{Envelope, Felt, TransactionType};
use starkcodec_trace::{
    collect_ordered_events, collect_ordered_messages, PriceUnit, SimulateTransactionOutput,
    TransactionTrace, TxnTrace,
};

// ─── Helpers ──────────────────────────────────────────────────────────────────

/// The fixtures live two levels above the crate root.
fn fixture_path(name: &str) -> std::path::PathBuf {
    let mut p = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    p.push("../../fixtures/starknet");
    p.push(name);
    p
}

fn load(name: &str) -> (String, Value) {
    let text = std::fs::read_to_string(fixture_path(name)).expect("fixture not found");
    let fixture: Value = serde_json::from_str(&text).expect("fixture is not JSON");
    (fixture["input"].to_string(), fixture["expected"].clone())
}

fn kind_name(kind: TransactionType) -> &'static str {
    kind.as_str()
}

// ─── Invoke trace ─────────────────────────────────────────────────────────────

#[test]
fn invoke_trace_golden() {
    let (raw, expected) = load("invoke-trace.json");
    let trace = TxnTrace::decode(&raw).unwrap();

    assert_eq!(kind_name(trace.kind()), expected["kind"]);
    let roots = trace.root_invocations();
    assert_eq!(roots.len() as u64, expected["roots"].as_u64().unwrap());

    let TxnTrace::Invoke(invoke) = &trace else {
        panic!("expected an invoke trace");
    };
    let execute = invoke.execute_invocation.invocation().expect("not reverted");
    assert_eq!(execute.calls.len() as u64, expected["execute_calls"].as_u64().unwrap());
    assert_eq!(execute.node_count() as u64, expected["execute_node_count"].as_u64().unwrap());

    let total: usize = roots.iter().map(|root| root.node_count()).sum();
    assert_eq!(total as u64, expected["total_node_count"].as_u64().unwrap());

    let event_orders: Vec<u64> = roots
        .iter()
        .flat_map(|root| collect_ordered_events(root))
        .map(|event| event.order)
        .collect();
    let expected_events: Vec<u64> = serde_json::from_value(expected["event_orders"].clone()).unwrap();
    assert_eq!(event_orders, expected_events);

    let message_orders: Vec<u64> = collect_ordered_messages(execute).iter().map(|m| m.order).collect();
    let expected_messages: Vec<u64> = serde_json::from_value(expected["message_orders"].clone()).unwrap();
    assert_eq!(message_orders, expected_messages);

    let nonce: Felt = expected["nonce"].as_str().unwrap().parse().unwrap();
    assert_eq!(trace.state_diff().unwrap().nonces[0].nonce, nonce);

    assert_eq!(trace.to_value().unwrap(), serde_json::from_str::<Value>(&raw).unwrap());
}

// ─── Simulation ───────────────────────────────────────────────────────────────

#[test]
fn simulate_output_golden() {
    let (raw, expected) = load("simulate-output.json");
    let output = SimulateTransactionOutput::decode(&raw).unwrap();

    let kinds: Vec<&str> = output.iter().map(|s| kind_name(s.transaction_trace.kind())).collect();
    let expected_kinds: Vec<String> = serde_json::from_value(expected["kinds"].clone()).unwrap();
    assert_eq!(kinds, expected_kinds);

    let reverted: Vec<bool> = output
        .iter()
        .map(|s| match &s.transaction_trace {
            TxnTrace::Invoke(invoke) => invoke.execute_invocation.is_reverted(),
            _ => false,
        })
        .collect();
    let expected_reverted: Vec<bool> = serde_json::from_value(expected["reverted"].clone()).unwrap();
    assert_eq!(reverted, expected_reverted);

    let units: Vec<PriceUnit> = output.iter().map(|s| s.fee_estimation.unit).collect();
    let expected_units: Vec<PriceUnit> = serde_json::from_value(expected["units"].clone()).unwrap();
    assert_eq!(units, expected_units);

    let encoded = serde_json::to_value(&output).unwrap();
    assert_eq!(encoded, serde_json::from_str::<Value>(&raw).unwrap());
}

// ─── Block traces ─────────────────────────────────────────────────────────────

#[test]
fn block_traces_golden() {
    let (raw, expected) = load("block-traces.json");
    let traces: Vec<TransactionTrace> = decode_aggregate(&raw).unwrap();

    let hashes: Vec<String> = traces.iter().map(|t| t.transaction_hash.to_string()).collect();
    let expected_hashes: Vec<String> = serde_json::from_value(expected["hashes"].clone()).unwrap();
    assert_eq!(hashes, expected_hashes);

    let kinds: Vec<&str> = traces.iter().map(|t| kind_name(t.trace_root.kind())).collect();
    let expected_kinds: Vec<String> = serde_json::from_value(expected["kinds"].clone()).unwrap();
    assert_eq!(kinds, expected_kinds);
}
