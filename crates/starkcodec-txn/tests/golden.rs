//! Golden fixture integration tests.
//!
//! Each test loads a recorded payload from `fixtures/starknet/`, decodes it
//! through the envelope family named in the fixture, checks the decoded
//! values against the `expected` section and re-encodes it.

use serde_json::Value;
use starkcodec_core::{Envelope, Felt, Keyed};
use starkcodec_txn::{BroadcastTxn, ClassDefinition, Transaction};

// ─── Helpers ──────────────────────────────────────────────────────────────────

/// The fixtures live two levels above the crate root.
fn fixture_path(name: &str) -> std::path::PathBuf {
    let mut p = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    p.push("../../fixtures/starknet");
    p.push(name);
    p
}

/// Returns `(raw input text, expected section)`.
fn load(name: &str) -> (String, Value) {
    let text = std::fs::read_to_string(fixture_path(name)).expect("fixture not found");
    let fixture: Value = serde_json::from_str(&text).expect("fixture is not JSON");
    (fixture["input"].to_string(), fixture["expected"].clone())
}

fn felt(v: &Value) -> Felt {
    v.as_str().unwrap().parse().unwrap()
}

// ─── Transactions ─────────────────────────────────────────────────────────────

#[test]
fn invoke_v1_golden() {
    let (raw, expected) = load("invoke-v1.json");
    let tx = Transaction::decode(&raw).unwrap();

    assert_eq!(tx.key().to_string(), expected["discriminator"].as_str().unwrap());
    assert_eq!(tx.sender_address(), Some(felt(&expected["sender_address"])));
    assert_eq!(tx.nonce(), Some(felt(&expected["nonce"])));
    let Transaction::InvokeV1(invoke) = &tx else {
        panic!("expected INVOKE v1, got {tx:?}");
    };
    let calldata: Vec<Felt> = expected["calldata"].as_array().unwrap().iter().map(felt).collect();
    assert_eq!(invoke.calldata, calldata);

    // Canonical input re-encodes byte-for-byte equal as a JSON value.
    let original: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(tx.to_value().unwrap(), original);
}

#[test]
fn invoke_v3_query_version_golden() {
    let (raw, expected) = load("invoke-v3-query.json");
    let tx = Transaction::decode(&raw).unwrap();

    assert_eq!(tx.key().to_string(), expected["discriminator"].as_str().unwrap());
    assert_eq!(tx.to_value().unwrap(), expected["canonical"]);

    let again = Transaction::decode_slice(&tx.encode().unwrap()).unwrap();
    assert_eq!(again, tx);
}

#[test]
fn invoke_v0_broadcast_golden() {
    let (raw, expected) = load("invoke-v0-mainnet.json");
    let tx = BroadcastTxn::decode(&raw).unwrap();

    assert_eq!(tx.key().to_string(), expected["discriminator"].as_str().unwrap());
    let BroadcastTxn::InvokeV0(invoke) = &tx else {
        panic!("expected INVOKE v0, got {tx:?}");
    };
    assert_eq!(invoke.calldata.len() as u64, expected["calldata_len"].as_u64().unwrap());
    assert_eq!(tx.to_value().unwrap(), serde_json::from_str::<Value>(&raw).unwrap());
}

#[test]
fn deploy_account_v1_golden() {
    let (raw, expected) = load("deploy-account-v1.json");
    let tx = BroadcastTxn::decode(&raw).unwrap();

    assert_eq!(tx.key().to_string(), expected["discriminator"].as_str().unwrap());
    let BroadcastTxn::DeployAccountV1(deploy) = &tx else {
        panic!("expected DEPLOY_ACCOUNT v1, got {tx:?}");
    };
    assert_eq!(deploy.class_hash, felt(&expected["class_hash"]));
    assert_eq!(deploy.constructor_calldata.len(), 5);

    // The same body decodes in the on-chain family too.
    let on_chain = Transaction::decode(&raw).unwrap();
    assert_eq!(on_chain.key(), tx.key());
}

#[test]
fn declare_v2_broadcast_golden() {
    let (raw, expected) = load("declare-v2-broadcast.json");
    let tx = BroadcastTxn::decode(&raw).unwrap();

    assert_eq!(tx.key().to_string(), expected["discriminator"].as_str().unwrap());
    let BroadcastTxn::DeclareV2(declare) = &tx else {
        panic!("expected DECLARE v2, got {tx:?}");
    };
    let class = &declare.contract_class;
    assert_eq!(
        class.sierra_program.len() as u64,
        expected["sierra_program_len"].as_u64().unwrap()
    );
    assert_eq!(
        class.entry_points_by_type.external.len() as u64,
        expected["external_entry_points"].as_u64().unwrap()
    );

    let encoded = tx.to_value().unwrap();
    assert!(encoded.get("transaction_hash").is_none());
    assert_eq!(encoded, serde_json::from_str::<Value>(&raw).unwrap());
}

// ─── Contract classes ─────────────────────────────────────────────────────────

#[test]
fn deprecated_class_golden() {
    let (raw, expected) = load("deprecated-class.json");
    let class = ClassDefinition::decode(&raw).unwrap();

    assert_eq!(expected["shape"], "deprecated");
    let deprecated = class.as_deprecated().expect("deprecated shape");
    assert_eq!(
        deprecated.entry_points_by_type.external.len() as u64,
        expected["external_entry_points"].as_u64().unwrap()
    );
    assert_eq!(
        deprecated.entry_points_by_type.constructor[0].offset,
        felt(&expected["constructor_offset"])
    );
    assert_eq!(class.to_value().unwrap(), serde_json::from_str::<Value>(&raw).unwrap());
}

#[test]
fn sierra_class_golden() {
    let (raw, expected) = load("sierra-class.json");
    let class = ClassDefinition::decode(&raw).unwrap();

    assert_eq!(expected["shape"], "sierra");
    let sierra = class.as_sierra().expect("sierra shape");
    assert_eq!(
        sierra.sierra_program.len() as u64,
        expected["sierra_program_len"].as_u64().unwrap()
    );
    assert_eq!(sierra.contract_class_version, expected["contract_class_version"]);
    assert_eq!(ClassDefinition::decode_slice(&class.encode().unwrap()).unwrap(), class);
}
