//! Ordered side effects emitted by an invocation.
//!
//! Events and messages are kept exactly as the node reported them: same
//! sequence, same `order` values, duplicates included.

use serde::{Deserialize, Serialize};
use starkcodec_core::Felt;

use crate::invocation::FunctionInvocation;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderedEvent {
    /// Position of the event within the transaction's execution.
    pub order: u64,
    pub keys: Vec<Felt>,
    pub data: Vec<Felt>,
}

/// A message sent to L1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderedMessage {
    pub order: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_address: Option<Felt>,
    pub to_address: Felt,
    pub payload: Vec<Felt>,
}

/// Every event in the tree, sorted by `order`.
///
/// The sort is stable, so events sharing an `order` keep their pre-order
/// tree position. The tree itself is untouched.
pub fn collect_ordered_events(root: &FunctionInvocation) -> Vec<&OrderedEvent> {
    let mut events: Vec<&OrderedEvent> = root.iter().flat_map(|call| call.events.iter()).collect();
    events.sort_by_key(|event| event.order);
    events
}

/// Every L1 message in the tree, sorted by `order`.
pub fn collect_ordered_messages(root: &FunctionInvocation) -> Vec<&OrderedMessage> {
    let mut messages: Vec<&OrderedMessage> =
        root.iter().flat_map(|call| call.messages.iter()).collect();
    messages.sort_by_key(|message| message.order);
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invocation::decode_invocation;

    fn call(events: &str, calls: &str) -> String {
        format!(
            r#"{{"contract_address":"0x1","entry_point_selector":"0x2","calldata":[],"caller_address":"0x0","class_hash":"0x3","entry_point_type":"EXTERNAL","call_type":"CALL","result":[],"calls":[{calls}],"events":[{events}],"messages":[],"execution_resources":{{"steps":1}}}}"#
        )
    }

    #[test]
    fn events_decode_verbatim() {
        // Out of order and duplicated on purpose.
        let raw = call(
            r#"{"order":2,"keys":["0xa"],"data":[]},{"order":0,"keys":[],"data":["0x1"]},{"order":2,"keys":["0xa"],"data":[]}"#,
            "",
        );
        let root = decode_invocation(&raw).unwrap();
        let orders: Vec<u64> = root.events.iter().map(|e| e.order).collect();
        assert_eq!(orders, [2, 0, 2]);
        assert_eq!(root.events[0], root.events[2]);
    }

    #[test]
    fn messages_keep_optional_sender() {
        let message: OrderedMessage = serde_json::from_str(
            r#"{"order":1,"to_address":"0x7888b7b844b4b16c03f8dacacef7dda0f5188645","payload":["0x0"]}"#,
        )
        .unwrap();
        assert_eq!(message.from_address, None);
        let value = serde_json::to_value(&message).unwrap();
        assert!(value.get("from_address").is_none());
    }

    #[test]
    fn collect_sorts_across_the_tree() {
        let child = call(r#"{"order":1,"keys":[],"data":[]}"#, "");
        let raw = call(
            r#"{"order":3,"keys":[],"data":[]},{"order":0,"keys":[],"data":[]}"#,
            &child,
        );
        let root = decode_invocation(&raw).unwrap();
        let orders: Vec<u64> = collect_ordered_events(&root).iter().map(|e| e.order).collect();
        assert_eq!(orders, [0, 1, 3]);
        // Decoded tree keeps its own order.
        assert_eq!(root.events[0].order, 3);
        assert!(collect_ordered_messages(&root).is_empty());
    }
}
