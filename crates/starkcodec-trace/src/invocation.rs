//! Function invocation trees.
//!
//! A trace reports every call as a node whose `calls` member holds its
//! nested calls, to arbitrary depth. The decoder walks the text once, left
//! to right, keeping open nodes on an explicit stack: a node's own members
//! are deserialized as they are reached and `calls` arrays are descended
//! into in place. Native stack use and serde_json's recursion limit are
//! independent of call depth, and each input byte is read a bounded number
//! of times.
//!
//! `Clone`, `PartialEq`, `Serialize` and `Drop` are iterative as well.
//! `Serialize` writes the tree as raw JSON text and so targets serde_json.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::value::RawValue;
use tracing::debug;

use starkcodec_core::{CodecError, Felt};

use crate::side_effect::{OrderedEvent, OrderedMessage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryPointType {
    External,
    L1Handler,
    Constructor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CallType {
    LibraryCall,
    Call,
    Delegate,
}

/// Resources consumed by a single call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputationResources {
    pub steps: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_holes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range_check_builtin_applications: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pedersen_builtin_applications: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poseidon_builtin_applications: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ec_op_builtin_applications: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ecdsa_builtin_applications: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bitwise_builtin_applications: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keccak_builtin_applications: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment_arena_builtin: Option<u64>,
}

/// One node of an invocation tree.
pub struct FunctionInvocation {
    pub contract_address: Felt,
    pub entry_point_selector: Felt,
    pub calldata: Vec<Felt>,
    /// Zero for the root invocation.
    pub caller_address: Felt,
    pub class_hash: Felt,
    pub entry_point_type: EntryPointType,
    pub call_type: CallType,
    pub result: Vec<Felt>,
    /// Nested calls, in execution order.
    pub calls: Vec<FunctionInvocation>,
    pub events: Vec<OrderedEvent>,
    pub messages: Vec<OrderedMessage>,
    pub execution_resources: ComputationResources,
}

/// A node's members other than `calls`, in wire order.
#[derive(PartialEq, Serialize)]
struct FrameRef<'a> {
    contract_address: &'a Felt,
    entry_point_selector: &'a Felt,
    calldata: &'a [Felt],
    caller_address: &'a Felt,
    class_hash: &'a Felt,
    entry_point_type: EntryPointType,
    call_type: CallType,
    result: &'a [Felt],
    events: &'a [OrderedEvent],
    messages: &'a [OrderedMessage],
    execution_resources: &'a ComputationResources,
}

impl FunctionInvocation {
    /// Pre-order traversal of the tree rooted here.
    pub fn iter(&self) -> Iter<'_> {
        Iter { stack: vec![self] }
    }

    /// Number of nodes in the tree, this one included.
    pub fn node_count(&self) -> usize {
        self.iter().count()
    }

    /// Length of the longest root-to-leaf path; a leaf has depth 1.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self, 1usize)];
        while let Some((node, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            stack.extend(node.calls.iter().map(|child| (child, depth + 1)));
        }
        deepest
    }

    pub fn is_leaf(&self) -> bool {
        self.calls.is_empty()
    }

    /// Canonical JSON text of the tree, written without recursion.
    pub fn to_json(&self) -> Result<String, CodecError> {
        let mut out = String::new();
        open_node(&mut out, self)?;
        let mut stack = vec![self.calls.iter()];

        loop {
            let next = match stack.last_mut() {
                Some(children) => children.next(),
                None => break,
            };
            match next {
                Some(child) => {
                    if !out.ends_with('[') {
                        out.push(',');
                    }
                    open_node(&mut out, child)?;
                    stack.push(child.calls.iter());
                }
                None => {
                    out.push_str("]}");
                    stack.pop();
                }
            }
        }
        Ok(out)
    }

    fn frame(&self) -> FrameRef<'_> {
        FrameRef {
            contract_address: &self.contract_address,
            entry_point_selector: &self.entry_point_selector,
            calldata: &self.calldata,
            caller_address: &self.caller_address,
            class_hash: &self.class_hash,
            entry_point_type: self.entry_point_type,
            call_type: self.call_type,
            result: &self.result,
            events: &self.events,
            messages: &self.messages,
            execution_resources: &self.execution_resources,
        }
    }

    /// A copy of this node with no children yet.
    fn detached(&self) -> Self {
        Self {
            contract_address: self.contract_address,
            entry_point_selector: self.entry_point_selector,
            calldata: self.calldata.clone(),
            caller_address: self.caller_address,
            class_hash: self.class_hash,
            entry_point_type: self.entry_point_type,
            call_type: self.call_type,
            result: self.result.clone(),
            calls: Vec::with_capacity(self.calls.len()),
            events: self.events.clone(),
            messages: self.messages.clone(),
            execution_resources: self.execution_resources.clone(),
        }
    }
}

/// Write `node`'s own members and open its `calls` array.
fn open_node(out: &mut String, node: &FunctionInvocation) -> Result<(), CodecError> {
    let frame = serde_json::to_string(&node.frame())?;
    out.push_str(frame.strip_suffix('}').unwrap_or(&frame));
    out.push_str(r#","calls":["#);
    Ok(())
}

impl Drop for FunctionInvocation {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.calls);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.calls);
        }
    }
}

impl Clone for FunctionInvocation {
    fn clone(&self) -> Self {
        let mut current = (self.detached(), self.calls.iter());
        let mut parents = Vec::new();

        loop {
            if let Some(child) = current.1.next() {
                let opened = (child.detached(), child.calls.iter());
                parents.push(std::mem::replace(&mut current, opened));
                continue;
            }
            let (node, _) = current;
            match parents.pop() {
                Some(mut parent) => {
                    parent.0.calls.push(node);
                    current = parent;
                }
                None => return node,
            }
        }
    }
}

impl PartialEq for FunctionInvocation {
    fn eq(&self, other: &Self) -> bool {
        let mut pending = vec![(self, other)];
        while let Some((a, b)) = pending.pop() {
            if a.calls.len() != b.calls.len() || a.frame() != b.frame() {
                return false;
            }
            pending.extend(a.calls.iter().zip(&b.calls));
        }
        true
    }
}

impl Eq for FunctionInvocation {}

impl fmt::Debug for FunctionInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionInvocation")
            .field("contract_address", &self.contract_address)
            .field("entry_point_selector", &self.entry_point_selector)
            .field("entry_point_type", &self.entry_point_type)
            .field("call_type", &self.call_type)
            .field("calldata", &self.calldata)
            .field("result", &self.result)
            .field("nested_calls", &self.calls.len())
            .field("nodes", &self.node_count())
            .finish_non_exhaustive()
    }
}

impl Serialize for FunctionInvocation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::Error;

        let text = self.to_json().map_err(S::Error::custom)?;
        RawValue::from_string(text)
            .map_err(S::Error::custom)?
            .serialize(serializer)
    }
}

/// Pre-order iterator over an invocation tree.
pub struct Iter<'a> {
    stack: Vec<&'a FunctionInvocation>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a FunctionInvocation;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.calls.iter().rev());
        Some(node)
    }
}

// ─── Decoding ────────────────────────────────────────────────────────────────

/// Position in the raw text of a tree.
struct Cursor<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    /// The next significant byte, without consuming it.
    fn peek(&mut self) -> Option<u8> {
        let bytes = self.text.as_bytes();
        while let Some(b' ' | b'\n' | b'\t' | b'\r') = bytes.get(self.pos) {
            self.pos += 1;
        }
        bytes.get(self.pos).copied()
    }

    fn eat(&mut self, byte: u8) -> bool {
        let found = self.peek() == Some(byte);
        if found {
            self.pos += 1;
        }
        found
    }

    /// Deserialize the single JSON value starting here and step past it.
    fn value<T: Deserialize<'a>>(&mut self) -> Result<T, serde_json::Error> {
        let text = self.text;
        let mut stream = serde_json::Deserializer::from_str(&text[self.pos..]).into_iter::<T>();
        match stream.next() {
            Some(value) => {
                let value = value?;
                self.pos += stream.byte_offset();
                Ok(value)
            }
            None => Err(serde::de::Error::custom("unexpected end of input")),
        }
    }
}

/// Where the parser stands inside an open node.
#[derive(Clone, Copy, PartialEq, Eq)]
enum State {
    /// Just past `{`.
    Start,
    /// Expecting a member name.
    Member,
    /// Past a member value; expecting `,` or `}`.
    AfterMember,
    /// Inside `calls`, at the start of the next child.
    Child,
}

enum Step {
    Child,
    Closed,
}

/// A node whose closing brace has not been reached yet.
struct Open {
    path: String,
    state: State,
    seen_calls: bool,
    next_index: usize,
    calls: Vec<FunctionInvocation>,
    contract_address: Option<Felt>,
    entry_point_selector: Option<Felt>,
    calldata: Option<Vec<Felt>>,
    caller_address: Option<Felt>,
    class_hash: Option<Felt>,
    entry_point_type: Option<EntryPointType>,
    call_type: Option<CallType>,
    result: Option<Vec<Felt>>,
    events: Option<Vec<OrderedEvent>>,
    messages: Option<Vec<OrderedMessage>>,
    execution_resources: Option<ComputationResources>,
}

impl Open {
    fn begin(cursor: &mut Cursor<'_>, path: String) -> Result<Self, CodecError> {
        if !cursor.eat(b'{') {
            return Err(CodecError::malformed(
                location(&path, "."),
                "expected an invocation object",
            ));
        }
        Ok(Self {
            path,
            state: State::Start,
            seen_calls: false,
            next_index: 0,
            calls: Vec::new(),
            contract_address: None,
            entry_point_selector: None,
            calldata: None,
            caller_address: None,
            class_hash: None,
            entry_point_type: None,
            call_type: None,
            result: None,
            events: None,
            messages: None,
            execution_resources: None,
        })
    }

    fn syntax(&self, reason: impl fmt::Display) -> CodecError {
        CodecError::malformed(location(&self.path, "."), reason)
    }

    /// Consume members until the node closes or a child starts.
    fn advance(&mut self, cursor: &mut Cursor<'_>) -> Result<Step, CodecError> {
        loop {
            match self.state {
                State::Child => return Ok(Step::Child),
                State::Start => {
                    if cursor.eat(b'}') {
                        return Ok(Step::Closed);
                    }
                    self.state = State::Member;
                }
                State::AfterMember => {
                    if cursor.eat(b'}') {
                        return Ok(Step::Closed);
                    }
                    if !cursor.eat(b',') {
                        return Err(self.syntax("expected `,` or `}` after a member"));
                    }
                    self.state = State::Member;
                }
                State::Member => {
                    let name: String = cursor.value().map_err(|err| self.syntax(err))?;
                    if !cursor.eat(b':') {
                        return Err(self.syntax("expected `:` after a member name"));
                    }
                    if name == "calls" {
                        self.open_calls(cursor)?;
                    } else {
                        let raw: &RawValue = cursor.value().map_err(|err| self.syntax(err))?;
                        self.member(&name, raw)?;
                        self.state = State::AfterMember;
                    }
                }
            }
        }
    }

    fn open_calls(&mut self, cursor: &mut Cursor<'_>) -> Result<(), CodecError> {
        if std::mem::replace(&mut self.seen_calls, true) {
            return Err(self.syntax("duplicate field `calls`"));
        }
        self.state = State::AfterMember;
        if cursor.eat(b'[') {
            if !cursor.eat(b']') {
                self.state = State::Child;
            }
            return Ok(());
        }
        let raw: &RawValue = cursor.value().map_err(|err| self.syntax(err))?;
        if raw.get() != "null" {
            return Err(CodecError::malformed(
                location(&self.path, "calls"),
                "expected an array of invocations",
            ));
        }
        Ok(())
    }

    /// After a child closed: another child follows, or the array ends.
    fn after_child(&mut self, cursor: &mut Cursor<'_>) -> Result<(), CodecError> {
        if cursor.eat(b',') {
            self.state = State::Child;
        } else if cursor.eat(b']') {
            self.state = State::AfterMember;
        } else {
            return Err(self.syntax("expected `,` or `]` in `calls`"));
        }
        Ok(())
    }

    fn child_path(&mut self) -> String {
        let path = format!("{}calls[{}].", self.path, self.next_index);
        self.next_index += 1;
        path
    }

    fn member(&mut self, name: &str, raw: &RawValue) -> Result<(), CodecError> {
        let path = self.path.as_str();
        match name {
            "contract_address" => fill(&mut self.contract_address, path, name, raw),
            "entry_point_selector" => fill(&mut self.entry_point_selector, path, name, raw),
            "calldata" => fill(&mut self.calldata, path, name, raw),
            "caller_address" => fill(&mut self.caller_address, path, name, raw),
            "class_hash" => fill(&mut self.class_hash, path, name, raw),
            "entry_point_type" => fill(&mut self.entry_point_type, path, name, raw),
            "call_type" => fill(&mut self.call_type, path, name, raw),
            "result" => fill(&mut self.result, path, name, raw),
            "events" => fill(&mut self.events, path, name, raw),
            "messages" => fill(&mut self.messages, path, name, raw),
            "execution_resources" => fill(&mut self.execution_resources, path, name, raw),
            _ => Ok(()),
        }
    }

    fn finish(self) -> Result<FunctionInvocation, CodecError> {
        let missing = |name: &str| {
            CodecError::malformed(location(&self.path, "."), format!("missing field `{name}`"))
        };
        Ok(FunctionInvocation {
            contract_address: self.contract_address.ok_or_else(|| missing("contract_address"))?,
            entry_point_selector: self
                .entry_point_selector
                .ok_or_else(|| missing("entry_point_selector"))?,
            calldata: self.calldata.ok_or_else(|| missing("calldata"))?,
            caller_address: self.caller_address.ok_or_else(|| missing("caller_address"))?,
            class_hash: self.class_hash.ok_or_else(|| missing("class_hash"))?,
            entry_point_type: self.entry_point_type.ok_or_else(|| missing("entry_point_type"))?,
            call_type: self.call_type.ok_or_else(|| missing("call_type"))?,
            result: self.result.ok_or_else(|| missing("result"))?,
            calls: self.calls,
            events: self.events.ok_or_else(|| missing("events"))?,
            messages: self.messages.ok_or_else(|| missing("messages"))?,
            execution_resources: self
                .execution_resources
                .ok_or_else(|| missing("execution_resources"))?,
        })
    }
}

/// Deserialize one member into its slot, naming the failing path.
fn fill<T: DeserializeOwned>(
    slot: &mut Option<T>,
    path: &str,
    name: &str,
    raw: &RawValue,
) -> Result<(), CodecError> {
    if slot.is_some() {
        return Err(CodecError::malformed(
            location(path, "."),
            format!("duplicate field `{name}`"),
        ));
    }
    let mut de = serde_json::Deserializer::from_str(raw.get());
    let value = serde_path_to_error::deserialize(&mut de).map_err(|err| {
        let inner = err.path().to_string();
        let member = match inner.as_str() {
            "." => name.to_string(),
            index if index.starts_with('[') => format!("{name}{index}"),
            field => format!("{name}.{field}"),
        };
        CodecError::malformed(location(path, &member), err.into_inner())
    })?;
    *slot = Some(value);
    Ok(())
}

/// Join a node's path prefix with a path inside that node.
fn location(prefix: &str, inner: &str) -> String {
    match (prefix.is_empty(), inner) {
        (true, ".") => "<root>".to_string(),
        (true, _) => inner.to_string(),
        (false, ".") => prefix.trim_end_matches('.').to_string(),
        (false, _) => format!("{prefix}{inner}"),
    }
}

/// Decode an invocation tree of any depth.
///
/// Children keep their input order; an absent, null or empty `calls` member
/// makes a leaf. Every other member is required. A malformed node anywhere
/// in the tree fails the whole decode with `MalformedField`, naming the node
/// by its path, e.g. `calls[2].calls[0].calldata[1]`.
pub fn decode_invocation(raw: &str) -> Result<FunctionInvocation, CodecError> {
    let mut cursor = Cursor { text: raw, pos: 0 };
    let mut current = Open::begin(&mut cursor, String::new())?;
    let mut parents: Vec<Open> = Vec::new();
    let mut nodes = 1usize;
    let mut max_depth = 1usize;

    loop {
        match current.advance(&mut cursor)? {
            Step::Child => {
                let path = current.child_path();
                let child = Open::begin(&mut cursor, path)?;
                parents.push(std::mem::replace(&mut current, child));
                nodes += 1;
                max_depth = max_depth.max(parents.len() + 1);
            }
            Step::Closed => {
                let node = current.finish()?;
                match parents.pop() {
                    Some(mut parent) => {
                        parent.calls.push(node);
                        parent.after_child(&mut cursor)?;
                        current = parent;
                    }
                    None => {
                        if cursor.peek().is_some() {
                            return Err(CodecError::malformed("<root>", "trailing characters"));
                        }
                        debug!(nodes, depth = max_depth, "decoded invocation tree");
                        return Ok(node);
                    }
                }
            }
        }
    }
}

impl<'de> Deserialize<'de> for FunctionInvocation {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error;

        let raw = Box::<RawValue>::deserialize(deserializer)?;
        decode_invocation(raw.get()).map_err(D::Error::custom)
    }
}
