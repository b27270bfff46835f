// SPDX-License-Identifier: Apache-2.0

#![warn(missing_docs)]

//! Thin adapter over the `cel-interpreter` expression backend (§9: "the
//! reference design embeds a general-purpose, typed expression language
//! with pluggable functions, macros, and extensions..."). All direct use
//! of the third-party crate's types lives in this module and in
//! [`crate::helpers`], so the rest of the crate only ever sees
//! [`Node`][crate::node::Node] and [`crate::error::RenderError`].

use crate::node::Node;
use cel_interpreter::objects::{Key, Map as CelMap};
use cel_interpreter::{Context, Program, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// A compiled environment: a `cel-interpreter` [`Context`] with every
/// built-in function registered (§4.C — the shape-keyed, reusable,
/// expensive-to-build artifact). Holds no render-specific variables.
pub type CelContext = Context<'static>;

/// A compiled program for one expression text (§4.C).
pub type CelProgram = Program;

/// Backend-native evaluated value.
pub type CelValue = Value;

/// Unique, process-wide marker embedded in the deliberate error raised by
/// the `omit()` built-in (§4.B, §9). Only [`crate::engine`] interprets
/// this marker; it can never be produced by ordinary expression text.
pub fn omit_marker() -> &'static str {
    use std::sync::OnceLock;
    static MARKER: OnceLock<String> = OnceLock::new();
    MARKER.get_or_init(|| {
        let token: u64 = rand::random();
        format!("__omit_sentinel_marker_{token:016x}__")
    })
}

/// Compile `expr` against the backend, surfacing a plain `String` message
/// on failure (the caller wraps it in [`crate::error::RenderError::Compilation`]).
pub fn compile(expr: &str) -> Result<CelProgram, String> {
    Program::compile(expr).map_err(|e| e.to_string())
}

/// Execute `program` under `ctx`, surfacing a plain `String` message on
/// failure. The `omit()` marker is intercepted here and turned into
/// `Ok(Node::Omit)` rather than propagated as an error.
pub fn execute(program: &CelProgram, ctx: &CelContext) -> Result<Node, String> {
    match program.execute(ctx) {
        Ok(value) => Ok(value_to_node(&value)),
        Err(err) => {
            let msg = err.to_string();
            if msg.contains(omit_marker()) {
                Ok(Node::Omit)
            } else {
                Err(msg)
            }
        }
    }
}

/// Bind one top-level variable into a context, failing with a plain
/// message on a type-conversion error.
pub fn bind_variable(ctx: &mut CelContext, name: &str, value: &Node) -> Result<(), String> {
    ctx.add_variable(name.to_string(), node_to_value(value))
        .map_err(|e| e.to_string())
}

/// Convert a [`Node`] into a backend-native [`Value`].
pub fn node_to_value(node: &Node) -> Value {
    match node {
        Node::Mapping(m) => {
            let mut inner: HashMap<Key, Value> = HashMap::with_capacity(m.len());
            for (k, v) in m {
                inner.insert(Key::String(Arc::new(k.clone())), node_to_value(v));
            }
            Value::Map(CelMap { map: Arc::new(inner) })
        }
        Node::Sequence(s) | Node::FlowSequence(s) => {
            Value::List(Arc::new(s.iter().map(node_to_value).collect()))
        }
        Node::String(s) => Value::String(Arc::new(s.clone())),
        Node::Int(i) => Value::Int(*i),
        Node::UInt(u) => Value::UInt(*u),
        Node::Float(f) => Value::Float(*f),
        Node::Bool(b) => Value::Bool(*b),
        Node::Null => Value::Null,
        Node::Omit => Value::Null,
    }
}

/// Convert a backend-native [`Value`] into a [`Node`], recursively, per
/// §4.D's result-normalization rules. Unknown/unsupported backend types
/// pass through as `Node::Null`.
pub fn value_to_node(value: &Value) -> Node {
    match value {
        Value::Int(i) => Node::Int(*i),
        Value::UInt(u) => Node::UInt(*u),
        Value::Float(f) => Node::Float(*f),
        Value::String(s) => Node::String(s.as_str().to_string()),
        Value::Bytes(b) => Node::String(String::from_utf8_lossy(b).to_string()),
        Value::Bool(b) => Node::Bool(*b),
        Value::Null => Node::Null,
        Value::List(items) => Node::Sequence(items.iter().map(value_to_node).collect()),
        Value::Map(m) => {
            let mut out = indexmap::IndexMap::with_capacity(m.map.len());
            for (k, v) in m.map.iter() {
                out.insert(key_to_string(k), value_to_node(v));
            }
            Node::Mapping(out)
        }
        _ => Node::Null,
    }
}

fn key_to_string(key: &Key) -> String {
    match key {
        Key::Int(i) => i.to_string(),
        Key::Uint(u) => u.to_string(),
        Key::Bool(b) => b.to_string(),
        Key::String(s) => s.as_str().to_string(),
    }
}
