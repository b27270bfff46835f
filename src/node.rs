// SPDX-License-Identifier: Apache-2.0

#![warn(missing_docs)]

//! The template tree data model (§3).
//!
//! A [`Node`] mirrors the "mapping / sequence / scalar" shape described by
//! the data model, plus two internal variants that exist only transiently
//! during a single [`crate::pipeline::render`] call: [`Node::Omit`] (the
//! omit sentinel, as a tagged variant rather than a reserved value — the
//! alternative the design notes explicitly sanction) and
//! [`Node::FlowSequence`] (the flow-style array wrapper of §4.H step 7).
//! Neither variant may appear in a [`Node`] returned to a caller.

use indexmap::IndexMap;
use std::fmt;

/// One node of a template tree or a rendered resource tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// An ordered mapping from string key to node.
    Mapping(IndexMap<String, Node>),
    /// An ordered sequence of nodes.
    Sequence(Vec<Node>),
    /// A sequence tagged for inline ("flow style") serialization by a
    /// downstream text serializer. Semantically identical to `Sequence`.
    FlowSequence(Vec<Node>),
    /// A UTF-8 string scalar.
    String(String),
    /// A signed 64-bit integer scalar.
    Int(i64),
    /// An unsigned 64-bit integer scalar.
    UInt(u64),
    /// A double-precision floating point scalar.
    Float(f64),
    /// A boolean scalar.
    Bool(bool),
    /// The null scalar.
    Null,
    /// The omit sentinel. Only ever produced by the engine in response to
    /// the `omit()` helper; never present in output handed back to a caller.
    Omit,
}

impl Default for Node {
    /// The null scalar.
    fn default() -> Self {
        Node::Null
    }
}

impl Node {
    /// `true` if this is the omit sentinel.
    pub fn is_omit(&self) -> bool {
        matches!(self, Node::Omit)
    }

    /// Best-effort type name, used in [`crate::error::RenderError::KeyType`]
    /// messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Node::Mapping(_) => "map",
            Node::Sequence(_) | Node::FlowSequence(_) => "list",
            Node::String(_) => "string",
            Node::Int(_) => "int",
            Node::UInt(_) => "uint",
            Node::Float(_) => "double",
            Node::Bool(_) => "bool",
            Node::Null => "null",
            Node::Omit => "omit",
        }
    }

    /// Stringify per §4.D's stringification rules, used when splicing an
    /// interpolated expression's result back into surrounding text, and
    /// when coercing a `"value"` map entry (§4.H step 6) that isn't a list
    /// or a map.
    pub fn stringify(&self) -> String {
        match self {
            Node::String(s) => s.clone(),
            Node::Int(i) => i.to_string(),
            Node::UInt(u) => u.to_string(),
            Node::Float(f) => format_float(*f),
            Node::Bool(b) => b.to_string(),
            Node::Null => "null".to_string(),
            Node::Mapping(_) | Node::Sequence(_) | Node::FlowSequence(_) => self.to_compact_json(),
            Node::Omit => String::new(),
        }
    }

    /// Compact JSON-style serialization, used for structural values in
    /// [`Node::stringify`] and for the `"value"` map-entry coercion of
    /// §4.H step 6.
    pub fn to_compact_json(&self) -> String {
        serde_json::to_string(&self.to_json()).unwrap_or_default()
    }

    /// Convert to a plain `serde_json::Value`. `Omit` nodes convert to
    /// `null` as a defensive fallback — by the pipeline's invariants none
    /// should survive to this call.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Node::Mapping(m) => {
                serde_json::Value::Object(m.iter().map(|(k, v)| (k.clone(), v.to_json())).collect())
            }
            Node::Sequence(s) | Node::FlowSequence(s) => {
                serde_json::Value::Array(s.iter().map(Node::to_json).collect())
            }
            Node::String(s) => serde_json::Value::String(s.clone()),
            Node::Int(i) => serde_json::Value::Number((*i).into()),
            Node::UInt(u) => serde_json::Value::Number((*u).into()),
            Node::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Node::Bool(b) => serde_json::Value::Bool(*b),
            Node::Null | Node::Omit => serde_json::Value::Null,
        }
    }
}

/// Shortest round-trip decimal formatting for a float, per §4.D.
pub(crate) fn format_float(f: f64) -> String {
    if f == f.trunc() && f.is_finite() && f.abs() < 1e15 {
        format!("{f:.1}")
    } else {
        let mut buf = ryu_like(f);
        if !buf.contains('.') && !buf.contains('e') && !buf.contains("inf") && !buf.contains("NaN")
        {
            buf.push_str(".0");
        }
        buf
    }
}

// `ryu` is the usual idiomatic choice for shortest round-trip float
// formatting; this crate keeps its dependency footprint to what the
// expression backend and context builder genuinely need, so this falls
// back to the standard library's own (already shortest round-trip since
// Rust 1.x) `Display` impl for `f64`.
fn ryu_like(f: f64) -> String {
    format!("{f}")
}

impl From<&serde_json::Value> for Node {
    fn from(v: &serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Node::Null,
            serde_json::Value::Bool(b) => Node::Bool(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Node::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Node::UInt(u)
                } else {
                    Node::Float(n.as_f64().unwrap_or(0.0))
                }
            }
            serde_json::Value::String(s) => Node::String(s.clone()),
            serde_json::Value::Array(a) => Node::Sequence(a.iter().map(Node::from).collect()),
            serde_json::Value::Object(m) => {
                Node::Mapping(m.iter().map(|(k, v)| (k.clone(), Node::from(v))).collect())
            }
        }
    }
}

impl From<serde_json::Value> for Node {
    fn from(v: serde_json::Value) -> Self {
        Node::from(&v)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.stringify())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_json() {
        let v = serde_json::json!({"a": 1, "b": [true, null, "x"]});
        let node = Node::from(&v);
        assert_eq!(node.to_json(), v);
    }

    #[test]
    fn stringifies_structural_values_as_compact_json() {
        let node = Node::Mapping(IndexMap::from([("k".to_string(), Node::Int(2))]));
        assert_eq!(node.stringify(), r#"{"k":2}"#);
    }

    #[test]
    fn stringifies_integer_as_plain_decimal() {
        assert_eq!(Node::Int(2).stringify(), "2");
    }
}
