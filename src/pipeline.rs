// SPDX-License-Identifier: Apache-2.0

#![warn(missing_docs)]

//! Rendering pipeline (§4.H): the public entry point orchestrating
//! validation, context building, template walking, omission pruning,
//! value coercion and output validation.

use crate::context_builder::{self, ContextVars, Definition, OwnerDescriptor, TypeDefinition};
use crate::engine::Engine;
use crate::error::RenderError;
use crate::node::Node;
use crate::walker;
use indexmap::IndexMap;
use tracing::{info, warn};

/// Input to a single [`render`] call (§6).
pub struct RenderInput {
    /// Developer-supplied parameters for this component instance.
    pub owner: OwnerDescriptor,
    /// The definition to render: schema, fixed parameters, template.
    pub definition: Definition,
    /// An optional type definition supplying fixed-parameter overrides.
    pub type_definition: Option<TypeDefinition>,
    /// Context variables identifying this render call. `timestamp` and
    /// `uuid` are filled in by the pipeline and need not be set here.
    pub context: ContextVars,
}

/// Output of a successful [`render`] call.
pub struct RenderOutput {
    /// The fully-resolved resource tree.
    pub resolved: Node,
    /// Non-fatal warnings accumulated during the render.
    pub warnings: Vec<String>,
}

/// Render `input.definition.template` under the evaluation environment
/// assembled by the Context Builder, per the nine-step state machine of
/// §4.H.
pub fn render(engine: &Engine, input: RenderInput) -> Result<RenderOutput, RenderError> {
    validate_input(&input)?;

    let timestamp = now_unix();
    let uuid = random_hex(4)?;

    let env = context_builder::build(
        &input.owner,
        &input.definition,
        input.type_definition.as_ref(),
        &input.context,
        timestamp,
        &uuid,
    );

    info!(uuid, timestamp, "rendering template");
    let walked = walker::render(engine, &input.definition.template, &env)?;

    let pruned = prune_omitted(walked);
    let coerced = coerce_value_slots(pruned);
    let unwrapped = unwrap_flow_sequences(coerced);

    let mut warnings = Vec::new();
    validate_output(&unwrapped, &mut warnings)?;

    Ok(RenderOutput {
        resolved: unwrapped,
        warnings,
    })
}

fn validate_input(input: &RenderInput) -> Result<(), RenderError> {
    if matches!(input.definition.template, Node::Null) {
        return Err(RenderError::InputInvalid("template must not be nil".to_string()));
    }
    if input.context.org_name.is_empty() {
        return Err(RenderError::InputInvalid("org name must not be empty".to_string()));
    }
    if input.context.project_name.is_empty() {
        return Err(RenderError::InputInvalid(
            "project name must not be empty".to_string(),
        ));
    }
    if input.context.component_name.is_empty() {
        return Err(RenderError::InputInvalid(
            "component name must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn now_unix() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Generate `bytes` bytes of cryptographically strong randomness and
/// hex-encode them, for the auto-filled `ctx.uuid` variable.
fn random_hex(bytes: usize) -> Result<String, RenderError> {
    if bytes == 0 {
        return Err(RenderError::UuidGeneration(
            "requested zero random bytes".to_string(),
        ));
    }
    let buf: Vec<u8> = (0..bytes).map(|_| rand::random::<u8>()).collect();
    Ok(hex::encode(buf))
}

/// Recursively remove the omit sentinel: inside mappings, drop the
/// entry; inside sequences, drop the element (§4.H step 5).
pub fn prune_omitted(node: Node) -> Node {
    match node {
        Node::Mapping(m) => Node::Mapping(
            m.into_iter()
                .filter(|(_, v)| !v.is_omit())
                .map(|(k, v)| (k, prune_omitted(v)))
                .collect(),
        ),
        Node::Sequence(items) => Node::Sequence(
            items
                .into_iter()
                .filter(|v| !v.is_omit())
                .map(prune_omitted)
                .collect(),
        ),
        Node::FlowSequence(items) => Node::FlowSequence(
            items
                .into_iter()
                .filter(|v| !v.is_omit())
                .map(prune_omitted)
                .collect(),
        ),
        other => other,
    }
}

/// At any mapping entry keyed `"value"`, coerce a list to a flow-style
/// wrapper, a map to its compact JSON string, and pass scalars through
/// (§4.H step 6). Recurses into every other entry unchanged.
pub fn coerce_value_slots(node: Node) -> Node {
    match node {
        Node::Mapping(m) => Node::Mapping(
            m.into_iter()
                .map(|(k, v)| {
                    let v = if k == "value" {
                        coerce_one_value(v)
                    } else {
                        coerce_value_slots(v)
                    };
                    (k, v)
                })
                .collect(),
        ),
        Node::Sequence(items) => Node::Sequence(items.into_iter().map(coerce_value_slots).collect()),
        Node::FlowSequence(items) => {
            Node::FlowSequence(items.into_iter().map(coerce_value_slots).collect())
        }
        other => other,
    }
}

fn coerce_one_value(node: Node) -> Node {
    match node {
        Node::Sequence(items) => Node::FlowSequence(items.into_iter().map(coerce_value_slots).collect()),
        Node::Mapping(_) => Node::String(node.to_compact_json()),
        Node::Int(_) | Node::UInt(_) | Node::Float(_) | Node::Bool(_) | Node::String(_) | Node::Null => {
            node
        }
        other => Node::String(other.stringify()),
    }
}

/// Recursively convert flow-style-array wrappers back to plain
/// sequences (§4.H step 7).
pub fn unwrap_flow_sequences(node: Node) -> Node {
    match node {
        Node::Mapping(m) => Node::Mapping(
            m.into_iter()
                .map(|(k, v)| (k, unwrap_flow_sequences(v)))
                .collect(),
        ),
        Node::Sequence(items) | Node::FlowSequence(items) => {
            Node::Sequence(items.into_iter().map(unwrap_flow_sequences).collect())
        }
        other => other,
    }
}

fn validate_output(node: &Node, warnings: &mut Vec<String>) -> Result<(), RenderError> {
    let Node::Mapping(root) = node else {
        return Err(RenderError::OutputInvalid("root must be a mapping".to_string()));
    };

    let non_empty_string = |m: &IndexMap<String, Node>, key: &str| -> bool {
        matches!(m.get(key), Some(Node::String(s)) if !s.is_empty())
    };

    if !non_empty_string(root, "apiVersion") {
        return Err(RenderError::OutputInvalid(
            "root.apiVersion must be a non-empty string".to_string(),
        ));
    }
    if !non_empty_string(root, "kind") {
        return Err(RenderError::OutputInvalid(
            "root.kind must be a non-empty string".to_string(),
        ));
    }

    let name_ok = match root.get("metadata") {
        Some(Node::Mapping(metadata)) => non_empty_string(metadata, "name"),
        _ => false,
    };
    if !name_ok {
        return Err(RenderError::OutputInvalid(
            "root.metadata.name must be a non-empty string".to_string(),
        ));
    }

    if root.len() <= 3 {
        warn!("rendered resource carries no fields beyond apiVersion/kind/metadata");
        warnings.push("rendered resource has no spec-level fields".to_string());
    }

    Ok(())
}

/// Remove omit sentinels from a tree assembled outside [`render`] (§6
/// `RemoveOmittedFields`).
pub fn remove_omitted_fields(tree: Node) -> Node {
    prune_omitted(tree)
}
