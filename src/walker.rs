// SPDX-License-Identifier: Apache-2.0

#![warn(missing_docs)]

//! Template walker (§4.E): recursively render a template tree under an
//! evaluation environment, handling dynamic map keys and omit-sentinel
//! propagation out of mapping entries. Sequence-level omission is left
//! to the post-walk pruner (§4.H step 5) — see `spec.md` §9's open
//! question on sequence-omit policy.

use crate::engine::Engine;
use crate::error::RenderError;
use crate::node::Node;
use crate::scanner;
use indexmap::IndexMap;

/// Render `node` (one node of a template tree) under `env`.
pub fn render(engine: &Engine, node: &Node, env: &IndexMap<String, Node>) -> Result<Node, RenderError> {
    match node {
        Node::String(s) => engine.render_string(s, env),
        Node::Mapping(m) => render_mapping(engine, m, env),
        Node::Sequence(items) | Node::FlowSequence(items) => {
            let mut rendered = Vec::with_capacity(items.len());
            for item in items {
                rendered.push(render(engine, item, env)?);
            }
            Ok(Node::Sequence(rendered))
        }
        // Other scalars, and the (only ever transient) Omit variant,
        // return unchanged.
        other => Ok(other.clone()),
    }
}

fn render_mapping(
    engine: &Engine,
    map: &IndexMap<String, Node>,
    env: &IndexMap<String, Node>,
) -> Result<Node, RenderError> {
    let mut out = IndexMap::with_capacity(map.len());
    for (key, value) in map {
        let rendered_key = if scanner::scan(key).is_empty() {
            key.clone()
        } else {
            let evaluated = engine.render_string(key, env)?;
            match evaluated {
                Node::String(s) => s,
                other => {
                    return Err(RenderError::KeyType {
                        key: key.clone(),
                        actual_type: other.type_name().to_string(),
                    });
                }
            }
        };

        let rendered_value = render(engine, value, env)?;
        if rendered_value.is_omit() {
            continue;
        }
        out.insert(rendered_key, rendered_value);
    }
    Ok(Node::Mapping(out))
}
