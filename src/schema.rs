// SPDX-License-Identifier: Apache-2.0

#![warn(missing_docs)]

//! Schema shorthand parser (§4.F): extract typed default values out of
//! `"<type> | default=<lit> | required=<bool> | enum=<list>"` shorthand
//! strings. Uses an ad-hoc `|`-separator splitter and a quote-aware
//! comma splitter for bracketed list literals, per the teacher-agnostic
//! robustness note in `spec.md` §9.

use crate::node::Node;
use indexmap::IndexMap;

/// Recursively extract default values out of a shorthand schema tree.
/// Returns `None` if no leaf (at any depth) carries a `default=` clause.
pub fn extract_defaults(schema: &Node) -> Option<Node> {
    match schema {
        Node::Mapping(fields) => {
            let mut out = IndexMap::new();
            for (key, value) in fields {
                match value {
                    Node::String(shorthand) => {
                        if let Some(default) = parse_shorthand_default(shorthand) {
                            out.insert(key.clone(), default);
                        }
                    }
                    Node::Mapping(_) => {
                        if let Some(nested) = extract_defaults(value) {
                            out.insert(key.clone(), nested);
                        }
                    }
                    _ => {}
                }
            }
            if out.is_empty() {
                None
            } else {
                Some(Node::Mapping(out))
            }
        }
        _ => None,
    }
}

/// Parse one shorthand string's `default=` clause, if present.
fn parse_shorthand_default(shorthand: &str) -> Option<Node> {
    for piece in shorthand.split('|') {
        let piece = piece.trim();
        if let Some(rhs) = piece.strip_prefix("default=") {
            return Some(parse_literal(rhs.trim()));
        }
    }
    None
}

/// Parse one literal: a bracketed list, a quoted string, a number, a
/// boolean, or (falling through) a bare string.
fn parse_literal(lit: &str) -> Node {
    let lit = lit.trim();
    if let Some(inner) = lit.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        return Node::Sequence(split_list_elements(inner).iter().map(|e| parse_literal(e)).collect());
    }
    if let Ok(i) = lit.parse::<i64>() {
        return Node::Int(i);
    }
    if let Ok(f) = lit.parse::<f64>() {
        return Node::Float(f);
    }
    match lit {
        "true" => return Node::Bool(true),
        "false" => return Node::Bool(false),
        _ => {}
    }
    if let Some(stripped) = strip_matching_quotes(lit) {
        return Node::String(stripped);
    }
    Node::String(lit.to_string())
}

fn strip_matching_quotes(s: &str) -> Option<String> {
    let bytes = s.as_bytes();
    if bytes.len() >= 2 {
        let first = bytes[0];
        let last = bytes[bytes.len() - 1];
        if (first == b'"' || first == b'\'') && first == last {
            return Some(s[1..s.len() - 1].to_string());
        }
    }
    None
}

/// Split a bracketed list's interior on commas, treating commas inside
/// single or double quotes as literal. An empty interior yields no
/// elements.
fn split_list_elements(inner: &str) -> Vec<String> {
    let trimmed = inner.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let mut elements = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    for c in trimmed.chars() {
        match quote {
            Some(q) if c == q => {
                quote = None;
                current.push(c);
            }
            Some(_) => current.push(c),
            None => match c {
                '"' | '\'' => {
                    quote = Some(c);
                    current.push(c);
                }
                ',' => {
                    elements.push(current.trim().to_string());
                    current = String::new();
                }
                _ => current.push(c),
            },
        }
    }
    elements.push(current.trim().to_string());
    elements
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(pairs: &[(&str, Node)]) -> Node {
        Node::Mapping(pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect())
    }

    #[test]
    fn extracts_scalar_defaults() {
        let schema = mapping(&[
            ("replicas", Node::String("int | default=3 | required=false".to_string())),
            ("name", Node::String("string | required=true".to_string())),
        ]);
        let defaults = extract_defaults(&schema).unwrap();
        let Node::Mapping(m) = defaults else { panic!() };
        assert_eq!(m.get("replicas"), Some(&Node::Int(3)));
        assert_eq!(m.get("name"), None, "no default= clause means omitted");
    }

    #[test]
    fn extracts_nested_defaults_only_when_present() {
        let schema = mapping(&[(
            "resources",
            mapping(&[
                ("cpu", Node::String("string | default=\"100m\"".to_string())),
                ("memory", Node::String("string | required=true".to_string())),
            ]),
        )]);
        let defaults = extract_defaults(&schema).unwrap();
        let Node::Mapping(m) = defaults else { panic!() };
        let Node::Mapping(resources) = &m["resources"] else { panic!() };
        assert_eq!(resources.get("cpu"), Some(&Node::String("100m".to_string())));
        assert_eq!(resources.get("memory"), None);
    }

    #[test]
    fn parses_bracketed_list_literal_with_quoted_commas() {
        let node = parse_literal(r#"["a,b", 'c', 1, true]"#);
        assert_eq!(
            node,
            Node::Sequence(vec![
                Node::String("a,b".to_string()),
                Node::String("c".to_string()),
                Node::Int(1),
                Node::Bool(true),
            ])
        );
    }

    #[test]
    fn empty_brackets_yield_empty_list() {
        assert_eq!(parse_literal("[]"), Node::Sequence(vec![]));
    }

    #[test]
    fn parses_booleans_and_bare_strings() {
        assert_eq!(parse_literal("true"), Node::Bool(true));
        assert_eq!(parse_literal("false"), Node::Bool(false));
        assert_eq!(parse_literal("bare"), Node::String("bare".to_string()));
    }
}
