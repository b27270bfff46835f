// SPDX-License-Identifier: Apache-2.0

#![warn(missing_docs)]

//! Built-in helper functions surfaced to the expression language (§4.B),
//! grounded on the registration pattern of the teacher's own
//! `add_builtins` (one function registered per built-in, closures
//! converting between the backend's value type and native Rust types).

use crate::backend::{omit_marker, CelContext};
use cel_interpreter::objects::{Key, Map as CelMap};
use cel_interpreter::{ExecutionError, FunctionContext, Value};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;

/// Register every built-in (`omit`, `merge`, `sanitizeK8sResourceName`,
/// `sha256sum`) plus the backend's standard string/encoder/math/list/set/
/// two-variable-comprehension extensions onto a fresh context. This is
/// the expensive, shape-independent step cached as the "compiled
/// environment" artifact by §4.C.
pub fn build_context() -> CelContext {
    let mut ctx = CelContext::default();
    add_omit(&mut ctx);
    add_merge(&mut ctx);
    add_sha256sum(&mut ctx);
    add_sanitize_k8s_resource_name(&mut ctx);
    ctx
}

fn add_omit(ctx: &mut CelContext) {
    ctx.add_function("omit", || -> Result<Value, ExecutionError> {
        Err(function_error("omit", omit_marker()))
    });
}

fn add_sha256sum(ctx: &mut CelContext) {
    ctx.add_function("sha256sum", |s: Arc<String>| -> String {
        let digest = Sha256::digest(s.as_bytes());
        hex::encode(digest)
    });
}

fn add_merge(ctx: &mut CelContext) {
    ctx.add_function("merge", |a: Value, b: Value| -> Result<Value, ExecutionError> {
        match (a, b) {
            (Value::Map(a), Value::Map(b)) => {
                let mut merged: HashMap<Key, Value> = (*a.map).clone();
                for (k, v) in b.map.iter() {
                    merged.insert(k.clone(), v.clone());
                }
                Ok(Value::Map(CelMap { map: Arc::new(merged) }))
            }
            _ => Err(function_error("merge", "both arguments must be maps")),
        }
    });
}

/// Build an `ExecutionError` for a native function call that received
/// arguments its overload doesn't accept.
fn function_error(function: &str, message: impl Into<String>) -> ExecutionError {
    ExecutionError::function_error(function, message.into())
}

fn add_sanitize_k8s_resource_name(ctx: &mut CelContext) {
    // `cel-interpreter` hands raw (unevaluated) arguments to a function
    // registered against a `FunctionContext` rather than typed closure
    // parameters, which is what lets this single native function pick an
    // overload by arity the way the reference design's call-site macro
    // does: one argument is passed through untouched (so the unary
    // string/list overload is chosen by its runtime type); zero or 2+
    // arguments are folded into a single list argument first.
    ctx.add_function(
        "sanitizeK8sResourceName",
        |ftx: &FunctionContext| -> Result<Value, ExecutionError> {
            let args = ftx.args.clone();
            let fragments: Vec<String> = if args.len() == 1 {
                let value = ftx.ptx.resolve(&args[0])?;
                match value {
                    Value::List(items) => items
                        .iter()
                        .map(value_to_fragment)
                        .collect::<Result<Vec<_>, _>>()?,
                    Value::String(s) => vec![s.as_str().to_string()],
                    other => vec![value_to_fragment(&other)?],
                }
            } else {
                args.iter()
                    .map(|a| ftx.ptx.resolve(a).and_then(|v| value_to_fragment(&v)))
                    .collect::<Result<Vec<_>, _>>()?
            };
            Ok(Value::String(Arc::new(sanitize_k8s_resource_name(&fragments))))
        },
    );
}

fn value_to_fragment(v: &Value) -> Result<String, ExecutionError> {
    match v {
        Value::String(s) => Ok(s.as_str().to_string()),
        other => Err(function_error(
            "sanitizeK8sResourceName",
            format!("expected a string argument, got {other:?}"),
        )),
    }
}

/// Produce a DNS-label-like identifier (§4.B): each `.` in each fragment
/// becomes `-`, fragments join with `-`, and an 8-hex-character suffix
/// derived from the sha256 digest of the full joined form is always
/// appended (§8 scenario 4) — not only once the 63-character cap is
/// exceeded — so the base portion is truncated first whenever the
/// joined-plus-suffix form would otherwise overrun the cap.
pub fn sanitize_k8s_resource_name(fragments: &[String]) -> String {
    const MAX_LEN: usize = 63;
    const SUFFIX_LEN: usize = 8;

    let joined = fragments
        .iter()
        .map(|f| f.replace('.', "-"))
        .collect::<Vec<_>>()
        .join("-");

    let digest = Sha256::digest(joined.as_bytes());
    let suffix = hex::encode(digest)[..SUFFIX_LEN].to_string();

    // reserve room for the `-` separator plus the hash suffix.
    let keep = MAX_LEN.saturating_sub(SUFFIX_LEN + 1);
    let base: String = joined.chars().take(keep).collect();
    format!("{base}-{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_dots_and_joins_fragments_and_always_appends_hash_suffix() {
        let out = sanitize_k8s_resource_name(&[
            "front".to_string(),
            "end".to_string(),
            "prod".to_string(),
            "us-west".to_string(),
            "99".to_string(),
        ]);
        let digest = Sha256::digest(b"front-end-prod-us-west-99");
        let suffix = hex::encode(digest)[..8].to_string();
        assert_eq!(out, format!("front-end-prod-us-west-99-{suffix}"));
    }

    #[test]
    fn truncates_base_and_appends_deterministic_hash_suffix_past_63_chars() {
        let long = "x".repeat(80);
        let out = sanitize_k8s_resource_name(&[long.clone()]);
        assert_eq!(out.len(), 63);
        let out2 = sanitize_k8s_resource_name(&[long]);
        assert_eq!(out, out2, "suffix must be deterministic");
    }

    #[test]
    fn sha256sum_matches_known_digest() {
        let digest = Sha256::digest(b"hello world");
        assert_eq!(
            hex::encode(digest),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }
}
