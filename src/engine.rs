// SPDX-License-Identifier: Apache-2.0

#![warn(missing_docs)]

//! Expression engine (§4.D): compile and evaluate a single expression
//! under an evaluation environment, and render a whole string (sole vs.
//! interpolated expressions, per §3).

use crate::backend;
use crate::cache::{Cache, EnvShape};
use crate::error::RenderError;
use crate::helpers;
use crate::node::Node;
use crate::scanner;
use indexmap::IndexMap;
use tracing::trace;

/// A single expression engine instance, owning the two-tier cache (§4.C).
/// Safe to share across threads (§5): `Engine::render_string` and
/// `Engine::evaluate` take `&self`.
#[derive(Default)]
pub struct Engine {
    cache: Cache,
}

impl Engine {
    /// Create a new engine with empty caches.
    pub fn new() -> Self {
        Self::default()
    }

    /// Render a scalar string (§4.D `renderString`).
    ///
    /// - No `${...}` span: returns `s` unchanged (§8 property).
    /// - Exactly one span whose full text equals the trimmed string: the
    ///   expression's native value is returned, type preserved.
    /// - Otherwise: every span's evaluated result is stringified (§4.D's
    ///   stringification rules) and spliced back in, left to right.
    pub fn render_string(&self, s: &str, env: &IndexMap<String, Node>) -> Result<Node, RenderError> {
        let spans = scanner::scan(s);
        if spans.is_empty() {
            return Ok(Node::String(s.to_string()));
        }

        let sole = spans.len() == 1 && spans[0].full(s) == s.trim();
        if sole {
            return self.evaluate(&spans[0].inner, env);
        }

        let mut out = String::with_capacity(s.len());
        let mut last = 0usize;
        for span in &spans {
            out.push_str(&s[last..span.start]);
            let value = self.evaluate(&span.inner, env)?;
            if value.is_omit() {
                return Err(RenderError::Evaluation {
                    expr: span.inner.clone(),
                    source: "omit() may only be used as a standalone expression value, not \
                             interpolated into surrounding text"
                        .to_string(),
                });
            }
            out.push_str(&value.stringify());
            last = span.end;
        }
        out.push_str(&s[last..]);
        Ok(Node::String(out))
    }

    /// Evaluate one expression's text under `env` (§4.D `evaluate`).
    pub fn evaluate(&self, expr: &str, env: &IndexMap<String, Node>) -> Result<Node, RenderError> {
        let shape = EnvShape::new(env.keys().cloned());

        let base_ctx = self.cache.env_for(&shape, helpers::build_context);

        let program = self
            .cache
            .program_for(&shape, expr, || backend::compile(expr))
            .map_err(|source| RenderError::Compilation {
                expr: expr.to_string(),
                source,
            })?;

        let mut call_ctx = (*base_ctx).clone();
        for (name, value) in env {
            backend::bind_variable(&mut call_ctx, name, value).map_err(|source| {
                RenderError::Evaluation {
                    expr: expr.to_string(),
                    source,
                }
            })?;
        }

        trace!(expr, "executing compiled program");
        backend::execute(&program, &call_ctx).map_err(|source| RenderError::Evaluation {
            expr: expr.to_string(),
            source,
        })
    }
}
