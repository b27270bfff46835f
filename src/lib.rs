// SPDX-License-Identifier: Apache-2.0

#![warn(missing_docs)]

//! A sandboxed expression-template engine and rendering pipeline for
//! Kubernetes-native resource definitions.
//!
//! # Expressions
//!
//! Templates are plain structural data (mappings, sequences, scalars) whose
//! string leaves may embed `${ ... }` expressions, evaluated by a CEL-style
//! backend (see the [`cel-interpreter`](https://crates.io/crates/cel-interpreter)
//! crate). A string that is *only* one such expression, once trimmed,
//! evaluates to its native result type; any other string has each of its
//! spans stringified and spliced back in left to right. Scanning tolerates
//! nested braces, so `${ f({"a": 1}) }` scans as one span. See
//! [`scanner`] and [`engine`].
//!
//! ```rust
//! use tmpl_render_core::prelude::*;
//! use indexmap::IndexMap;
//!
//! let engine = Engine::new();
//! let env: IndexMap<String, Node> = IndexMap::from([(
//!     "metadata".to_string(),
//!     Node::Mapping(IndexMap::from([("name".to_string(), Node::String("checkout".to_string()))])),
//! )]);
//! let out = engine.render_string("${metadata.name}", &env).unwrap();
//! assert_eq!(out, Node::String("checkout".to_string()));
//! ```
//!
//! # Helpers
//!
//! Four built-ins are registered on every compiled environment: `omit()`
//! (a sentinel that prunes the mapping entry or sequence element carrying
//! it), `merge(a, b)` (shallow map merge, `b` wins), `sha256sum(s)`, and
//! `sanitizeK8sResourceName(...)` (DNS-label-like identifiers with a
//! deterministic hash suffix). See [`helpers`].
//!
//! # Context assembly
//!
//! A render's top-level variables (`ctx`, `schema`, `fixedParameters`, and
//! the companion `metadata`/`workload`/`configurations` variables used by
//! other resource types) are assembled by [`context_builder`] from an owner
//! descriptor's parameters, a definition's schema defaults (parsed by
//! [`schema`]) and fixed parameters, and an optional type definition's
//! overrides.
//!
//! # Rendering pipeline
//!
//! [`pipeline::render`] is the entry point: it validates the input,
//! auto-fills `ctx.timestamp`/`ctx.uuid`, builds the evaluation
//! environment, walks the template via [`walker`], prunes omit sentinels,
//! coerces `"value"`-keyed entries and unwraps flow-style sequences, then
//! validates the output shape.
//!
//! # Caching
//!
//! Compiled environments and compiled programs are cached independently
//! (see [`cache`]), each behind a mutex, each toggleable via [`config`].
//! Building a compiled environment is the expensive step; it is keyed by
//! the *shape* (sorted variable names) of the evaluation environment, not
//! its values, so differently-shaped runtime data sharing the same
//! variable names reuses the same compiled artifacts.
//!
//! # Errors
//!
//! All public functions return [`error::RenderError`]. Runtime and
//! compile-time "missing data" failures (an absent map key; an undeclared
//! top-level variable) are programmatically distinguishable from other
//! evaluation failures via [`is_missing_data_error`]; callers rendering
//! optional contexts may treat that subclass as an empty result.
//!
//! # Configuration
//!
//! Both cache tiers default to enabled and can be disabled independently
//! via the `RENDER_ENV_CACHE_ENABLED` / `RENDER_PROGRAM_CACHE_ENABLED`
//! environment variables (also readable from a `.env` file via
//! [`dotenvy`](https://crates.io/crates/dotenvy)). See [`config`].

mod backend;
mod cache;
mod config;
mod context_builder;
mod engine;
mod error;
mod helpers;
mod node;
mod pipeline;
mod scanner;
mod schema;
mod walker;

pub use config::{config, Config};
pub use context_builder::{
    build as build_context_variables, deep_merge, AllowedTemplate, ConfigGroup, Configurations,
    ContainerSpec, Connection, ContextVars, Definition, Endpoint, EnvironmentOverride, Metadata,
    OwnerDescriptor, TypeDefinition, Workload,
};
pub use engine::Engine;
pub use error::{is_missing_data_error, RenderError};
pub use node::Node;
pub use pipeline::{remove_omitted_fields, render, RenderInput, RenderOutput};

pub mod prelude;
