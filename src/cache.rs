// SPDX-License-Identifier: Apache-2.0

#![warn(missing_docs)]

//! Two-tier environment/program cache (§4.C), guarded by a mutex per tier,
//! matching the concurrency model of §5: compile work happens between a
//! cache miss and the insert without holding the lock, so two threads may
//! race to compile the same artifact — the later writer wins, which is
//! fine because compilation is deterministic.

use crate::backend::{CelContext, CelProgram};
use crate::config::config;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, trace};

/// The cache key for a compiled environment: the sorted, deduplicated set
/// of top-level variable names present in an evaluation environment.
///
/// This deliberately ignores the *shape* of each variable's value, so two
/// renders with identically-named but differently-shaped dynamic values
/// share the same compiled artifacts (§9).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EnvShape(Vec<String>);

impl EnvShape {
    /// Compute the shape key for a set of top-level variable names.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names: Vec<String> = names.into_iter().map(Into::into).collect();
        names.sort();
        names.dedup();
        EnvShape(names)
    }
}

/// Cache key for a compiled program: the environment shape plus the
/// expression's raw text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ProgramKey {
    shape: EnvShape,
    expr: String,
}

/// The two-tier cache described by §4.C. Safe to share across threads;
/// each tier is independently toggleable via [`crate::config::Config`].
#[derive(Default)]
pub struct Cache {
    environments: Mutex<HashMap<EnvShape, Arc<CelContext>>>,
    programs: Mutex<HashMap<ProgramKey, Arc<CelProgram>>>,
}

impl Cache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Obtain the compiled environment for `shape`, building (and, unless
    /// disabled, caching) it via `build` on a miss.
    pub fn env_for<F>(&self, shape: &EnvShape, build: F) -> Arc<CelContext>
    where
        F: FnOnce() -> CelContext,
    {
        if !config().env_cache_enabled() {
            trace!("environment cache disabled, compiling fresh");
            return Arc::new(build());
        }
        {
            let guard = self.environments.lock().expect("env cache mutex poisoned");
            if let Some(existing) = guard.get(shape) {
                trace!(?shape, "environment cache hit");
                return Arc::clone(existing);
            }
        }
        debug!(?shape, "environment cache miss, compiling");
        let compiled = Arc::new(build());
        let mut guard = self.environments.lock().expect("env cache mutex poisoned");
        // Another thread may have won the race; either value is fine since
        // compilation is deterministic (§5). Keep whichever is present.
        let entry = guard.entry(shape.clone()).or_insert_with(|| compiled.clone());
        Arc::clone(entry)
    }

    /// Obtain the compiled program for `(shape, expr)`, building (and,
    /// unless disabled, caching) it via `build` on a miss.
    pub fn program_for<F, E>(
        &self,
        shape: &EnvShape,
        expr: &str,
        build: F,
    ) -> Result<Arc<CelProgram>, E>
    where
        F: FnOnce() -> Result<CelProgram, E>,
    {
        if !config().program_cache_enabled() {
            trace!(expr, "program cache disabled, compiling fresh");
            return Ok(Arc::new(build()?));
        }
        let key = ProgramKey {
            shape: shape.clone(),
            expr: expr.to_string(),
        };
        {
            let guard = self.programs.lock().expect("program cache mutex poisoned");
            if let Some(existing) = guard.get(&key) {
                trace!(expr, "program cache hit");
                return Ok(Arc::clone(existing));
            }
        }
        debug!(expr, "program cache miss, compiling");
        let compiled = Arc::new(build()?);
        let mut guard = self.programs.lock().expect("program cache mutex poisoned");
        let entry = guard.entry(key).or_insert_with(|| compiled.clone());
        Ok(Arc::clone(entry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_is_sorted_and_deduplicated() {
        let a = EnvShape::new(["schema", "ctx", "schema"]);
        let b = EnvShape::new(["ctx", "schema"]);
        assert_eq!(a, b);
    }
}
