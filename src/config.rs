// SPDX-License-Identifier: Apache-2.0

#![warn(missing_docs)]

//! Configuration parameters affecting the behaviour of this library.
//!

use dotenvy::var;
use std::sync::OnceLock;

/// Process-wide configuration, lazily populated from the environment.
#[derive(Debug)]
pub struct Config {
    env_cache_enabled: bool,
    program_cache_enabled: bool,
}

static CONFIG: OnceLock<Config> = OnceLock::new();

/// This library's configuration singleton.
pub fn config() -> &'static Config {
    CONFIG.get_or_init(Config::default)
}

fn flag(name: &str, default: bool) -> bool {
    match var(name) {
        Ok(v) => !matches!(v.trim(), "0" | "false" | "FALSE" | "False"),
        Err(_) => default,
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            env_cache_enabled: flag("RENDER_ENV_CACHE_ENABLED", true),
            program_cache_enabled: flag("RENDER_PROGRAM_CACHE_ENABLED", true),
        }
    }
}

impl Config {
    /// Whether the compiled-environment tier of the cache (§4.C) is enabled.
    pub fn env_cache_enabled(&self) -> bool {
        self.env_cache_enabled
    }

    /// Whether the compiled-program tier of the cache (§4.C) is enabled.
    pub fn program_cache_enabled(&self) -> bool {
        self.program_cache_enabled
    }
}
