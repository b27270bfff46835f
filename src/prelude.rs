// SPDX-License-Identifier: Apache-2.0

#![warn(missing_docs)]

//! Group imports of the common traits and types by adding a glob import for
//! use by clients of this library.
//!

pub use super::context_builder::*;
pub use super::error::*;
pub use super::node::Node;
pub use super::pipeline::*;
pub use super::{config, Config};
pub use super::Engine;
