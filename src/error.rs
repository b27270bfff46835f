// SPDX-License-Identifier: Apache-2.0

#![warn(missing_docs)]

//! Errors raised from this library.
//!

use thiserror::Error;

/// Substring recognized by [`IsMissingDataError`][crate::is_missing_data_error]
/// for a runtime map/field lookup miss.
pub(crate) const NO_SUCH_KEY: &str = "no such key";

/// Substring recognized by [`IsMissingDataError`][crate::is_missing_data_error]
/// for an undeclared top-level variable reference.
pub(crate) const UNDECLARED_REFERENCE: &str = "undeclared reference";

/// Variants of error raised by this library.
#[derive(Debug, Error)]
pub enum RenderError {
    /// A required input field was nil/missing.
    #[error("input invalid: {0}")]
    InputInvalid(String),

    /// The expression text failed to compile.
    #[error("compilation error in expression '{expr}': {source}")]
    Compilation {
        /// The offending expression text.
        expr: String,
        /// Underlying compiler message.
        source: String,
    },

    /// A runtime evaluation failure, including the missing-data subclass.
    /// Use [`crate::is_missing_data_error`] to distinguish the two.
    #[error("CEL-style evaluation error in expression '{expr}': {source}")]
    Evaluation {
        /// The offending expression text.
        expr: String,
        /// Underlying evaluator message.
        source: String,
    },

    /// A dynamic map key expression evaluated to a non-string value.
    #[error("dynamic map key '{key}' must evaluate to a string, got {actual_type}")]
    KeyType {
        /// The original (un-evaluated) key text.
        key: String,
        /// The Rust-level type name of the actual evaluated value.
        actual_type: String,
    },

    /// The rendered root (or a required top-level field) is invalid.
    #[error("output invalid: {0}")]
    OutputInvalid(String),

    /// Failed to generate the auto-filled `uuid` context variable.
    #[error("failed to generate render uuid: {0}")]
    UuidGeneration(String),
}

impl RenderError {
    /// `true` if this error is the missing-data subclass of [`RenderError::Evaluation`]:
    /// a runtime "no such key" lookup miss, or a compile-time "undeclared reference".
    pub fn is_missing_data(&self) -> bool {
        match self {
            RenderError::Evaluation { source, .. } | RenderError::Compilation { source, .. } => {
                let lower = source.to_lowercase();
                lower.contains(NO_SUCH_KEY) || lower.contains(UNDECLARED_REFERENCE)
            }
            _ => false,
        }
    }
}

/// Classify an error produced by [`crate::pipeline::render`] as the
/// missing-data subclass (`true`) vs. any other failure (`false`).
///
/// Callers from *optional* render contexts may treat a `true` result as an
/// empty/soft result rather than a hard failure.
pub fn is_missing_data_error(err: &RenderError) -> bool {
    err.is_missing_data()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_no_such_key() {
        let err = RenderError::Evaluation {
            expr: "data.missingKey".into(),
            source: "no such key: missingKey".into(),
        };
        assert!(is_missing_data_error(&err));
    }

    #[test]
    fn classifies_undeclared_reference() {
        let err = RenderError::Compilation {
            expr: "foo.bar".into(),
            source: "undeclared reference to 'foo'".into(),
        };
        assert!(is_missing_data_error(&err));
    }

    #[test]
    fn other_errors_are_not_missing_data() {
        let err = RenderError::Evaluation {
            expr: "1 + 'x'".into(),
            source: "no matching overload".into(),
        };
        assert!(!is_missing_data_error(&err));

        let err = RenderError::KeyType {
            key: "${spec.port}".into(),
            actual_type: "int".into(),
        };
        assert!(!is_missing_data_error(&err));
    }
}
