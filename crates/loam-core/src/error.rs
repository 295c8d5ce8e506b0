//! Error types for Loam core
//!
//! Provides error handling for:
//! - Transient usage after sealing
//! - Malformed arguments (entry shapes, ranges, chunk windows)
//! - Host mutation of immutable structures
//! - Values that cannot be turned into seqs or numbers
//! - Failures raised by user functions

use std::sync::Arc;

/// Result alias used across the core crate and by user functions
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Main core error type
///
/// Cheap to clone so that a failure can be stored (agent error slot,
/// delay cache) and handed to several observers.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// A transient was touched after `persistent()` sealed it
    #[error("transient used after persistent! call")]
    TransientSealed,

    /// Argument has the wrong shape or value
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Host-style mutation attempted on a persistent structure
    #[error("cannot modify an immutable {kind}")]
    Immutable {
        /// Structure kind ("sequence", "map", "set", "vector")
        kind: &'static str,
    },

    /// Positional access outside the structure
    #[error("index {index} out of bounds for count {count}")]
    IndexOutOfBounds {
        /// Requested index
        index: usize,
        /// Element count
        count: usize,
    },

    /// Value has no seq view
    #[error("don't know how to create a seq from {type_name}")]
    NotSeqable {
        /// Type of the offending value
        type_name: &'static str,
    },

    /// Value used where a number was required
    #[error("{type_name} is not a number")]
    NotANumber {
        /// Type of the offending value
        type_name: &'static str,
    },

    /// Function invoked with an unsupported argument count
    #[error("wrong number of args ({given}) passed to {name}")]
    Arity {
        /// Function name
        name: String,
        /// Argument count supplied
        given: usize,
    },

    /// Failure raised by user code
    #[error("{0}")]
    User(String),

    /// Failure from outside the core crate
    #[error(transparent)]
    External(Arc<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Build an [`Error::InvalidArgument`]
    #[inline]
    #[must_use]
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Build an [`Error::User`]
    #[inline]
    #[must_use]
    pub fn user(msg: impl Into<String>) -> Self {
        Self::User(msg.into())
    }

    /// Wrap a foreign error
    #[inline]
    #[must_use]
    pub fn external<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::External(Arc::new(err))
    }

    /// Check if error signals a protocol misuse rather than bad data
    #[inline]
    #[must_use]
    pub fn is_usage_error(&self) -> bool {
        matches!(self, Self::TransientSealed | Self::Immutable { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_errors_are_distinguished() {
        assert!(Error::TransientSealed.is_usage_error());
        assert!(Error::Immutable { kind: "map" }.is_usage_error());
        assert!(!Error::invalid("bad pair").is_usage_error());
    }

    #[test]
    fn messages_name_the_problem() {
        assert_eq!(
            Error::Immutable { kind: "set" }.to_string(),
            "cannot modify an immutable set"
        );
        assert_eq!(
            Error::IndexOutOfBounds { index: 4, count: 2 }.to_string(),
            "index 4 out of bounds for count 2"
        );
    }
}
