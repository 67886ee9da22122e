//! Error types for node paths and step keys
//!
//! Constructors report shape violations as `InvalidArgument`; decoding a
//! stored key reports `MalformedKey`. Neither is recoverable here, callers
//! get them unchanged.

use thiserror::Error;

/// Errors produced while building or parsing a [`NodePath`](super::NodePath)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NodePathError {
    /// No segments at all (empty input string or empty iterator)
    #[error("Node path cannot be empty")]
    Empty,

    /// A `.` separated segment is empty, e.g. `a..b` or `.a`
    #[error("Node path '{path}' contains an empty segment")]
    EmptySegment { path: String },

    /// A segment contains a character outside `[A-Za-z0-9_]`
    #[error("Node path segment '{segment}' contains invalid character {ch:?}")]
    InvalidCharacter { segment: String, ch: char },
}

/// Why a step key could not be decoded
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedKeyReason {
    /// The part before the bracket suffix is not a valid node path
    #[error(transparent)]
    NodePath(#[from] NodePathError),

    /// A `[` was found but the key does not end with the matching `]`
    #[error("mapping key suffix is not terminated by ']'")]
    UnterminatedMappingKey,
}

/// Main error type for step handle construction and decoding
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StepKeyError {
    /// A supplied value does not have the shape the constructor requires
    #[error("Invalid argument '{argument}': {reason}")]
    InvalidArgument {
        argument: &'static str,
        reason: String,
    },

    /// A stored key could not be decoded into any step handle
    #[error("Malformed step key '{key}': {reason}")]
    MalformedKey {
        key: String,
        #[source]
        reason: MalformedKeyReason,
    },
}

impl StepKeyError {
    pub(crate) fn invalid_argument(argument: &'static str, reason: impl Into<String>) -> Self {
        StepKeyError::InvalidArgument {
            argument,
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed(key: &str, reason: impl Into<MalformedKeyReason>) -> Self {
        StepKeyError::MalformedKey {
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, StepKeyError::InvalidArgument { .. })
    }

    pub fn is_malformed_key(&self) -> bool {
        matches!(self, StepKeyError::MalformedKey { .. })
    }
}

/// Result type alias for step key operations
pub type Result<T> = std::result::Result<T, StepKeyError>;
