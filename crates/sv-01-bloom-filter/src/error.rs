//! Error types for the Bloom filter subsystem

use thiserror::Error;

/// Errors that can occur when building, probing or merging a filter
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("Invalid filter parameter: {0}")]
    InvalidParameter(String),

    #[error("Bucket count mismatch: {expected} words != {actual} words")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("Malformed identifier {identifier:?}: {reason}")]
    MalformedIdentifier {
        identifier: String,
        reason: &'static str,
    },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}
