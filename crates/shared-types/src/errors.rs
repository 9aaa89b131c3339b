//! # Error Types
//!
//! Errors surfaced by key-value store adapters.

use thiserror::Error;

/// Errors that can occur when talking to the key-value store.
///
/// All variants are transient from the caller's point of view except
/// `WrongType`, which means a key holds a value of an unexpected kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The backing store could not be reached or rejected the call.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// The call did not complete within the caller-supplied deadline.
    #[error("Store operation timed out: {operation}")]
    Timeout { operation: &'static str },

    /// Operation against a key holding another kind of value.
    #[error("Wrong value type for key {key}: expected {expected}")]
    WrongType { key: String, expected: &'static str },
}
