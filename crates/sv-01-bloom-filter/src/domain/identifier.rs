//! Identifier encodings accepted by the filter and the ledger
//!
//! Validation runs at the ingestion boundary so malformed input never
//! reaches probe computation or the key-value store.

use serde::{Deserialize, Serialize};

use crate::error::FilterError;

/// Longest identifier accepted, in bytes.
pub const MAX_IDENTIFIER_LEN: usize = 256;

/// How identifiers are encoded, which selects the primary hash.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierEncoding {
    /// Hex digits (`[0-9a-fA-F]+`), typically a hashed profile id.
    /// The primary hash is the integer value of the digits modulo 2^64.
    #[default]
    Hex,
    /// Arbitrary text without `:` or whitespace.
    /// The primary hash is MurmurHash3.
    Text,
}

impl IdentifierEncoding {
    /// Check that `identifier` is acceptable under this encoding.
    pub fn validate(self, identifier: &str) -> Result<(), FilterError> {
        let malformed = |reason| FilterError::MalformedIdentifier {
            identifier: truncate(identifier),
            reason,
        };

        if identifier.is_empty() {
            return Err(malformed("empty identifier"));
        }
        if identifier.len() > MAX_IDENTIFIER_LEN {
            return Err(malformed("identifier too long"));
        }

        match self {
            IdentifierEncoding::Hex => {
                if !identifier.bytes().all(|b| b.is_ascii_hexdigit()) {
                    return Err(malformed("expected hexadecimal digits"));
                }
            }
            IdentifierEncoding::Text => {
                // ':' separates key segments in the store
                if identifier.chars().any(|c| c == ':' || c.is_whitespace()) {
                    return Err(malformed("contains ':' or whitespace"));
                }
            }
        }
        Ok(())
    }
}

fn truncate(identifier: &str) -> String {
    identifier.chars().take(64).collect()
}
