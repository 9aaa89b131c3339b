//! Hash functions for the Bloom filter
//!
//! Probes use double hashing: `probe(i) = (h1 + i * h2) mod m`.
//!
//! - `h1`: the identifier's hex value modulo 2^64 (hex encoding), or
//!   MurmurHash3 x64-128 truncated to 64 bits (text encoding)
//! - `h2`: 64-bit FNV-1a of `identifier + "salt"`
//!
//! The linear combination is evaluated in `u128`, so the result equals the
//! exact integer formula with no wrap-around.

use std::io::Cursor;

use super::identifier::IdentifierEncoding;
use crate::error::FilterError;

/// FNV-1a 64-bit offset basis.
pub const FNV_OFFSET_BASIS: u64 = 0xCBF2_9CE4_8422_2325;
/// FNV-1a 64-bit prime.
pub const FNV_PRIME: u64 = 0x0000_0100_0000_01B3;

const SECONDARY_SALT: &[u8] = b"salt";

/// 64-bit FNV-1a over a byte stream.
pub fn fnv1a_64(bytes: impl IntoIterator<Item = u8>) -> u64 {
    bytes.into_iter().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
    })
}

/// Parse hex digits as an integer, keeping the low 64 bits.
pub fn hex_hash(identifier: &str) -> Result<u64, FilterError> {
    if identifier.is_empty() {
        return Err(FilterError::MalformedIdentifier {
            identifier: String::new(),
            reason: "empty identifier",
        });
    }

    identifier.chars().try_fold(0u64, |acc, c| {
        let digit = c.to_digit(16).ok_or_else(|| FilterError::MalformedIdentifier {
            identifier: identifier.chars().take(64).collect(),
            reason: "expected hexadecimal digits",
        })?;
        Ok((acc << 4) | u64::from(digit))
    })
}

/// MurmurHash3 x64-128 with seed 0, lower 64 bits.
pub fn murmur_hash(identifier: &str) -> Result<u64, FilterError> {
    let mut cursor = Cursor::new(identifier.as_bytes());
    let hash = murmur3::murmur3_x64_128(&mut cursor, 0).map_err(|e| {
        FilterError::MalformedIdentifier {
            identifier: identifier.chars().take(64).collect(),
            reason: if e.kind() == std::io::ErrorKind::UnexpectedEof {
                "unexpected end of input"
            } else {
                "unreadable identifier"
            },
        }
    })?;
    Ok(hash as u64)
}

/// First of the two double-hashing inputs.
pub fn primary_hash(identifier: &str, encoding: IdentifierEncoding) -> Result<u64, FilterError> {
    match encoding {
        IdentifierEncoding::Hex => hex_hash(identifier),
        IdentifierEncoding::Text => murmur_hash(identifier),
    }
}

/// Second of the two double-hashing inputs.
pub fn secondary_hash(identifier: &str) -> u64 {
    fnv1a_64(
        identifier
            .bytes()
            .chain(SECONDARY_SALT.iter().copied()),
    )
}

/// Compute the `k` probe indices in `[0, m)` for an identifier.
pub fn compute_probes(
    identifier: &str,
    encoding: IdentifierEncoding,
    k: u32,
    m: u64,
) -> Result<Vec<u64>, FilterError> {
    if m == 0 {
        return Err(FilterError::InvalidParameter("m must be positive".to_string()));
    }

    let m = u128::from(m);
    let h1 = u128::from(primary_hash(identifier, encoding)?) % m;
    let h2 = u128::from(secondary_hash(identifier)) % m;

    Ok((0..u128::from(k))
        .map(|i| ((h1 + i * h2) % m) as u64)
        .collect())
}
