//! Core Bloom Filter implementation
//!
//! INVARIANTS:
//! - No false negatives: once `add(x)` succeeds, `check(x)` returns true
//! - Append-only: bits are set, never cleared
//! - `m` is a positive multiple of 32; storage is `m / 32` words where
//!   probe `p` lives at word `p / 32`, bit `p % 32`

use bitvec::prelude::*;

use super::hash_functions::compute_probes;
use super::identifier::IdentifierEncoding;
use super::parameters::{calculate_fpr, estimate_cardinality};
use crate::error::FilterError;

/// Bits per storage word.
pub const WORD_BITS: usize = 32;

/// Bloom filter for probabilistic membership testing
///
/// False positives are possible, false negatives are not.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BloomFilter {
    /// Bit array, `Lsb0` over `u32` words so bit `p` is `words[p/32] >> (p%32)`
    bits: BitVec<u32, Lsb0>,
    /// Number of probes (k)
    k: u32,
    /// Identifier encoding, selects the primary hash
    encoding: IdentifierEncoding,
}

impl BloomFilter {
    /// Create an empty filter of at least `capacity_bits` bits.
    ///
    /// The capacity is rounded up to the next multiple of 32.
    pub fn new(capacity_bits: usize, k: u32) -> Result<Self, FilterError> {
        Self::with_encoding(capacity_bits, k, IdentifierEncoding::default())
    }

    /// Create an empty filter for a given identifier encoding.
    pub fn with_encoding(
        capacity_bits: usize,
        k: u32,
        encoding: IdentifierEncoding,
    ) -> Result<Self, FilterError> {
        validate_k(k)?;
        let words = capacity_bits.div_ceil(WORD_BITS);
        if words == 0 {
            return Err(FilterError::InvalidParameter(
                "capacity must be at least one bit".to_string(),
            ));
        }
        Ok(Self {
            bits: BitVec::from_vec(vec![0u32; words]),
            k,
            encoding,
        })
    }

    /// Adopt an existing bucket sequence; capacity is `buckets.len() * 32`.
    pub fn from_buckets(
        buckets: Vec<u32>,
        k: u32,
        encoding: IdentifierEncoding,
    ) -> Result<Self, FilterError> {
        validate_k(k)?;
        if buckets.is_empty() {
            return Err(FilterError::InvalidParameter(
                "bucket sequence is empty".to_string(),
            ));
        }
        Ok(Self {
            bits: BitVec::from_vec(buckets),
            k,
            encoding,
        })
    }

    /// Probe indices for an identifier.
    pub fn probes(&self, identifier: &str) -> Result<Vec<u64>, FilterError> {
        compute_probes(identifier, self.encoding, self.k, self.m() as u64)
    }

    /// Insert an identifier. Idempotent.
    pub fn add(&mut self, identifier: &str) -> Result<(), FilterError> {
        for probe in self.probes(identifier)? {
            self.bits.set(probe as usize, true);
        }
        Ok(())
    }

    /// Test whether an identifier might be in the filter.
    ///
    /// - `false`: definitely never added to this filter
    /// - `true`: added, or a false positive
    pub fn check(&self, identifier: &str) -> Result<bool, FilterError> {
        Ok(self
            .probes(identifier)?
            .into_iter()
            .all(|probe| self.bits[probe as usize]))
    }

    /// Estimated number of inserted elements.
    ///
    /// Returns `f64::INFINITY` when the filter is saturated.
    pub fn estimate_count(&self) -> f64 {
        estimate_cardinality(self.m(), self.k, self.bits_set())
    }

    /// True when every bit is set and estimates are meaningless.
    pub fn is_saturated(&self) -> bool {
        self.bits.all()
    }

    /// Expected false positive rate at the current estimated size.
    pub fn false_positive_rate(&self) -> f64 {
        if self.is_saturated() {
            return 1.0;
        }
        calculate_fpr(self.m(), self.estimate_count().round() as usize, self.k)
    }

    /// OR another filter's buckets into this one.
    ///
    /// Both filters must have the same number of words. On mismatch neither
    /// filter is modified.
    pub fn merge(&mut self, other: &BloomFilter) -> Result<(), FilterError> {
        let expected = self.bits.as_raw_slice().len();
        let actual = other.bits.as_raw_slice().len();
        if expected != actual {
            return Err(FilterError::SizeMismatch { expected, actual });
        }

        for (s, o) in self
            .bits
            .as_raw_mut_slice()
            .iter_mut()
            .zip(other.bits.as_raw_slice())
        {
            *s |= *o;
        }
        Ok(())
    }

    /// Number of set bits (X).
    pub fn bits_set(&self) -> usize {
        self.bits.count_ones()
    }

    /// Capacity in bits (m).
    pub fn m(&self) -> usize {
        self.bits.len()
    }

    /// Number of probes (k).
    pub fn k(&self) -> u32 {
        self.k
    }

    pub fn encoding(&self) -> IdentifierEncoding {
        self.encoding
    }

    /// Raw storage words, `m / 32` of them.
    pub fn buckets(&self) -> &[u32] {
        self.bits.as_raw_slice()
    }
}

fn validate_k(k: u32) -> Result<(), FilterError> {
    if k == 0 {
        return Err(FilterError::InvalidParameter(
            "k must be positive".to_string(),
        ));
    }
    Ok(())
}
