//! Filter shape configuration and validation
//!
//! # Example
//!
//! ```ignore
//! use sv_01_bloom_filter::domain::FilterConfigBuilder;
//!
//! let config = FilterConfigBuilder::new()
//!     .capacity_bits(1 << 20)
//!     .hash_count(7)
//!     .build()
//!     .expect("Valid config");
//! ```

use serde::{Deserialize, Serialize};

use super::bloom_filter::BloomFilter;
use super::identifier::IdentifierEncoding;
use crate::error::FilterError;

/// Default capacity: 15385 words.
pub const DEFAULT_CAPACITY_BITS: usize = 492_320;
/// Default probes per operation.
pub const DEFAULT_HASH_COUNT: u32 = 5;
/// Upper bound on capacity (256 MiB of buckets).
pub const MAX_CAPACITY_BITS: usize = 1 << 31;

/// Shape of the shared filter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Requested capacity, rounded up to a multiple of 32 on construction
    pub capacity_bits: usize,
    /// Probes per identifier (k)
    pub hash_count: u32,
    /// Identifier encoding
    pub encoding: IdentifierEncoding,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            capacity_bits: DEFAULT_CAPACITY_BITS,
            hash_count: DEFAULT_HASH_COUNT,
            encoding: IdentifierEncoding::Hex,
        }
    }
}

impl FilterConfig {
    pub fn validate(&self) -> Result<(), FilterError> {
        if self.hash_count == 0 {
            return Err(FilterError::InvalidParameter(
                "hash_count cannot be 0".to_string(),
            ));
        }
        if self.capacity_bits == 0 {
            return Err(FilterError::InvalidParameter(
                "capacity_bits cannot be 0".to_string(),
            ));
        }
        if self.capacity_bits > MAX_CAPACITY_BITS {
            return Err(FilterError::InvalidParameter(format!(
                "capacity_bits {} exceeds maximum {}",
                self.capacity_bits, MAX_CAPACITY_BITS
            )));
        }
        Ok(())
    }

    /// Fresh, empty filter of this shape.
    pub fn empty_filter(&self) -> Result<BloomFilter, FilterError> {
        self.validate()?;
        BloomFilter::with_encoding(self.capacity_bits, self.hash_count, self.encoding)
    }

    /// Filter of this shape's `k`/encoding over existing buckets.
    pub fn filter_from_buckets(&self, buckets: Vec<u32>) -> Result<BloomFilter, FilterError> {
        BloomFilter::from_buckets(buckets, self.hash_count, self.encoding)
    }
}

/// Builder for FilterConfig with validation
#[derive(Default)]
pub struct FilterConfigBuilder {
    capacity_bits: Option<usize>,
    hash_count: Option<u32>,
    encoding: Option<IdentifierEncoding>,
}

impl FilterConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn capacity_bits(mut self, bits: usize) -> Self {
        self.capacity_bits = Some(bits);
        self
    }

    pub fn hash_count(mut self, k: u32) -> Self {
        self.hash_count = Some(k);
        self
    }

    pub fn encoding(mut self, encoding: IdentifierEncoding) -> Self {
        self.encoding = Some(encoding);
        self
    }

    /// Build the FilterConfig, validating all parameters
    pub fn build(self) -> Result<FilterConfig, FilterError> {
        let defaults = FilterConfig::default();

        let config = FilterConfig {
            capacity_bits: self.capacity_bits.unwrap_or(defaults.capacity_bits),
            hash_count: self.hash_count.unwrap_or(defaults.hash_count),
            encoding: self.encoding.unwrap_or(defaults.encoding),
        };

        config.validate()?;
        Ok(config)
    }
}
