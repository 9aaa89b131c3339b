//! # SV-01 Bloom Filter
//!
//! Append-only probabilistic membership structure shared with clients.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): Pure business logic, no I/O
//!   - `BloomFilter`: bit array of `m/32` words + double-hashing probes
//!   - `FilterConfig`: filter shape with validation
//!   - `BloomFilterSnapshot`: persisted `{version, buckets}` form
//!
//! ## Invariants
//!
//! - **No false negatives**: if `add(x)` succeeded, `check(x)` returns true
//! - **Append-only**: bits are never cleared
//! - **Merge compatibility**: only filters with equal `m` merge
//!
//! ## Usage Example
//!
//! ```ignore
//! use sv_01_bloom_filter::{BloomFilter, FilterConfig};
//!
//! let mut filter = FilterConfig::default().empty_filter()?;
//! filter.add("deadbeef")?;
//! assert!(filter.check("deadbeef")?);
//! ```

pub mod domain;
pub mod error;

// Re-exports for convenience
pub use domain::{
    BloomFilter, BloomFilterSnapshot, FilterConfig, FilterConfigBuilder, IdentifierEncoding,
    SnapshotVersion,
};
pub use error::FilterError;
