//! Domain Layer - Pure business logic
//!
//! This layer contains:
//! - Core Bloom filter implementation
//! - Hash functions and the double-hashing probe scheme
//! - Identifier encodings and boundary validation
//! - Parameter math (FPR, cardinality estimate)
//! - Configuration
//! - Persisted snapshot format
//!
//! RULES:
//! - No I/O operations
//! - No async code

pub mod bloom_filter;
pub mod config;
pub mod hash_functions;
pub mod identifier;
pub mod parameters;
pub mod snapshot;

pub use bloom_filter::{BloomFilter, WORD_BITS};
pub use config::{FilterConfig, FilterConfigBuilder, DEFAULT_CAPACITY_BITS, DEFAULT_HASH_COUNT};
pub use identifier::{IdentifierEncoding, MAX_IDENTIFIER_LEN};
pub use parameters::{calculate_fpr, calculate_optimal_parameters, estimate_cardinality, BloomFilterParams};
pub use snapshot::{BloomFilterSnapshot, SnapshotVersion};
