//! # Shared Types Crate
//!
//! Infrastructure contracts shared by every Report-Sieve subsystem.
//!
//! ## Contents
//!
//! - [`KeyValueStore`]: the driven port every subsystem persists through.
//!   Each operation is individually atomic; nothing here offers
//!   multi-operation transactions.
//! - [`InMemoryKvStore`]: single-process adapter with TTL support, used by
//!   tests and by the reference runtime.
//! - [`RateLimiter`]: the `allow(identity)` collaborator consumed by the
//!   ingestion path, plus [`FixedWindowRateLimiter`] built on the store.

pub mod errors;
pub mod memory_store;
pub mod rate_limiter;
pub mod store;

pub use errors::StoreError;
pub use memory_store::InMemoryKvStore;
pub use rate_limiter::{FixedWindowRateLimiter, RateLimitConfig, RateLimiter};
pub use store::{KeyValueStore, ScanCursor, ScanPage};
