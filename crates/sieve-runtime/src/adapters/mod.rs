//! # Store Adapters
//!
//! Networked [`KeyValueStore`](shared_types::KeyValueStore) backends. The
//! in-memory adapter in `shared-types` serves tests and single-process use;
//! deployments where several instances share ledger, snapshot and lease
//! state connect through [`RedisStore`].

pub mod redis_store;

pub use redis_store::RedisStore;
