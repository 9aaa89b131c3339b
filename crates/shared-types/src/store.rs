//! # Key-Value Store Port
//!
//! Driven port for the external key-value store (Redis-like). Every method is
//! a single atomic operation on the store; callers compose them without any
//! cross-operation isolation.

use std::time::Duration;

use async_trait::async_trait;

use crate::errors::StoreError;

/// Opaque position in a paginated key scan.
///
/// `ScanCursor::start()` begins a scan. A page whose `next` is `None` ends it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ScanCursor(String);

impl ScanCursor {
    /// Cursor positioned before the first key.
    pub fn start() -> Self {
        Self(String::new())
    }

    /// Rebuild a cursor from a token previously returned by [`ScanCursor::token`].
    pub fn from_token(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Token to persist if the scan should be resumed later.
    pub fn token(&self) -> &str {
        &self.0
    }

    pub fn is_start(&self) -> bool {
        self.0.is_empty()
    }
}

/// One batch of keys returned by [`KeyValueStore::scan`].
#[derive(Clone, Debug, Default)]
pub struct ScanPage {
    /// Cursor for the following page, `None` once the scan is complete.
    pub next: Option<ScanCursor>,
    /// Keys in this page. May be empty even when `next` is `Some`.
    pub keys: Vec<String>,
}

/// Key-value store (Driven Port)
///
/// Mirrors the subset of Redis semantics the system relies on. Keys with an
/// elapsed TTL behave exactly like absent keys.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Get a blob value.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Overwrite a blob value, optionally with an expiry.
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>)
        -> Result<(), StoreError>;

    /// Write a blob only if the key is absent. Returns `true` if written.
    async fn set_if_absent(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> Result<bool, StoreError>;

    /// Delete keys. Returns the number of keys that existed.
    async fn del(&self, keys: &[String]) -> Result<u64, StoreError>;

    /// Return one page of keys starting with `prefix`.
    ///
    /// No ordering or snapshot guarantee across pages: keys created or
    /// removed during a scan may or may not be returned.
    async fn scan(
        &self,
        cursor: &ScanCursor,
        prefix: &str,
        count: usize,
    ) -> Result<ScanPage, StoreError>;

    /// Insert a member into a set. Returns `true` if the member was new.
    async fn sadd(&self, key: &str, member: &str) -> Result<bool, StoreError>;

    /// Cardinality of a set (0 when absent).
    async fn scard(&self, key: &str) -> Result<u64, StoreError>;

    /// Increment an integer value, creating it at 0 first. Returns the new value.
    async fn incr(&self, key: &str) -> Result<i64, StoreError>;

    /// Increment a field of a hash of integers. Returns the new field value.
    async fn hincrby(&self, key: &str, field: &str, delta: i64) -> Result<i64, StoreError>;

    /// Read every field of a hash of integers (empty when absent).
    async fn hgetall(&self, key: &str) -> Result<Vec<(String, i64)>, StoreError>;

    /// Reset a key's expiry to `ttl` from now. Returns `false` if the key is absent.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, StoreError>;

    /// Remaining time to live, `None` when the key is absent or has no expiry.
    async fn ttl(&self, key: &str) -> Result<Option<Duration>, StoreError>;
}
