//! # Rate Limiter
//!
//! Per-identity fixed-window limiter backed by the key-value store.
//!
//! ## Algorithm
//!
//! - `INCR rate_limit:{identity}`
//! - the first increment in a window sets the window expiry; a counter found
//!   without one (its `EXPIRE` failed) gets it set on the next call
//! - the call is allowed while the counter is `<= limit`
//!
//! Increment and expiry are separate store calls, so two concurrent callers
//! can both pass at the boundary. Enforcement is best-effort.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::errors::StoreError;
use crate::store::KeyValueStore;

/// Rate-limit collaborator consumed by the ingestion path.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Consume one unit for `identity`. Returns `false` once the window is exhausted.
    async fn allow(&self, identity: &str) -> Result<bool, StoreError>;
}

/// Rate limiter configuration.
#[derive(Clone, Debug)]
pub struct RateLimitConfig {
    /// Calls allowed per window.
    pub limit: u64,
    /// Window length, starting at the first call.
    pub window: Duration,
    /// Key prefix for counters.
    pub key_prefix: String,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            limit: 5,
            window: Duration::from_secs(60),
            key_prefix: "rate_limit:".to_string(),
        }
    }
}

/// Fixed-window limiter storing one counter per identity.
pub struct FixedWindowRateLimiter<S: KeyValueStore> {
    store: Arc<S>,
    config: RateLimitConfig,
}

impl<S: KeyValueStore> FixedWindowRateLimiter<S> {
    pub fn new(store: Arc<S>, config: RateLimitConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    fn key(&self, identity: &str) -> String {
        format!("{}{}", self.config.key_prefix, identity)
    }
}

#[async_trait]
impl<S: KeyValueStore> RateLimiter for FixedWindowRateLimiter<S> {
    async fn allow(&self, identity: &str) -> Result<bool, StoreError> {
        let key = self.key(identity);
        let current = self.store.incr(&key).await?;
        if current == 1 || self.store.ttl(&key).await?.is_none() {
            self.store.expire(&key, self.config.window).await?;
        }

        let allowed = current as u64 <= self.config.limit;
        if !allowed {
            debug!(identity, current, limit = self.config.limit, "Rate limit exhausted");
        }
        Ok(allowed)
    }
}
