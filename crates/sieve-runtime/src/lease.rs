//! Leased lock over the key-value store.
//!
//! Tally passes read, modify and delete shared state and must not overlap.
//! The lease is a key written only if absent, carrying a random token and
//! an expiry so a crashed holder cannot block passes forever.

use std::sync::Arc;
use std::time::Duration;

use shared_types::{KeyValueStore, StoreError};
use tracing::{debug, warn};
use uuid::Uuid;

pub struct Lease<S: KeyValueStore> {
    store: Arc<S>,
    key: String,
    token: String,
}

impl<S: KeyValueStore> Lease<S> {
    /// Take the lease, or `None` if another holder has it.
    pub async fn acquire(
        store: Arc<S>,
        key: &str,
        ttl: Duration,
    ) -> Result<Option<Self>, StoreError> {
        let token = Uuid::new_v4().to_string();
        let acquired = store
            .set_if_absent(key, token.clone().into_bytes(), Some(ttl))
            .await?;
        if !acquired {
            debug!(key, "Lease held elsewhere");
            return Ok(None);
        }
        Ok(Some(Self {
            store,
            key: key.to_string(),
            token,
        }))
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Give the lease back if it is still ours. Returns whether it was.
    ///
    /// Read-then-delete is not atomic; a lease that expires between the two
    /// calls and is re-acquired elsewhere can still be deleted here.
    pub async fn release(self) -> Result<bool, StoreError> {
        let current = self.store.get(&self.key).await?;
        if current.as_deref() != Some(self.token.as_bytes()) {
            warn!(key = %self.key, "Lease expired before release");
            return Ok(false);
        }
        self.store.del(&[self.key.clone()]).await?;
        Ok(true)
    }
}
