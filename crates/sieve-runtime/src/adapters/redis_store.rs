//! # Redis Store Adapter
//!
//! [`KeyValueStore`] over a Redis server, shared by every runtime instance
//! pointed at the same URL. Each port method is one Redis command, so the
//! per-call atomicity the port promises is Redis's own.
//!
//! Every call is bounded by the configured timeout and fails with
//! `StoreError::Timeout` when it elapses. The connection manager reconnects
//! on its own after a dropped connection; calls made while it is down fail
//! with `StoreError::Unavailable`.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{Client, RedisError, Value};
use shared_types::{KeyValueStore, ScanCursor, ScanPage, StoreError};
use tracing::{debug, info};

pub struct RedisStore {
    conn: ConnectionManager,
    timeout: Duration,
}

impl RedisStore {
    /// Connect to `url` (`redis://host:port/db`).
    pub async fn connect(url: &str, timeout: Duration) -> Result<Self, StoreError> {
        let client = Client::open(url).map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let conn = bounded(timeout, "connect", async {
            ConnectionManager::new(client)
                .await
                .map_err(|e| StoreError::Unavailable(e.to_string()))
        })
        .await?;
        info!(timeout_ms = timeout.as_millis() as u64, "Connected to Redis store");
        Ok(Self { conn, timeout })
    }

    async fn query<T: redis::FromRedisValue + Send>(
        &self,
        operation: &'static str,
        key: &str,
        expected: &'static str,
        cmd: redis::Cmd,
    ) -> Result<T, StoreError> {
        let mut conn = self.conn.clone();
        bounded(self.timeout, operation, async move {
            cmd.query_async(&mut conn)
                .await
                .map_err(|e| classify(e, operation, key, expected))
        })
        .await
    }
}

/// Run `call`, failing with `Timeout` once `limit` elapses.
pub(crate) async fn bounded<T, F>(
    limit: Duration,
    operation: &'static str,
    call: F,
) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => {
            debug!(operation, "Store call timed out");
            Err(StoreError::Timeout { operation })
        }
    }
}

fn classify(err: RedisError, operation: &'static str, key: &str, expected: &'static str) -> StoreError {
    if err.code() == Some("WRONGTYPE") {
        StoreError::WrongType {
            key: key.to_string(),
            expected,
        }
    } else if err.is_timeout() {
        StoreError::Timeout { operation }
    } else {
        StoreError::Unavailable(err.to_string())
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX).max(1)
}

/// `MATCH` pattern selecting keys that start with `prefix` literally.
fn prefix_pattern(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('*');
    pattern
}

/// `PTTL` reply: -2 absent, -1 no expiry.
fn decode_pttl(reply: i64) -> Option<Duration> {
    u64::try_from(reply).ok().map(Duration::from_millis)
}

fn set_cmd(key: &str, value: Vec<u8>, ttl: Option<Duration>, only_if_absent: bool) -> redis::Cmd {
    let mut cmd = redis::cmd("SET");
    cmd.arg(key).arg(value);
    if only_if_absent {
        cmd.arg("NX");
    }
    if let Some(ttl) = ttl {
        cmd.arg("PX").arg(millis(ttl));
    }
    cmd
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let mut cmd = redis::cmd("GET");
        cmd.arg(key);
        self.query("get", key, "blob", cmd).await
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<(), StoreError> {
        self.query("set", key, "blob", set_cmd(key, value, ttl, false))
            .await
    }

    async fn set_if_absent(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> Result<bool, StoreError> {
        let reply: Value = self
            .query("set_if_absent", key, "blob", set_cmd(key, value, ttl, true))
            .await?;
        Ok(!matches!(reply, Value::Nil))
    }

    async fn del(&self, keys: &[String]) -> Result<u64, StoreError> {
        let Some(first) = keys.first() else {
            return Ok(0);
        };
        let mut cmd = redis::cmd("DEL");
        for key in keys {
            cmd.arg(key);
        }
        self.query("del", first, "any", cmd).await
    }

    async fn scan(
        &self,
        cursor: &ScanCursor,
        prefix: &str,
        count: usize,
    ) -> Result<ScanPage, StoreError> {
        let position = if cursor.is_start() { "0" } else { cursor.token() };
        let mut cmd = redis::cmd("SCAN");
        cmd.arg(position)
            .arg("MATCH")
            .arg(prefix_pattern(prefix))
            .arg("COUNT")
            .arg(count.max(1));
        let (next, keys): (String, Vec<String>) = self.query("scan", prefix, "any", cmd).await?;
        Ok(ScanPage {
            next: (next != "0").then(|| ScanCursor::from_token(next)),
            keys,
        })
    }

    async fn sadd(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        let mut cmd = redis::cmd("SADD");
        cmd.arg(key).arg(member);
        let added: i64 = self.query("sadd", key, "set", cmd).await?;
        Ok(added == 1)
    }

    async fn scard(&self, key: &str) -> Result<u64, StoreError> {
        let mut cmd = redis::cmd("SCARD");
        cmd.arg(key);
        self.query("scard", key, "set", cmd).await
    }

    async fn incr(&self, key: &str) -> Result<i64, StoreError> {
        let mut cmd = redis::cmd("INCR");
        cmd.arg(key);
        self.query("incr", key, "integer", cmd).await
    }

    async fn hincrby(&self, key: &str, field: &str, delta: i64) -> Result<i64, StoreError> {
        let mut cmd = redis::cmd("HINCRBY");
        cmd.arg(key).arg(field).arg(delta);
        self.query("hincrby", key, "hash", cmd).await
    }

    async fn hgetall(&self, key: &str) -> Result<Vec<(String, i64)>, StoreError> {
        let mut cmd = redis::cmd("HGETALL");
        cmd.arg(key);
        let fields: HashMap<String, i64> = self.query("hgetall", key, "hash", cmd).await?;
        let mut pairs: Vec<_> = fields.into_iter().collect();
        pairs.sort();
        Ok(pairs)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, StoreError> {
        let mut cmd = redis::cmd("PEXPIRE");
        cmd.arg(key).arg(millis(ttl));
        let applied: i64 = self.query("expire", key, "any", cmd).await?;
        Ok(applied == 1)
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>, StoreError> {
        let mut cmd = redis::cmd("PTTL");
        cmd.arg(key);
        let reply: i64 = self.query("ttl", key, "any", cmd).await?;
        Ok(decode_pttl(reply))
    }
}
