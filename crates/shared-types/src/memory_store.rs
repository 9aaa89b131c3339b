//! # In-Memory Key-Value Store
//!
//! Single-process adapter for [`KeyValueStore`]. Every operation runs under
//! one mutex, so each call is atomic the same way a Redis command is.
//!
//! Expiry is measured with `tokio::time::Instant`, which lets tests drive
//! TTLs with `tokio::time::pause()` and `advance()`.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::ops::Bound;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;

use crate::errors::StoreError;
use crate::store::{KeyValueStore, ScanCursor, ScanPage};

#[derive(Clone, Debug)]
enum Value {
    Blob(Vec<u8>),
    Int(i64),
    Set(HashSet<String>),
    Hash(HashMap<String, i64>),
}

#[derive(Clone, Debug)]
struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn new(value: Value, ttl: Option<Duration>) -> Self {
        Self {
            value,
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        }
    }

    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| at > now)
    }
}

/// In-memory key-value store for tests and single-node deployments.
#[derive(Default)]
pub struct InMemoryKvStore {
    data: Mutex<BTreeMap<String, Entry>>,
    unavailable: AtomicBool,
}

impl InMemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with `StoreError::Unavailable`.
    ///
    /// Used to exercise outage paths without a real network store.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.data.lock().values().filter(|e| e.is_live(now)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("in-memory store offline".to_string()));
        }
        Ok(())
    }

    /// Run `f` against the live entry for `key`, purging it first if expired.
    fn with_live<T>(
        &self,
        key: &str,
        f: impl FnOnce(&mut BTreeMap<String, Entry>) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        self.check_available()?;
        let mut data = self.data.lock();
        let now = Instant::now();
        if data.get(key).is_some_and(|e| !e.is_live(now)) {
            data.remove(key);
        }
        f(&mut data)
    }
}

fn wrong_type(key: &str, expected: &'static str) -> StoreError {
    StoreError::WrongType {
        key: key.to_string(),
        expected,
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.with_live(key, |data| match data.get(key) {
            None => Ok(None),
            Some(Entry {
                value: Value::Blob(bytes),
                ..
            }) => Ok(Some(bytes.clone())),
            Some(Entry {
                value: Value::Int(n),
                ..
            }) => Ok(Some(n.to_string().into_bytes())),
            Some(_) => Err(wrong_type(key, "blob")),
        })
    }

    async fn set(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> Result<(), StoreError> {
        self.with_live(key, |data| {
            data.insert(key.to_string(), Entry::new(Value::Blob(value), ttl));
            Ok(())
        })
    }

    async fn set_if_absent(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> Result<bool, StoreError> {
        self.with_live(key, |data| {
            if data.contains_key(key) {
                return Ok(false);
            }
            data.insert(key.to_string(), Entry::new(Value::Blob(value), ttl));
            Ok(true)
        })
    }

    async fn del(&self, keys: &[String]) -> Result<u64, StoreError> {
        self.check_available()?;
        let mut data = self.data.lock();
        let now = Instant::now();
        let mut removed = 0;
        for key in keys {
            if let Some(entry) = data.remove(key) {
                if entry.is_live(now) {
                    removed += 1;
                }
            }
        }
        Ok(removed)
    }

    async fn scan(
        &self,
        cursor: &ScanCursor,
        prefix: &str,
        count: usize,
    ) -> Result<ScanPage, StoreError> {
        self.check_available()?;
        let data = self.data.lock();
        let now = Instant::now();
        let lower = if cursor.is_start() {
            Bound::Included(prefix)
        } else {
            Bound::Excluded(cursor.token())
        };

        let mut keys = Vec::new();
        let mut last_seen = None;
        for (key, entry) in data.range::<str, _>((lower, Bound::Unbounded)) {
            if !key.starts_with(prefix) {
                return Ok(ScanPage { next: None, keys });
            }
            if keys.len() == count.max(1) {
                return Ok(ScanPage {
                    next: last_seen.map(ScanCursor::from_token),
                    keys,
                });
            }
            last_seen = Some(key.clone());
            if entry.is_live(now) {
                keys.push(key.clone());
            }
        }
        Ok(ScanPage { next: None, keys })
    }

    async fn sadd(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        self.with_live(key, |data| {
            let entry = data
                .entry(key.to_string())
                .or_insert_with(|| Entry::new(Value::Set(HashSet::new()), None));
            match &mut entry.value {
                Value::Set(members) => Ok(members.insert(member.to_string())),
                _ => Err(wrong_type(key, "set")),
            }
        })
    }

    async fn scard(&self, key: &str) -> Result<u64, StoreError> {
        self.with_live(key, |data| match data.get(key) {
            None => Ok(0),
            Some(Entry {
                value: Value::Set(members),
                ..
            }) => Ok(members.len() as u64),
            Some(_) => Err(wrong_type(key, "set")),
        })
    }

    async fn incr(&self, key: &str) -> Result<i64, StoreError> {
        self.with_live(key, |data| {
            let entry = data
                .entry(key.to_string())
                .or_insert_with(|| Entry::new(Value::Int(0), None));
            match &mut entry.value {
                Value::Int(n) => {
                    *n += 1;
                    Ok(*n)
                }
                _ => Err(wrong_type(key, "integer")),
            }
        })
    }

    async fn hincrby(&self, key: &str, field: &str, delta: i64) -> Result<i64, StoreError> {
        self.with_live(key, |data| {
            let entry = data
                .entry(key.to_string())
                .or_insert_with(|| Entry::new(Value::Hash(HashMap::new()), None));
            match &mut entry.value {
                Value::Hash(fields) => {
                    let slot = fields.entry(field.to_string()).or_insert(0);
                    *slot += delta;
                    Ok(*slot)
                }
                _ => Err(wrong_type(key, "hash")),
            }
        })
    }

    async fn hgetall(&self, key: &str) -> Result<Vec<(String, i64)>, StoreError> {
        self.with_live(key, |data| match data.get(key) {
            None => Ok(Vec::new()),
            Some(Entry {
                value: Value::Hash(fields),
                ..
            }) => {
                let mut pairs: Vec<_> = fields.iter().map(|(k, v)| (k.clone(), *v)).collect();
                pairs.sort();
                Ok(pairs)
            }
            Some(_) => Err(wrong_type(key, "hash")),
        })
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, StoreError> {
        self.with_live(key, |data| match data.get_mut(key) {
            None => Ok(false),
            Some(entry) => {
                entry.expires_at = Some(Instant::now() + ttl);
                Ok(true)
            }
        })
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>, StoreError> {
        self.with_live(key, |data| {
            Ok(data
                .get(key)
                .and_then(|e| e.expires_at)
                .map(|at| at.saturating_duration_since(Instant::now())))
        })
    }
}
