//! Persisted filter snapshot
//!
//! Wire format, JSON:
//!
//! ```text
//! { "version": "2024-06-02T00:00:00.000Z", "buckets": [ <u32>, ... ] }
//! ```
//!
//! Older writers used the field name `reportedUsers`, date-only or numeric
//! versions, and signed 32-bit words. All of these are accepted on read;
//! writes always use the format above.

use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, SecondsFormat, SubsecRound, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::bloom_filter::BloomFilter;
use super::config::FilterConfig;
use crate::error::FilterError;

/// Monotonically comparable stamp of the last snapshot mutation.
///
/// Held at millisecond precision, the precision it is written with, so a
/// stamp compares the same before and after a store round trip.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SnapshotVersion(DateTime<Utc>);

impl SnapshotVersion {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self(at.trunc_subsecs(3))
    }

    /// Current time, forced strictly past `previous`.
    pub fn next_after(previous: Option<SnapshotVersion>) -> Self {
        let now = Utc::now().trunc_subsecs(3);
        match previous {
            Some(prev) if now <= prev.0 => Self(prev.0 + Duration::milliseconds(1)),
            _ => Self(now),
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.0
    }

    /// `YYYY-MM-DD`, used to derive publication paths.
    pub fn date_label(&self) -> String {
        self.0.format("%Y-%m-%d").to_string()
    }

    fn parse(text: &str) -> Option<Self> {
        if let Ok(at) = DateTime::parse_from_rfc3339(text) {
            return Some(Self::new(at.with_timezone(&Utc)));
        }
        let date = NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()?;
        let midnight = date.and_hms_opt(0, 0, 0)?;
        Some(Self(Utc.from_utc_datetime(&midnight)))
    }
}

impl fmt::Display for SnapshotVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_rfc3339_opts(SecondsFormat::Millis, true))
    }
}

impl Serialize for SnapshotVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SnapshotVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Millis(i64),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Text(text) => SnapshotVersion::parse(&text).ok_or_else(|| {
                serde::de::Error::custom(format!("unrecognised version stamp {:?}", text))
            }),
            Raw::Millis(ms) => DateTime::from_timestamp_millis(ms)
                .map(SnapshotVersion)
                .ok_or_else(|| serde::de::Error::custom("version timestamp out of range")),
        }
    }
}

/// Serialized form of a Bloom filter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BloomFilterSnapshot {
    pub version: SnapshotVersion,
    #[serde(alias = "reportedUsers", deserialize_with = "words::deserialize")]
    pub buckets: Vec<u32>,
}

impl BloomFilterSnapshot {
    pub fn from_filter(filter: &BloomFilter, version: SnapshotVersion) -> Self {
        Self {
            version,
            buckets: filter.buckets().to_vec(),
        }
    }

    /// Rebuild a filter using `config` for `k` and encoding.
    pub fn to_filter(&self, config: &FilterConfig) -> Result<BloomFilter, FilterError> {
        config.filter_from_buckets(self.buckets.clone())
    }

    pub fn into_filter(self, config: &FilterConfig) -> Result<BloomFilter, FilterError> {
        config.filter_from_buckets(self.buckets)
    }

    /// Capacity in bits.
    pub fn m(&self) -> usize {
        self.buckets.len() * 32
    }

    pub fn to_json(&self) -> Result<Vec<u8>, FilterError> {
        serde_json::to_vec(self).map_err(|e| FilterError::SerializationError(e.to_string()))
    }

    /// Pretty JSON, the form handed to publication targets.
    pub fn to_json_pretty(&self) -> Result<Vec<u8>, FilterError> {
        serde_json::to_vec_pretty(self)
            .map_err(|e| FilterError::SerializationError(e.to_string()))
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, FilterError> {
        let snapshot: Self = serde_json::from_slice(bytes)
            .map_err(|e| FilterError::SerializationError(e.to_string()))?;
        if snapshot.buckets.is_empty() {
            return Err(FilterError::SerializationError(
                "snapshot has no buckets".to_string(),
            ));
        }
        Ok(snapshot)
    }
}

/// Bucket words written as either `u32` or two's-complement `i32`.
mod words {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u32>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Vec<i64> = Deserialize::deserialize(deserializer)?;
        raw.into_iter()
            .map(|word| {
                if let Ok(unsigned) = u32::try_from(word) {
                    Ok(unsigned)
                } else if let Ok(signed) = i32::try_from(word) {
                    Ok(signed as u32)
                } else {
                    Err(serde::de::Error::custom(format!(
                        "bucket word {} out of 32-bit range",
                        word
                    )))
                }
            })
            .collect()
    }
}
