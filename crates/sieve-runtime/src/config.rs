//! # Runtime Configuration
//!
//! Defaults for every subsystem, overridden by `SIEVE_*` environment
//! variables. A variable that is set but cannot be parsed is an error; the
//! process refuses to start with a half-applied configuration.

use std::path::PathBuf;
use std::time::Duration;

use shared_types::RateLimitConfig;
use sv_01_bloom_filter::{FilterConfig, FilterError, IdentifierEncoding};
use sv_02_report_ledger::{LedgerConfig, UsageConfig};
use sv_03_tally_engine::{PublicationConfig, TallyConfig};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var}={value:?} is invalid: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("Invalid filter shape: {0}")]
    Filter(#[from] FilterError),
}

/// Complete runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub filter: FilterConfig,
    pub ledger: LedgerConfig,
    pub usage: UsageConfig,
    pub rate_limit: RateLimitConfig,
    pub tally: TallyConfig,
    pub publication: PublicationConfig,
    /// Time between scheduled tally passes
    pub tally_interval: Duration,
    /// Key of the lease guarding tally passes
    pub lease_key: String,
    /// Lease expiry; must exceed the longest expected pass
    pub lease_ttl: Duration,
    /// Root of the filesystem publication target; `None` disables publishing
    pub publish_dir: Option<PathBuf>,
    /// `redis://` URL of the shared store every instance connects to
    pub store_url: Option<String>,
    /// Deadline for a single store call
    pub store_timeout: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            filter: FilterConfig::default(),
            ledger: LedgerConfig::default(),
            usage: UsageConfig::default(),
            rate_limit: RateLimitConfig::default(),
            tally: TallyConfig::default(),
            publication: PublicationConfig::default(),
            tally_interval: Duration::from_secs(60 * 60),
            lease_key: "lock:tally".to_string(),
            lease_ttl: Duration::from_secs(10 * 60),
            publish_dir: None,
            store_url: None,
            store_timeout: Duration::from_secs(2),
        }
    }
}

impl RuntimeConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load using `lookup` to resolve variable names.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let env = Env { lookup: &lookup };

        if let Some(bits) = env.parse("SIEVE_FILTER_BITS")? {
            config.filter.capacity_bits = bits;
        }
        if let Some(k) = env.parse("SIEVE_HASH_COUNT")? {
            config.filter.hash_count = k;
        }
        if let Some(encoding) = env.get("SIEVE_IDENTIFIER_ENCODING") {
            config.filter.encoding = match encoding.to_ascii_lowercase().as_str() {
                "hex" => IdentifierEncoding::Hex,
                "text" => IdentifierEncoding::Text,
                _ => return Err(env.invalid("SIEVE_IDENTIFIER_ENCODING", encoding, "expected hex or text")),
            };
        }
        config.filter.validate()?;

        if let Some(threshold) = env.parse("SIEVE_REPORT_THRESHOLD")? {
            config.tally.report_threshold = threshold;
        }
        if let Some(key) = env.get("SIEVE_SNAPSHOT_KEY") {
            config.tally.snapshot_key = key;
        }
        if let Some(secs) = env.parse("SIEVE_RECORD_TTL_SECS")? {
            config.ledger.record_ttl = Duration::from_secs(secs);
            config.usage.record_ttl = Duration::from_secs(secs);
        }
        if let Some(limit) = env.parse("SIEVE_RATE_LIMIT")? {
            config.rate_limit.limit = limit;
        }
        if let Some(secs) = env.parse("SIEVE_RATE_WINDOW_SECS")? {
            config.rate_limit.window = Duration::from_secs(secs);
        }
        if let Some(secs) = env.parse::<u64>("SIEVE_TALLY_INTERVAL_SECS")? {
            if secs == 0 {
                return Err(env.invalid("SIEVE_TALLY_INTERVAL_SECS", secs.to_string(), "must be positive"));
            }
            config.tally_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = env.parse("SIEVE_LEASE_TTL_SECS")? {
            config.lease_ttl = Duration::from_secs(secs);
        }
        if let Some(dir) = env.get("SIEVE_PUBLISH_DIR") {
            config.publish_dir = Some(PathBuf::from(dir));
        }
        if let Some(url) = env.get("SIEVE_STORE_URL") {
            if !url.starts_with("redis://") {
                return Err(env.invalid("SIEVE_STORE_URL", url, "expected a redis:// URL"));
            }
            config.store_url = Some(url);
        }
        if let Some(ms) = env.parse::<u64>("SIEVE_STORE_TIMEOUT_MS")? {
            if ms == 0 {
                return Err(env.invalid("SIEVE_STORE_TIMEOUT_MS", ms.to_string(), "must be positive"));
            }
            config.store_timeout = Duration::from_millis(ms);
        }
        if let Some(path) = env.get("SIEVE_PUBLISH_PATH") {
            config.publication.path = path;
        }
        if let Some(branch) = env.get("SIEVE_PUBLISH_BRANCH") {
            config.publication.branch = Some(branch);
        }

        // one filter shape everywhere
        config.ledger.encoding = config.filter.encoding;
        config.tally.filter = config.filter.clone();

        Ok(config)
    }
}

struct Env<'a, F: Fn(&str) -> Option<String>> {
    lookup: &'a F,
}

impl<F: Fn(&str) -> Option<String>> Env<'_, F> {
    fn get(&self, var: &str) -> Option<String> {
        (self.lookup)(var).filter(|v| !v.trim().is_empty())
    }

    fn parse<T>(&self, var: &'static str) -> Result<Option<T>, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(var) {
            None => Ok(None),
            Some(raw) => raw
                .trim()
                .parse()
                .map(Some)
                .map_err(|e: T::Err| self.invalid(var, raw, e.to_string())),
        }
    }

    fn invalid(&self, var: &'static str, value: String, reason: impl Into<String>) -> ConfigError {
        ConfigError::Invalid {
            var,
            value,
            reason: reason.into(),
        }
    }
}
