//! Shared wiring for integration flows.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared_types::{FixedWindowRateLimiter, InMemoryKvStore, RateLimitConfig};
use sv_01_bloom_filter::{BloomFilter, FilterConfig};
use sv_02_report_ledger::{LedgerConfig, ReportLedger, ReportLedgerApi};
use sv_03_tally_engine::{TallyApi, TallyConfig, TallyEngine};

pub type Ledger = ReportLedger<InMemoryKvStore, FixedWindowRateLimiter<InMemoryKvStore>>;
pub type Engine = TallyEngine<Ledger, InMemoryKvStore>;

pub struct Pipeline {
    pub store: Arc<InMemoryKvStore>,
    pub ledger: Arc<Ledger>,
    pub engine: Engine,
}

impl Pipeline {
    /// Default shapes: threshold 5, 5 reports per reporter per minute.
    pub fn new() -> Self {
        Self::with(RateLimitConfig::default(), TallyConfig::default())
    }

    pub fn with(rate_limit: RateLimitConfig, tally: TallyConfig) -> Self {
        let store = Arc::new(InMemoryKvStore::new());
        let limiter = Arc::new(FixedWindowRateLimiter::new(store.clone(), rate_limit));
        let ledger = Arc::new(ReportLedger::with_config(
            store.clone(),
            limiter,
            LedgerConfig {
                encoding: tally.filter.encoding,
                ..Default::default()
            },
        ));
        let engine = TallyEngine::new(ledger.clone(), store.clone(), tally);
        Self {
            store,
            ledger,
            engine,
        }
    }

    /// `reporters` distinct reporters each report `target` once.
    pub async fn report(&self, target: &str, reporters: usize) {
        for i in 0..reporters {
            self.ledger
                .ingest(&format!("198.51.100.{}", i), target)
                .await
                .expect("report accepted");
        }
    }

    pub async fn published_filter(&self) -> BloomFilter {
        self.engine
            .current_snapshot()
            .await
            .expect("store reachable")
            .expect("snapshot persisted")
            .into_filter(&self.engine.config().filter)
            .expect("valid snapshot")
    }

    pub async fn ledger_targets(&self) -> Vec<String> {
        use futures::TryStreamExt;
        let entries: Vec<_> = self
            .ledger
            .scan_all()
            .try_collect()
            .await
            .expect("scan succeeds");
        entries.into_iter().map(|e| e.target_id).collect()
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Distinct random 32-hex-char identifiers, deterministic per seed.
pub fn random_hex_ids(count: usize, seed: u64) -> Vec<String> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut ids = std::collections::HashSet::new();
    while ids.len() < count {
        ids.insert(format!("{:032x}", rng.gen::<u128>()));
    }
    ids.into_iter().collect()
}

pub fn small_filter_config() -> FilterConfig {
    FilterConfig {
        capacity_bits: 10_000,
        hash_count: 4,
        ..Default::default()
    }
}
