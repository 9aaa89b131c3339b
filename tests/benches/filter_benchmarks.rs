//! # Filter Benchmarks
//!
//! Costs of the operations that run per report and per tally:
//! - add/check: O(k) probes over the production shape (492,320 bits, k = 5)
//! - merge: O(m/32) word ORs
//! - estimate_count: O(m/32) popcounts
//! - snapshot encode/decode: the wire format clients download
//! - tally run: one pass over a ledger of pending targets
//!
//! ```bash
//! cargo bench --package sv-tests --bench filter_benchmarks -- filter/add
//! ```

use std::sync::Arc;
use std::time::Duration;

use criterion::{
    black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared_types::{FixedWindowRateLimiter, InMemoryKvStore, RateLimitConfig};
use sv_01_bloom_filter::{
    BloomFilter, BloomFilterSnapshot, FilterConfig, IdentifierEncoding, SnapshotVersion,
};
use sv_02_report_ledger::{ReportLedger, ReportLedgerApi};
use sv_03_tally_engine::{TallyApi, TallyConfig, TallyEngine};

fn hex_ids(count: usize, seed: u64) -> Vec<String> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count).map(|_| format!("{:032x}", rng.gen::<u128>())).collect()
}

fn populated(config: &FilterConfig, ids: &[String]) -> BloomFilter {
    let mut filter = config.empty_filter().expect("valid config");
    for id in ids {
        filter.add(id).expect("valid id");
    }
    filter
}

fn bench_add(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter/add");
    let ids = hex_ids(1000, 1);

    for k in [1u32, 5, 10] {
        let config = FilterConfig {
            hash_count: k,
            ..Default::default()
        };
        group.throughput(Throughput::Elements(ids.len() as u64));
        group.bench_with_input(BenchmarkId::new("hex_1000", k), &config, |b, config| {
            b.iter_batched(
                || config.empty_filter().expect("valid config"),
                |mut filter| {
                    for id in &ids {
                        filter.add(black_box(id)).expect("valid id");
                    }
                    filter
                },
                BatchSize::LargeInput,
            )
        });
    }

    let text = FilterConfig {
        encoding: IdentifierEncoding::Text,
        ..Default::default()
    };
    group.bench_function("text_single", |b| {
        let mut filter = text.empty_filter().expect("valid config");
        b.iter(|| filter.add(black_box("reported-profile-0042")))
    });

    group.finish();
}

fn bench_check(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter/check");
    let config = FilterConfig::default();
    let members = hex_ids(10_000, 2);
    let filter = populated(&config, &members);
    let strangers = hex_ids(10_000, 3);

    group.throughput(Throughput::Elements(1));
    group.bench_function("member", |b| {
        let mut i = 0;
        b.iter(|| {
            i = (i + 1) % members.len();
            filter.check(black_box(&members[i]))
        })
    });
    group.bench_function("non_member", |b| {
        let mut i = 0;
        b.iter(|| {
            i = (i + 1) % strangers.len();
            filter.check(black_box(&strangers[i]))
        })
    });

    group.finish();
}

fn bench_merge_and_estimate(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter/bulk");
    let config = FilterConfig::default();
    let a = populated(&config, &hex_ids(5_000, 4));
    let b_filter = populated(&config, &hex_ids(5_000, 5));

    group.throughput(Throughput::Bytes((config.capacity_bits / 8) as u64));
    group.bench_function("merge", |b| {
        b.iter_batched(
            || a.clone(),
            |mut target| {
                target.merge(black_box(&b_filter)).expect("same shape");
                target
            },
            BatchSize::LargeInput,
        )
    });
    group.bench_function("estimate_count", |b| b.iter(|| black_box(&a).estimate_count()));

    group.finish();
}

fn bench_snapshot(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter/snapshot");
    let config = FilterConfig::default();
    let filter = populated(&config, &hex_ids(5_000, 6));
    let snapshot = BloomFilterSnapshot::from_filter(&filter, SnapshotVersion::next_after(None));
    let json = snapshot.to_json().expect("serializable");

    group.throughput(Throughput::Bytes(json.len() as u64));
    group.bench_function("encode", |b| b.iter(|| black_box(&snapshot).to_json()));
    group.bench_function("decode", |b| {
        b.iter(|| {
            BloomFilterSnapshot::from_json(black_box(&json))
                .and_then(|s| s.into_filter(&config))
        })
    });

    group.finish();
}

fn bench_tally_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("tally/run");
    group.measurement_time(Duration::from_secs(10));
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("tokio runtime");

    for targets in [100usize, 1_000] {
        let ids = hex_ids(targets, 7);
        group.throughput(Throughput::Elements(targets as u64));
        group.bench_with_input(BenchmarkId::new("pending_targets", targets), &ids, |b, ids| {
            b.iter_batched(
                || {
                    rt.block_on(async {
                        let store = Arc::new(InMemoryKvStore::new());
                        let limiter = Arc::new(FixedWindowRateLimiter::new(
                            store.clone(),
                            RateLimitConfig {
                                limit: u64::MAX,
                                ..Default::default()
                            },
                        ));
                        let ledger = Arc::new(ReportLedger::new(store.clone(), limiter));
                        for (n, id) in ids.iter().enumerate() {
                            // every other target crosses the threshold
                            let reporters = if n % 2 == 0 { 5 } else { 2 };
                            for r in 0..reporters {
                                ledger
                                    .ingest(&format!("reporter-{}", r), id)
                                    .await
                                    .expect("accepted");
                            }
                        }
                        TallyEngine::new(ledger, store, TallyConfig::default())
                    })
                },
                |engine| rt.block_on(engine.run()).expect("tally succeeds"),
                BatchSize::PerIteration,
            )
        });
    }

    group.finish();
}

criterion_group!(
    name = filter_benches;
    config = Criterion::default()
        .sample_size(50)
        .measurement_time(Duration::from_secs(5));
    targets =
        bench_add,
        bench_check,
        bench_merge_and_estimate,
        bench_snapshot,
        bench_tally_run,
);

criterion_main!(filter_benches);
