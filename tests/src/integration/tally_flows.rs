//! # Tally Flows
//!
//! End-to-end: reports in, tally run, filter and ledger state out.
//!
//! ```text
//! reporters ──ingest──→ ReportLedger ──scan──→ TallyEngine ──persist──→ snapshot
//!                            ↑                      │
//!                            └──────── clear ───────┘
//! ```

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::{random_hex_ids, small_filter_config, Pipeline};
    use shared_types::{KeyValueStore, RateLimitConfig};
    use sv_01_bloom_filter::{BloomFilterSnapshot, SnapshotVersion};
    use sv_02_report_ledger::ReportLedgerApi;
    use sv_03_tally_engine::{TallyApi, TallyConfig};

    #[tokio::test]
    async fn test_five_reporters_promote_target() {
        let pipeline = Pipeline::new();
        pipeline.report("deadbeef", 5).await;

        let report = pipeline.engine.run().await.unwrap();

        assert_eq!(report.promoted, 1);
        assert!(pipeline.published_filter().await.check("deadbeef").unwrap());
        assert!(pipeline.ledger_targets().await.is_empty());
        assert_eq!(pipeline.store.scard("report:deadbeef").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_four_reporters_are_discarded() {
        let pipeline = Pipeline::new();
        pipeline.report("cafebabe", 4).await;

        let report = pipeline.engine.run().await.unwrap();

        assert_eq!(report.discarded, 1);
        assert!(!pipeline.published_filter().await.check("cafebabe").unwrap());
        assert!(pipeline.ledger_targets().await.is_empty());

        // not carried forward: one more reporter next cycle is not enough
        pipeline.report("cafebabe", 1).await;
        pipeline.engine.run().await.unwrap();
        assert!(!pipeline.published_filter().await.check("cafebabe").unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_reports_do_not_reach_threshold() {
        let pipeline = Pipeline::with(
            RateLimitConfig {
                limit: 100,
                ..Default::default()
            },
            TallyConfig::default(),
        );
        for _ in 0..10 {
            pipeline.ledger.ingest("alice", "deadbeef").await.unwrap();
        }

        pipeline.engine.run().await.unwrap();

        assert!(!pipeline.published_filter().await.check("deadbeef").unwrap());
    }

    #[tokio::test]
    async fn test_rerun_after_success_is_noop() {
        let pipeline = Pipeline::new();
        pipeline.report("deadbeef", 5).await;
        pipeline.engine.run().await.unwrap();
        let after_first = pipeline.published_filter().await;

        let second = pipeline.engine.run().await.unwrap();

        assert_eq!(second.scanned, 0);
        assert_eq!(pipeline.published_filter().await, after_first);
    }

    #[tokio::test]
    async fn test_promotions_accumulate_across_runs() {
        let pipeline = Pipeline::with(
            RateLimitConfig {
                limit: 1_000,
                ..Default::default()
            },
            TallyConfig {
                report_threshold: 2,
                filter: small_filter_config(),
                ..Default::default()
            },
        );
        let ids = random_hex_ids(40, 9);

        for chunk in ids.chunks(10) {
            for id in chunk {
                pipeline.report(id, 2).await;
            }
            pipeline.engine.run().await.unwrap();
        }

        let filter = pipeline.published_filter().await;
        for id in &ids {
            assert!(filter.check(id).unwrap(), "lost promotion of {}", id);
        }
    }

    #[tokio::test]
    async fn test_legacy_snapshot_is_extended_not_replaced() {
        let pipeline = Pipeline::new();
        let mut legacy = pipeline.engine.config().filter.empty_filter().unwrap();
        legacy.add("01d0").unwrap();
        // older writers emitted signed words under a different field name
        let words: Vec<String> = legacy
            .buckets()
            .iter()
            .map(|w| (*w as i32).to_string())
            .collect();
        let json = format!(
            r#"{{"version":"2024-11-03","reportedUsers":[{}]}}"#,
            words.join(",")
        );
        let legacy_version = BloomFilterSnapshot::from_json(json.as_bytes())
            .unwrap()
            .version;
        pipeline
            .store
            .set("bloomfilter:global", json.into_bytes(), None)
            .await
            .unwrap();
        pipeline.report("deadbeef", 5).await;

        let report = pipeline.engine.run().await.unwrap();

        assert!(!report.recovered_snapshot);
        assert!(report.version.unwrap() > legacy_version);
        let filter = pipeline.published_filter().await;
        assert!(filter.check("01d0").unwrap());
        assert!(filter.check("deadbeef").unwrap());
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_recovered_as_empty() {
        let pipeline = Pipeline::new();
        pipeline
            .store
            .set("bloomfilter:global", b"{\"buckets\":\"oops\"}".to_vec(), None)
            .await
            .unwrap();
        pipeline.report("deadbeef", 5).await;

        let report = pipeline.engine.run().await.unwrap();

        assert!(report.recovered_snapshot);
        assert!(pipeline.published_filter().await.check("deadbeef").unwrap());
    }

    #[tokio::test]
    async fn test_store_outage_mid_cycle_loses_nothing() {
        let pipeline = Pipeline::new();
        pipeline.report("deadbeef", 5).await;
        pipeline.store.set_unavailable(true);

        assert!(pipeline.engine.run().await.is_err());

        pipeline.store.set_unavailable(false);
        assert_eq!(pipeline.ledger_targets().await, vec!["deadbeef".to_string()]);
        let retry = pipeline.engine.run().await.unwrap();
        assert_eq!(retry.promoted, 1);
    }

    #[tokio::test]
    async fn test_uploaded_snapshot_merges_into_global_filter() {
        let pipeline = Pipeline::new();
        pipeline.report("deadbeef", 5).await;
        pipeline.engine.run().await.unwrap();

        let mut peer = pipeline.engine.config().filter.empty_filter().unwrap();
        peer.add("feedface").unwrap();
        let upload = BloomFilterSnapshot::from_filter(&peer, SnapshotVersion::next_after(None))
            .to_json()
            .unwrap();
        pipeline
            .engine
            .upload_queue()
            .enqueue_json(&upload)
            .await
            .unwrap();

        let merged = pipeline.engine.merge_uploads().await.unwrap();

        assert_eq!(merged.merged, 1);
        let filter = pipeline.published_filter().await;
        assert!(filter.check("deadbeef").unwrap());
        assert!(filter.check("feedface").unwrap());
        assert_eq!(pipeline.engine.merge_uploads().await.unwrap().merged, 0);
    }
}
