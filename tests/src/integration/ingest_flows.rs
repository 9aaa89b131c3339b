//! # Ingestion Flows
//!
//! Ledger behaviour as seen from the ingestion boundary: reporter dedup,
//! rate limiting, and concurrent reporters.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::integration::fixtures::Pipeline;
    use shared_types::KeyValueStore;
    use sv_02_report_ledger::{LedgerError, ReportLedgerApi};

    #[tokio::test]
    async fn test_same_pair_twice_is_duplicate_with_unchanged_count() {
        let pipeline = Pipeline::new();

        let first = pipeline.ledger.ingest("alice", "deadbeef").await.unwrap();
        let second = pipeline.ledger.ingest("alice", "deadbeef").await.unwrap();

        assert_eq!(first.count, 1);
        assert_eq!(second.count, 1);
        assert!(second.duplicate);
    }

    #[tokio::test]
    async fn test_sixth_report_in_window_is_rate_limited() {
        let pipeline = Pipeline::new();
        for i in 0..5 {
            pipeline
                .ledger
                .ingest("alice", &format!("00{:02x}", i))
                .await
                .unwrap();
        }
        let before = pipeline.store.scard("report:0004").await.unwrap();

        let err = pipeline.ledger.ingest("alice", "0004").await.unwrap_err();

        assert!(matches!(err, LedgerError::RateLimited { .. }));
        assert_eq!(pipeline.store.scard("report:0004").await.unwrap(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_window_reopens() {
        let pipeline = Pipeline::new();
        for i in 0..5 {
            pipeline
                .ledger
                .ingest("alice", &format!("{:04x}", i))
                .await
                .unwrap();
        }
        assert!(pipeline.ledger.ingest("alice", "ffff").await.is_err());

        tokio::time::advance(std::time::Duration::from_secs(61)).await;

        assert!(pipeline.ledger.ingest("alice", "ffff").await.is_ok());
    }

    #[tokio::test]
    async fn test_concurrent_reporters_count_exactly() {
        let pipeline = Arc::new(Pipeline::new());

        let tasks: Vec<_> = (0..50)
            .map(|i| {
                let pipeline = pipeline.clone();
                tokio::spawn(async move {
                    let reporter = format!("reporter-{}", i);
                    // every reporter reports twice; only the first counts
                    pipeline.ledger.ingest(&reporter, "cafebabe").await.unwrap();
                    pipeline.ledger.ingest(&reporter, "cafebabe").await.unwrap();
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(pipeline.store.scard("report:cafebabe").await.unwrap(), 50);
    }
}
