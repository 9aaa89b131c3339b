//! # SV-03 Tally Engine
//!
//! Periodic batch that turns the report ledger into filter promotions.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): `TallyConfig`, run reports, publication payloads
//! - **Ports Layer** (`ports/`): `TallyApi` (inbound); ledger and store (outbound)
//! - **Service Layer** (`service/`): `TallyEngine`, `SnapshotRepository`, `UploadQueue`
//!
//! ## Invariants
//!
//! - The snapshot is persisted before any ledger record or queued upload is deleted
//! - Every scanned record is deleted, promoted or not
//! - Persisted versions strictly increase
//! - The engine must not run concurrently with itself; callers hold a lease
//!
//! ## Usage Example
//!
//! ```ignore
//! use sv_03_tally_engine::{TallyApi, TallyConfig, TallyEngine};
//!
//! let engine = TallyEngine::new(ledger, store, TallyConfig::default());
//! let report = engine.run().await?;
//! ```

pub mod domain;
pub mod error;
pub mod metrics;
pub mod ports;
pub mod service;

pub use domain::{
    MergeReport, PublicationConfig, PublicationPayload, TallyConfig, TallyReport,
};
pub use error::TallyError;
pub use metrics::{MetricsRecorder, NoOpMetrics, TallyMetrics, TallyMetricsSnapshot};
pub use ports::TallyApi;
pub use service::{SnapshotRepository, TallyEngine, UploadQueue};
