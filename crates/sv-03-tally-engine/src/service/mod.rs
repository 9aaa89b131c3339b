//! Service Layer
//!
//! - `TallyEngine`: tally and merge runs over the shared snapshot
//! - `SnapshotRepository`: load/persist of the snapshot key
//! - `UploadQueue`: durable queue of submitted snapshots

pub mod snapshot_repository;
pub mod tally_engine;
pub mod upload_queue;

pub use snapshot_repository::{LoadedSnapshot, SnapshotRepository};
pub use tally_engine::TallyEngine;
pub use upload_queue::{QueuedUpload, UploadPage, UploadQueue};
