//! # Sieve Runtime Library
//!
//! Exposes the runtime's modules for testing. The entry point is the
//! `main.rs` binary.
//!
//! - `adapters`: networked store backends (Redis)
//! - `config`: `RuntimeConfig` from `SIEVE_*` environment variables
//! - `lease`: leased lock keeping tally passes mutually exclusive
//! - `publisher`: conditional publication of snapshots
//! - `scheduler`: periodic merge, tally and publish pass
//! - `runtime`: wiring of every subsystem over one store

pub mod adapters;
pub mod config;
pub mod error;
pub mod lease;
pub mod publisher;
pub mod runtime;
pub mod scheduler;

pub use adapters::RedisStore;
pub use config::{ConfigError, RuntimeConfig};
pub use error::RuntimeError;
pub use lease::Lease;
pub use publisher::{FilesystemSink, PublicationSink, PublishError, PublishOutcome};
pub use runtime::SieveRuntime;
pub use scheduler::{SchedulerConfig, TallyScheduler, TickOutcome};
