//! # Report-Sieve Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/          # criterion benchmarks for filter hot paths
//! └── src/integration/  # cross-crate flows over the in-memory store
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p sv-tests
//! cargo test -p sv-tests integration::tally_flows
//! cargo bench -p sv-tests
//! ```

pub mod integration;
