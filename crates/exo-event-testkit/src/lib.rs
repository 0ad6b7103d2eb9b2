//! # exo-event testkit
//!
//! Conformance tooling for the exo event encoding.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: An append-only registry of events with pinned digests,
//!   plus the JSON vector file other implementations check themselves against
//! - **Conformance runner**: Drives vectors through any encoder and hasher and
//!   reports per-vector outcomes
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: Helpers for building small causal graphs
//!
//! ## Golden Vectors
//!
//! ```rust
//! use exo_event_testkit::runner::{ConformanceRunner, RunnerConfig};
//! use exo_event_testkit::vectors::builtin_registry;
//!
//! let runner = ConformanceRunner::reference(RunnerConfig::default());
//! let report = runner.run(&builtin_registry(), "builtin");
//! assert!(report.is_success());
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use exo_event_testkit::generators::EventParams;
//!
//! proptest! {
//!     #[test]
//!     fn event_id_is_deterministic(params: EventParams) {
//!         let e1 = params.build();
//!         let e2 = params.build();
//!         prop_assert_eq!(e1.compute_id().unwrap(), e2.compute_id().unwrap());
//!     }
//! }
//! ```

pub mod file;
pub mod fixtures;
pub mod generators;
pub mod record;
pub mod runner;
pub mod vectors;

pub use file::{load_vector_file, parse_vector_file, LoadError, VectorFile, VectorFormatError};
pub use fixtures::{multi_author_fixtures, simple_opaque_event, DagFixture};
pub use generators::EventParams;
pub use record::{EventRecord, PayloadRecord, RecordError};
pub use runner::{
    ConformanceMismatch, ConformanceReport, ConformanceRunner, ReportStyle, RunnerConfig,
    VectorOutcome,
};
pub use vectors::{all_vectors, builtin_registry, GoldenVector, Registry, RegistryError};
