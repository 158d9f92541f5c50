//! Deterministic document workloads for comparing an all-paths index with
//! per-field indexes.
//!
//! Documents are built from a fixed pool of field names by small index
//! arithmetic, so every run of the suite produces identical corpora and
//! identical operation lists.

pub mod collection;
pub mod config;
pub mod corpus;
pub mod document;
pub mod error;
pub mod index;
pub mod path;
pub mod registry;
pub mod suite;
pub mod wire;

pub use smol_str::SmolStr;

pub use collection::{Collection, MemoryCollection, RedbCollection};
pub use config::WorkloadConfig;
pub use document::{DocNumber, DocValue, Document};
pub use error::{Result, WorkloadError};
pub use index::{IndexSpec, IndexStrategy};
pub use path::{FieldNamePool, FieldPath, NestedShape};
pub use registry::{BenchmarkCase, Operation, Registry, Setup};
pub use suite::all_paths_suite;
