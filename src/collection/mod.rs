//! Handles to the store a benchmark case runs against.

pub mod db;
pub mod memory;

pub use db::RedbCollection;
pub use memory::MemoryCollection;

use crate::document::Document;
use crate::error::Result;
use crate::index::IndexSpec;

/// The operations setup procedures and operation replay need from a store.
///
/// Every call blocks until it has completed; a failure aborts the caller.
pub trait Collection {
    /// Remove every document and every index.
    fn drop_collection(&mut self) -> Result<()>;

    /// Insert `docs` and maintain all existing indexes.
    fn insert(&mut self, docs: &[Document]) -> Result<()>;

    /// Create an index and backfill it from the stored documents.
    ///
    /// Re-creating an identical index is a no-op; an index with the same
    /// name and different options is an [`IndexConflict`](crate::WorkloadError::IndexConflict).
    fn create_index(&mut self, spec: &IndexSpec) -> Result<()>;

    fn document_count(&self) -> Result<u64>;

    /// Total entries across all indexes.
    fn index_entry_count(&self) -> Result<u64>;
}
