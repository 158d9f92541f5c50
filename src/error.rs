// ─── Error ──────────────────────────────────────────────────────────────────
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkloadError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CBOR error: {0}")]
    Codec(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// An index with this name already exists with different options.
    #[error("index {0} already exists with different options")]
    IndexConflict(String),
    #[error("unknown benchmark case: {0}")]
    UnknownCase(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("setup for {case} failed: {source}")]
    Setup {
        case: String,
        #[source]
        source: Box<WorkloadError>,
    },
}

impl From<redb::DatabaseError> for WorkloadError {
    fn from(e: redb::DatabaseError) -> Self {
        WorkloadError::Redb(e.into())
    }
}

impl From<redb::TransactionError> for WorkloadError {
    fn from(e: redb::TransactionError) -> Self {
        WorkloadError::Redb(e.into())
    }
}

impl From<redb::TableError> for WorkloadError {
    fn from(e: redb::TableError) -> Self {
        WorkloadError::Redb(e.into())
    }
}

impl From<redb::CommitError> for WorkloadError {
    fn from(e: redb::CommitError) -> Self {
        WorkloadError::Redb(e.into())
    }
}

impl From<redb::StorageError> for WorkloadError {
    fn from(e: redb::StorageError) -> Self {
        WorkloadError::Redb(e.into())
    }
}

pub type Result<T, E = WorkloadError> = std::result::Result<T, E>;
