//! Encodings handed to the external harness and used for storage.
//!
//! The registry is exported as an ordered array of case descriptors:
//!
//! ```text
//! [{ "name": "...", "tags": [...], "setup": "...", "ops": [{ "op": "insert", "doc": {...} }] }]
//! ```

use crate::document::{DocValue, Document};
use crate::error::{Result, WorkloadError};
use crate::registry::{BenchmarkCase, Operation, Registry};
use serde::Serialize;
use smol_str::SmolStr;
use xxhash_rust::xxh64::xxh64;

/// Serializable view of one [`BenchmarkCase`]. Setup closures are exported
/// by label only.
#[derive(Debug, Serialize)]
pub struct CaseDescriptor<'a> {
    pub name: &'a str,
    pub tags: Vec<&'a str>,
    pub setup: &'a str,
    pub ops: &'a [Operation],
}

impl<'a> From<&'a BenchmarkCase> for CaseDescriptor<'a> {
    fn from(case: &'a BenchmarkCase) -> Self {
        Self {
            name: case.name(),
            tags: case.tags().iter().map(SmolStr::as_str).collect(),
            setup: case.setup_label(),
            ops: case.operations(),
        }
    }
}

fn descriptors(registry: &Registry) -> Vec<CaseDescriptor<'_>> {
    registry.iter().map(CaseDescriptor::from).collect()
}

pub fn to_json(registry: &Registry) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(&descriptors(registry))?)
}

pub fn to_cbor(registry: &Registry) -> Result<Vec<u8>> {
    encode_cbor(&descriptors(registry))
}

// ─── CBOR helpers ───────────────────────────────────────────────────────────

pub fn encode_cbor<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    cbor4ii::serde::to_writer(&mut buf, value)
        .map_err(|e| WorkloadError::Codec(e.to_string()))?;
    Ok(buf)
}

/// Decode a CBOR map produced by [`encode_cbor`] back into a document.
pub fn decode_document(bytes: &[u8]) -> Result<Document> {
    let value: cbor4ii::core::Value =
        cbor4ii::serde::from_slice(bytes).map_err(|e| WorkloadError::Codec(e.to_string()))?;
    match DocValue::try_from(value)? {
        DocValue::Object(map) => Ok(map),
        _ => Err(WorkloadError::Codec("stored value is not a document".into())),
    }
}

/// Stable 64-bit digest of a document's CBOR encoding.
pub fn fingerprint(doc: &Document) -> Result<u64> {
    Ok(xxh64(&encode_cbor(doc)?, 0))
}

/// Digest of a whole corpus, order-sensitive.
pub fn corpus_fingerprint(docs: &[Document]) -> Result<u64> {
    let mut buf = Vec::new();
    for doc in docs {
        buf.extend_from_slice(&fingerprint(doc)?.to_le_bytes());
    }
    Ok(xxh64(&buf, 0))
}
