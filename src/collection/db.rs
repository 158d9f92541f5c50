use super::Collection;
use crate::document::Document;
use crate::error::{Result, WorkloadError};
use crate::index::{IndexKey, IndexSpec};
use crate::wire::{decode_document, encode_cbor};
use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, Table, TableDefinition,
    WriteTransaction,
};
use std::path::Path;
use tracing::debug;

// Table definitions
// documents: insertion id → CBOR-encoded document
// indexes: index name → JSON-encoded IndexSpec
// index_entries: encoded (index, path, value, id) → id
const DOCUMENTS_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("documents");
const INDEXES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("indexes");
const ENTRIES_TABLE: TableDefinition<&str, u64> = TableDefinition::new("index_entries");

const KEY_SEPARATOR: char = '\u{1f}';

fn entry_key(index: &str, key: &IndexKey, id: u64) -> String {
    format!(
        "{index}{KEY_SEPARATOR}{}{KEY_SEPARATOR}{}{KEY_SEPARATOR}{id:020}",
        key.path, key.value
    )
}

fn write_entries(
    entries: &mut Table<'_, &'static str, u64>,
    name: &str,
    spec: &IndexSpec,
    id: u64,
    doc: &Document,
) -> Result<()> {
    for key in spec.entries(doc) {
        entries.insert(entry_key(name, &key, id).as_str(), id)?;
    }
    Ok(())
}

/// Collection persisted in a redb file.
pub struct RedbCollection {
    db: Database,
}

impl RedbCollection {
    /// Open or create the collection file at `path`, making sure all tables
    /// exist.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let db = Database::create(path)?;

        let write_txn = db.begin_write()?;
        Self::open_tables(&write_txn)?;
        write_txn.commit()?;

        Ok(Self { db })
    }

    fn open_tables(txn: &WriteTransaction) -> Result<()> {
        let _ = txn.open_table(DOCUMENTS_TABLE)?;
        let _ = txn.open_table(INDEXES_TABLE)?;
        let _ = txn.open_table(ENTRIES_TABLE)?;
        Ok(())
    }

    fn load_indexes(txn: &WriteTransaction) -> Result<Vec<(String, IndexSpec)>> {
        let table = txn.open_table(INDEXES_TABLE)?;
        let mut indexes = Vec::new();
        for item in table.iter()? {
            let (name, spec) = item?;
            let spec: IndexSpec = serde_json::from_slice(spec.value())?;
            indexes.push((name.value().to_string(), spec));
        }
        Ok(indexes)
    }

    /// Read back a stored document by insertion id.
    pub fn get_document(&self, id: u64) -> Result<Option<Document>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(DOCUMENTS_TABLE)?;
        match table.get(id)? {
            Some(access) => Ok(Some(decode_document(access.value())?)),
            None => Ok(None),
        }
    }

    /// Names of all indexes, sorted.
    pub fn index_names(&self) -> Result<Vec<String>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(INDEXES_TABLE)?;
        let mut names = Vec::new();
        for item in table.iter()? {
            let (name, _) = item?;
            names.push(name.value().to_string());
        }
        Ok(names)
    }
}

impl Collection for RedbCollection {
    fn drop_collection(&mut self) -> Result<()> {
        let write_txn = self.db.begin_write()?;
        write_txn.delete_table(DOCUMENTS_TABLE)?;
        write_txn.delete_table(INDEXES_TABLE)?;
        write_txn.delete_table(ENTRIES_TABLE)?;
        Self::open_tables(&write_txn)?;
        write_txn.commit()?;
        debug!("collection dropped");
        Ok(())
    }

    fn insert(&mut self, docs: &[Document]) -> Result<()> {
        // Encode before opening the write transaction to keep it short.
        let encoded = docs.iter().map(encode_cbor).collect::<Result<Vec<_>>>()?;

        let write_txn = self.db.begin_write()?;
        let indexes = Self::load_indexes(&write_txn)?;
        {
            let mut table = write_txn.open_table(DOCUMENTS_TABLE)?;
            let mut entries = write_txn.open_table(ENTRIES_TABLE)?;
            let mut next_id = match table.last()? {
                Some((id, _)) => id.value() + 1,
                None => 0,
            };
            for (doc, bytes) in docs.iter().zip(&encoded) {
                table.insert(next_id, bytes.as_slice())?;
                for (name, spec) in &indexes {
                    write_entries(&mut entries, name, spec, next_id, doc)?;
                }
                next_id += 1;
            }
        }
        write_txn.commit()?;
        debug!(count = docs.len(), "documents inserted");
        Ok(())
    }

    fn create_index(&mut self, spec: &IndexSpec) -> Result<()> {
        let name = spec.name();
        let write_txn = self.db.begin_write()?;
        {
            let mut indexes = write_txn.open_table(INDEXES_TABLE)?;
            let existing = match indexes.get(name.as_str())? {
                Some(access) => Some(serde_json::from_slice::<IndexSpec>(access.value())?),
                None => None,
            };
            match existing {
                Some(existing) if existing == *spec => return Ok(()),
                Some(_) => return Err(WorkloadError::IndexConflict(name)),
                None => {}
            }
            indexes.insert(name.as_str(), serde_json::to_vec(spec)?.as_slice())?;

            let table = write_txn.open_table(DOCUMENTS_TABLE)?;
            let mut entries = write_txn.open_table(ENTRIES_TABLE)?;
            for item in table.iter()? {
                let (id, bytes) = item?;
                let doc = decode_document(bytes.value())?;
                write_entries(&mut entries, &name, spec, id.value(), &doc)?;
            }
        }
        write_txn.commit()?;
        debug!(index = %name, "index created");
        Ok(())
    }

    fn document_count(&self) -> Result<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(DOCUMENTS_TABLE)?;
        Ok(table.len()?)
    }

    fn index_entry_count(&self) -> Result<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ENTRIES_TABLE)?;
        Ok(table.len()?)
    }
}
