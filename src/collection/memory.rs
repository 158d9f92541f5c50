use super::Collection;
use crate::document::Document;
use crate::error::{Result, WorkloadError};
use crate::index::{IndexKey, IndexSpec};
use rustc_hash::{FxHashMap, FxHashSet};

struct MemoryIndex {
    spec: IndexSpec,
    entries: FxHashSet<(IndexKey, u64)>,
}

impl MemoryIndex {
    fn add(&mut self, id: u64, doc: &Document) {
        for key in self.spec.entries(doc) {
            self.entries.insert((key, id));
        }
    }
}

/// Collection kept entirely in memory. Used by tests and dry runs.
#[derive(Default)]
pub struct MemoryCollection {
    docs: Vec<Document>,
    indexes: FxHashMap<String, MemoryIndex>,
}

impl MemoryCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn index_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.indexes.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Collection for MemoryCollection {
    fn drop_collection(&mut self) -> Result<()> {
        self.docs.clear();
        self.indexes.clear();
        Ok(())
    }

    fn insert(&mut self, docs: &[Document]) -> Result<()> {
        for doc in docs {
            let id = self.docs.len() as u64;
            for index in self.indexes.values_mut() {
                index.add(id, doc);
            }
            self.docs.push(doc.clone());
        }
        Ok(())
    }

    fn create_index(&mut self, spec: &IndexSpec) -> Result<()> {
        let name = spec.name();
        if let Some(existing) = self.indexes.get(&name) {
            return if existing.spec == *spec {
                Ok(())
            } else {
                Err(WorkloadError::IndexConflict(name))
            };
        }
        let mut index = MemoryIndex {
            spec: spec.clone(),
            entries: FxHashSet::default(),
        };
        for (id, doc) in self.docs.iter().enumerate() {
            index.add(id as u64, doc);
        }
        self.indexes.insert(name, index);
        Ok(())
    }

    fn document_count(&self) -> Result<u64> {
        Ok(self.docs.len() as u64)
    }

    fn index_entry_count(&self) -> Result<u64> {
        Ok(self
            .indexes
            .values()
            .map(|index| index.entries.len() as u64)
            .sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;
    use crate::path::FieldPath;

    #[test]
    fn test_insert_maintains_indexes() -> Result<()> {
        let mut coll = MemoryCollection::new();
        coll.create_index(&IndexSpec::all_paths())?;
        coll.insert(&[doc!({ "a" => 1i64, "b" => { "c" => 2i64 } })])?;
        assert_eq!(coll.document_count()?, 1);
        assert_eq!(coll.index_entry_count()?, 2);
        Ok(())
    }

    #[test]
    fn test_create_index_backfills() -> Result<()> {
        let mut coll = MemoryCollection::new();
        coll.insert(&[doc!({ "a" => 1i64 }), doc!({ "b" => 1i64 })])?;
        coll.create_index(&IndexSpec::sparse(FieldPath::parse("a")))?;
        assert_eq!(coll.index_entry_count()?, 1);
        Ok(())
    }

    #[test]
    fn test_create_index_conflict() -> Result<()> {
        let mut coll = MemoryCollection::new();
        coll.create_index(&IndexSpec::all_paths())?;
        coll.create_index(&IndexSpec::all_paths())?;
        let err = coll
            .create_index(&IndexSpec::all_paths_projected(&[FieldPath::parse("a")]))
            .unwrap_err();
        assert!(matches!(err, WorkloadError::IndexConflict(name) if name == "$**_1"));
        Ok(())
    }

    #[test]
    fn test_drop_clears_everything() -> Result<()> {
        let mut coll = MemoryCollection::new();
        coll.create_index(&IndexSpec::all_paths())?;
        coll.insert(&[doc!({ "a" => 1i64 })])?;
        coll.drop_collection()?;
        assert_eq!(coll.document_count()?, 0);
        assert_eq!(coll.index_entry_count()?, 0);
        assert!(coll.index_names().is_empty());
        Ok(())
    }
}
