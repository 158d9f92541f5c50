//! Index declarations and the two setup strategies being compared: one
//! broad all-paths index versus one sparse index per field.

use crate::collection::Collection;
use crate::corpus::{CorpusCache, CorpusKind};
use crate::document::{DocValue, Document, get_path, leaf_paths};
use crate::error::Result;
use crate::path::FieldPath;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Key of the all-paths index declaration.
pub const WILDCARD_KEY: &str = "$**";
/// Option naming the paths an all-paths index is restricted to.
pub const PROJECTION_OPTION: &str = "wildcardProjection";
pub const SPARSE_OPTION: &str = "sparse";

// ─── IndexSpec ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IndexSpec {
    /// Every leaf path, optionally restricted to paths under `projection`.
    AllPaths { projection: Option<Vec<FieldPath>> },
    /// A single path. Sparse indexes skip documents that lack the path.
    Single { path: FieldPath, sparse: bool },
}

/// One index entry: the indexed path and the canonical form of its value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IndexKey {
    pub path: FieldPath,
    pub value: String,
}

impl IndexKey {
    fn new(path: FieldPath, value: &DocValue) -> Self {
        Self {
            path,
            value: value.canonical_key(),
        }
    }
}

/// Wire form of an index declaration: the key document and its options.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexDeclaration {
    pub key: Document,
    pub options: Document,
}

impl IndexSpec {
    pub fn all_paths() -> Self {
        IndexSpec::AllPaths { projection: None }
    }

    pub fn all_paths_projected(fields: &[FieldPath]) -> Self {
        IndexSpec::AllPaths {
            projection: Some(fields.to_vec()),
        }
    }

    pub fn sparse(path: FieldPath) -> Self {
        IndexSpec::Single { path, sparse: true }
    }

    /// Name under which a collection stores this index.
    ///
    /// Projections do not change the name, so two all-paths indexes with
    /// different projections conflict.
    pub fn name(&self) -> String {
        match self {
            IndexSpec::AllPaths { .. } => format!("{WILDCARD_KEY}_1"),
            IndexSpec::Single { path, .. } => format!("{path}_1"),
        }
    }

    pub fn declaration(&self) -> IndexDeclaration {
        let mut key = Document::new();
        let mut options = Document::new();
        match self {
            IndexSpec::AllPaths { projection } => {
                key.insert(WILDCARD_KEY.into(), DocValue::from(1i64));
                if let Some(fields) = projection {
                    let proj = fields
                        .iter()
                        .map(|field| (field.dotted().into(), DocValue::from(1i64)))
                        .collect();
                    options.insert(PROJECTION_OPTION.into(), DocValue::Object(proj));
                }
            }
            IndexSpec::Single { path, sparse } => {
                key.insert(path.dotted().into(), DocValue::from(1i64));
                if *sparse {
                    options.insert(SPARSE_OPTION.into(), DocValue::from(true));
                }
            }
        }
        IndexDeclaration { key, options }
    }

    /// Keys `doc` contributes to this index.
    ///
    /// Array elements each produce their own key under the same path.
    pub fn entries(&self, doc: &Document) -> Vec<IndexKey> {
        let mut keys = Vec::new();
        match self {
            IndexSpec::AllPaths { projection } => {
                for (path, value) in leaf_paths(doc) {
                    let included = projection
                        .as_ref()
                        .is_none_or(|fields| fields.iter().any(|f| path.starts_with(f)));
                    if included {
                        push_expanded(&mut keys, &path, value);
                    }
                }
            }
            IndexSpec::Single { path, sparse } => match get_path(doc, path) {
                Some(value) => push_expanded(&mut keys, path, value),
                None if !sparse => keys.push(IndexKey::new(path.clone(), &DocValue::Null)),
                None => {}
            },
        }
        keys
    }
}

fn push_expanded(keys: &mut Vec<IndexKey>, path: &FieldPath, value: &DocValue) {
    match value {
        DocValue::Array(items) if !items.is_empty() => {
            keys.extend(items.iter().map(|item| IndexKey::new(path.clone(), item)));
        }
        other => keys.push(IndexKey::new(path.clone(), other)),
    }
}

// ─── Strategies ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexStrategy {
    /// One all-paths index projected onto the fields of interest.
    Broad,
    /// One sparse single-field index per field of interest.
    Targeted,
}

impl IndexStrategy {
    /// Index specs this strategy creates for `fields`. Both strategies
    /// produce the same number of entries for documents whose fields of
    /// interest hold scalars.
    pub fn specs(&self, fields: &[FieldPath]) -> Vec<IndexSpec> {
        match self {
            IndexStrategy::Broad => vec![IndexSpec::all_paths_projected(fields)],
            IndexStrategy::Targeted => fields.iter().cloned().map(IndexSpec::sparse).collect(),
        }
    }

    /// Drop the collection, then create this strategy's indexes.
    pub fn apply(&self, collection: &mut dyn Collection, fields: &[FieldPath]) -> Result<()> {
        collection.drop_collection()?;
        for spec in self.specs(fields) {
            debug!(index = %spec.name(), strategy = ?self, "creating index");
            collection.create_index(&spec)?;
        }
        Ok(())
    }
}

// ─── Setup procedures ───────────────────────────────────────────────────────

/// Procedure preparing a collection before a case's operations run.
pub type SetupFn = Arc<dyn Fn(&mut dyn Collection) -> Result<()> + Send + Sync>;

/// Setup with a single projected all-paths index and no documents.
pub fn all_paths_index_setup(fields: Vec<FieldPath>) -> SetupFn {
    Arc::new(move |collection: &mut dyn Collection| {
        IndexStrategy::Broad.apply(collection, &fields)
    })
}

/// Setup with one sparse index per field and no documents.
pub fn targeted_index_setup(fields: Vec<FieldPath>) -> SetupFn {
    Arc::new(move |collection: &mut dyn Collection| {
        IndexStrategy::Targeted.apply(collection, &fields)
    })
}

/// Drop, load the corpus described by `kind`, then build an unprojected
/// all-paths index over it.
pub fn indexed_corpus_setup(cache: CorpusCache, kind: CorpusKind) -> SetupFn {
    Arc::new(move |collection: &mut dyn Collection| {
        collection.drop_collection()?;
        let docs = cache.get(kind);
        collection.insert(&docs)?;
        collection.create_index(&IndexSpec::all_paths())
    })
}
