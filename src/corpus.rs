//! Batches of generated documents, one batch per benchmark scenario.

use crate::document::{DocValue, Document, build_nested, build_nested_with_skip, set_many_fields};
use crate::path::{FieldNamePool, NestedShape, unique_skip};
use lru::LruCache;
use smol_str::SmolStr;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

pub const DEFAULT_CORPUS_SIZE: usize = 4800;
pub const DEFAULT_NESTED_DEPTH: usize = 15;
pub const DEFAULT_NESTED_FIELDS: usize = 16;

/// Produces the `i`-th document of an operation batch.
pub type DocGenerator = Arc<dyn Fn(usize) -> Document + Send + Sync>;

// ─── Generators ─────────────────────────────────────────────────────────────

/// Shape of document `i` in [`unique_leaf_corpus`].
#[inline]
pub fn unique_leaf_shape(i: usize, pool_size: usize) -> NestedShape {
    NestedShape::new(i, 1, 2).with_skip(unique_skip(i, pool_size))
}

/// Largest unique-leaf corpus without repeated leaf paths.
///
/// Documents `pool_size * k` apart share a level name, and their leaves
/// start `2 * k` pool slots apart. The leaf pair repeats once `2 * k` is a
/// multiple of the pool size: at `k = pool_size / 2` for an even pool and
/// at `k = pool_size` for an odd one.
#[inline]
pub fn unique_leaf_capacity(pool_size: usize) -> usize {
    let squared = pool_size.saturating_mul(pool_size);
    if pool_size % 2 == 0 { squared / 2 } else { squared }
}

/// Documents whose two leaf fields sit at a path no other document in the
/// corpus writes, as long as `count` stays within [`unique_leaf_capacity`].
pub fn unique_leaf_corpus(pool: &FieldNamePool, count: usize) -> Vec<Document> {
    if count > unique_leaf_capacity(pool.len()) {
        warn!(
            count,
            pool_size = pool.len(),
            "corpus exceeds one skip cycle, leaf paths may repeat"
        );
    }
    (0..count)
        .map(|i| {
            let mut doc = Document::new();
            build_nested_with_skip(
                &mut doc,
                pool,
                unique_leaf_shape(i, pool.len()),
                0,
                &[DocValue::from(i)],
            );
            doc
        })
        .collect()
}

/// Documents made of a single chain of `depth` objects ending in `n`
/// siblings. Document `i` starts one pool index after document `i - 1`, so
/// neighbouring chains share most of their names.
pub fn deeply_nested_corpus(
    pool: &FieldNamePool,
    count: usize,
    depth: usize,
    n: usize,
) -> Vec<Document> {
    (0..count)
        .map(|i| {
            let mut doc = Document::new();
            build_nested(&mut doc, pool, i, depth, 0, &[DocValue::from(i)], n);
            doc
        })
        .collect()
}

/// Generator of flat documents with one field per name, all holding the seed.
pub fn top_level_fields_doc(field_names: &[SmolStr]) -> DocGenerator {
    let pool = FieldNamePool::from_names(field_names.iter().cloned());
    Arc::new(move |seed| {
        let mut doc = Document::new();
        set_many_fields(&mut doc, &pool, 0, &[DocValue::from(seed)], pool.len());
        doc
    })
}

// ─── CorpusKind ─────────────────────────────────────────────────────────────

/// Hashable description of a corpus, used as the cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CorpusKind {
    UniqueLeaves { count: usize },
    DeeplyNested { count: usize, depth: usize, n: usize },
}

impl CorpusKind {
    pub fn generate(&self, pool: &FieldNamePool) -> Vec<Document> {
        match *self {
            CorpusKind::UniqueLeaves { count } => unique_leaf_corpus(pool, count),
            CorpusKind::DeeplyNested { count, depth, n } => {
                deeply_nested_corpus(pool, count, depth, n)
            }
        }
    }
}

// ─── CorpusCache ────────────────────────────────────────────────────────────

/// LRU cache of generated corpora shared by setup procedures.
///
/// Several cases load the same corpus; generating it once per process keeps
/// setup cost out of repeated runs. Cloning the cache shares it.
#[derive(Clone)]
pub struct CorpusCache {
    pool: Arc<FieldNamePool>,
    entries: Arc<Mutex<LruCache<CorpusKind, Arc<Vec<Document>>>>>,
}

impl CorpusCache {
    pub fn new(pool: Arc<FieldNamePool>, capacity: NonZeroUsize) -> Self {
        Self {
            pool,
            entries: Arc::new(Mutex::new(LruCache::new(capacity))),
        }
    }

    /// Cached corpus for `kind`, generating it on a miss.
    pub fn get(&self, kind: CorpusKind) -> Arc<Vec<Document>> {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(docs) = entries.get(&kind) {
            debug!(?kind, "corpus cache hit");
            return Arc::clone(docs);
        }
        debug!(?kind, "generating corpus");
        let docs = Arc::new(kind.generate(&self.pool));
        entries.put(kind, Arc::clone(&docs));
        docs
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .map(|entries| entries.len())
            .unwrap_or_else(|poisoned| poisoned.into_inner().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{leaf_paths, nesting_depth};
    use std::collections::HashSet;

    fn small_pool() -> FieldNamePool {
        FieldNamePool::with_size(20)
    }

    #[test]
    fn test_unique_leaf_corpus_shape() {
        let pool = FieldNamePool::default();
        let docs = unique_leaf_corpus(&pool, 10);
        assert_eq!(docs.len(), 10);
        for (i, doc) in docs.iter().enumerate() {
            assert_eq!(nesting_depth(doc), 1);
            let leaves = leaf_paths(doc);
            assert_eq!(leaves.len(), 2);
            assert!(leaves.iter().all(|(_, v)| v.as_i64() == Some(i as i64)));
        }
    }

    #[test]
    fn test_unique_leaf_paths_do_not_collide_within_cycle() {
        let pool = small_pool();
        let count = unique_leaf_capacity(pool.len());
        let docs = unique_leaf_corpus(&pool, count);
        let mut seen = HashSet::new();
        for doc in &docs {
            let pair: Vec<String> = leaf_paths(doc).into_iter().map(|(p, _)| p.dotted()).collect();
            assert!(seen.insert(pair.clone()), "duplicate leaf pair {pair:?}");
        }
        assert_eq!(seen.len(), count);
    }

    #[test]
    fn test_unique_leaf_paths_repeat_past_capacity() {
        let pool = small_pool();
        let count = unique_leaf_capacity(pool.len()) + 1;
        let docs = unique_leaf_corpus(&pool, count);
        let last: Vec<String> = leaf_paths(&docs[count - 1])
            .into_iter()
            .map(|(p, _)| p.dotted())
            .collect();
        let first: Vec<String> = leaf_paths(&docs[0]).into_iter().map(|(p, _)| p.dotted()).collect();
        assert_eq!(first, last);
    }

    #[test]
    fn test_unique_leaf_capacity_of_odd_pool() {
        let pool = FieldNamePool::with_size(21);
        let count = unique_leaf_capacity(pool.len());
        assert_eq!(count, 441);

        let docs = unique_leaf_corpus(&pool, count + 1);
        let pairs: Vec<Vec<String>> = docs
            .iter()
            .map(|doc| leaf_paths(doc).into_iter().map(|(p, _)| p.dotted()).collect())
            .collect();
        let distinct: HashSet<&Vec<String>> = pairs[..count].iter().collect();
        assert_eq!(distinct.len(), count);
        assert_eq!(pairs[0], pairs[count]);
    }

    #[test]
    fn test_unique_leaf_default_corpus_has_no_collisions() {
        let pool = FieldNamePool::default();
        let docs = unique_leaf_corpus(&pool, DEFAULT_CORPUS_SIZE);
        let distinct: HashSet<Vec<String>> = docs
            .iter()
            .map(|doc| leaf_paths(doc).into_iter().map(|(p, _)| p.dotted()).collect())
            .collect();
        assert_eq!(distinct.len(), DEFAULT_CORPUS_SIZE);
    }

    #[test]
    fn test_deeply_nested_corpus_depth_is_constant() {
        let pool = FieldNamePool::default();
        let docs = deeply_nested_corpus(&pool, 300, DEFAULT_NESTED_DEPTH, DEFAULT_NESTED_FIELDS);
        for doc in &docs {
            assert_eq!(nesting_depth(doc), DEFAULT_NESTED_DEPTH);
            let leaves = leaf_paths(doc);
            assert_eq!(leaves.len(), DEFAULT_NESTED_FIELDS);
            assert!(leaves.iter().all(|(p, _)| p.len() == DEFAULT_NESTED_DEPTH + 1));
        }
    }

    #[test]
    fn test_deeply_nested_neighbours_share_prefix() {
        let pool = FieldNamePool::default();
        let docs = deeply_nested_corpus(&pool, 2, 3, 1);
        let first = leaf_paths(&docs[0]).remove(0).0;
        let second = leaf_paths(&docs[1]).remove(0).0;
        assert_eq!(first.dotted(), "field-0.field-1.field-2.field-3");
        assert_eq!(second.dotted(), "field-1.field-2.field-3.field-4");
    }

    #[test]
    fn test_top_level_fields_doc() {
        let names = [SmolStr::from("a"), SmolStr::from("b"), SmolStr::from("c")];
        let make = top_level_fields_doc(&names);
        assert_eq!(make(5), crate::doc!({ "a" => 5i64, "b" => 5i64, "c" => 5i64 }));
        assert_eq!(make(5), make(5));
    }

    #[test]
    fn test_corpus_cache_reuses_entries() {
        let cache = CorpusCache::new(
            Arc::new(small_pool()),
            NonZeroUsize::new(1).expect("non-zero"),
        );
        let kind = CorpusKind::UniqueLeaves { count: 5 };
        let a = cache.get(kind);
        let b = cache.get(kind);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);

        let other = CorpusKind::DeeplyNested { count: 2, depth: 2, n: 2 };
        cache.get(other);
        assert_eq!(cache.len(), 1);
        let c = cache.get(kind);
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(*a, *c);
    }
}
