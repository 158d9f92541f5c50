//! Field-name pool and the index arithmetic used to lay out generated
//! documents.
//!
//! Every name a builder writes is `pool[i mod pool.len()]` for some integer
//! `i` computed here, so the same arithmetic doubles as the inverse: given
//! the parameters of a build call, [`nested_leaf_path`] tells you which
//! paths that call wrote without looking at the document.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smol_str::SmolStr;
use std::fmt;

pub const DEFAULT_POOL_SIZE: usize = 200;
pub const PATH_SEPARATOR: char = '.';

// ─── FieldNamePool ──────────────────────────────────────────────────────────

/// Ordered, immutable set of distinct field names addressed modularly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldNamePool {
    names: Vec<SmolStr>,
}

impl FieldNamePool {
    /// `field-0` .. `field-{size-1}`.
    pub fn with_size(size: usize) -> Self {
        Self {
            names: (0..size).map(|i| SmolStr::from(format!("field-{i}"))).collect(),
        }
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SmolStr>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Name for index `i`, wrapping around the pool.
    ///
    /// An empty pool is a programmer error and panics on the modulo.
    #[inline]
    pub fn field_name(&self, i: usize) -> &SmolStr {
        &self.names[i % self.names.len()]
    }

    /// The first `n` names (clamped to the pool size).
    pub fn prefix(&self, n: usize) -> &[SmolStr] {
        &self.names[..n.min(self.names.len())]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[SmolStr] {
        &self.names
    }
}

impl Default for FieldNamePool {
    fn default() -> Self {
        Self::with_size(DEFAULT_POOL_SIZE)
    }
}

// ─── Index arithmetic ───────────────────────────────────────────────────────

/// First pool index not yet consumed by a nested build.
///
/// A build that descended `depth` levels with stride `skip` and then wrote
/// `n` siblings has used everything up to
/// `offset + (depth - 1) * skip + n * (skip - 1)`; this returns the index
/// right after it. With `skip == 1` it reduces to `offset + depth`.
#[inline]
pub fn next_free_index(offset: usize, depth: usize, n: usize, skip: usize) -> usize {
    debug_assert!(skip > 0, "skip must be positive");
    // Add before subtracting so the only saturating case is depth == 0 && n == 0,
    // where no sibling is written.
    (offset + depth * skip + n * (skip - 1) + 1).saturating_sub(skip)
}

/// Stride that grows by one every full pass over the pool.
#[inline]
pub fn unique_skip(index: usize, pool_size: usize) -> usize {
    index / pool_size + 1
}

// ─── NestedShape ────────────────────────────────────────────────────────────

/// Parameters of one nested build: where it starts in the pool, how deep it
/// goes, how many siblings it writes at the bottom, and its stride.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NestedShape {
    pub offset: usize,
    pub max_depth: usize,
    pub n: usize,
    pub skip: usize,
}

impl NestedShape {
    /// Contiguous layout (`skip == 1`).
    pub fn new(offset: usize, max_depth: usize, n: usize) -> Self {
        Self {
            offset,
            max_depth,
            n,
            skip: 1,
        }
    }

    pub fn with_skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    /// Pool index of the interior object at `depth`.
    #[inline]
    pub fn level_index(&self, depth: usize) -> usize {
        self.offset + depth * self.skip
    }

    /// Pool index of the first leaf sibling, for a build that reaches its
    /// terminal level at `terminal_depth`.
    #[inline]
    pub fn first_leaf_index(&self, terminal_depth: usize) -> usize {
        next_free_index(self.offset, terminal_depth, self.n, self.skip)
    }

    /// All leaf paths a build from depth zero writes, in write order.
    pub fn written_paths(&self, pool: &FieldNamePool) -> Vec<FieldPath> {
        (0..self.n)
            .map(|j| nested_leaf_path(pool, self, 0, j))
            .collect()
    }
}

/// Path of the `j`-th leaf written by a nested build starting at
/// `current_depth`.
pub fn nested_leaf_path(
    pool: &FieldNamePool,
    shape: &NestedShape,
    current_depth: usize,
    j: usize,
) -> FieldPath {
    let mut segments: Vec<SmolStr> = (current_depth..shape.max_depth)
        .map(|depth| pool.field_name(shape.level_index(depth)).clone())
        .collect();
    let terminal = current_depth.max(shape.max_depth);
    segments.push(pool.field_name(shape.first_leaf_index(terminal) + j).clone());
    FieldPath::from_segments(segments)
}

// ─── FieldPath ──────────────────────────────────────────────────────────────

/// Location inside a document. Displayed and serialized dot-joined.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct FieldPath {
    segments: Vec<SmolStr>,
}

impl FieldPath {
    pub fn from_segments(segments: Vec<SmolStr>) -> Self {
        Self { segments }
    }

    pub fn parse(dotted: &str) -> Self {
        Self {
            segments: dotted.split(PATH_SEPARATOR).map(SmolStr::from).collect(),
        }
    }

    pub fn segments(&self) -> &[SmolStr] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn child(&self, name: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(SmolStr::from(name));
        Self { segments }
    }

    /// True when `self` equals `other` or lies underneath it.
    pub fn starts_with(&self, other: &FieldPath) -> bool {
        self.segments.starts_with(&other.segments)
    }

    pub fn dotted(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, "{PATH_SEPARATOR}")?;
            }
            f.write_str(segment)?;
        }
        Ok(())
    }
}

impl From<&str> for FieldPath {
    fn from(dotted: &str) -> Self {
        FieldPath::parse(dotted)
    }
}

impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FieldPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let dotted = String::deserialize(deserializer)?;
        Ok(FieldPath::parse(&dotted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn field_name_wraps_around_pool() {
        let pool = FieldNamePool::from_names(["a", "b", "c", "d", "e"]);
        assert_eq!(pool.field_name(7), "c");
        assert_eq!(pool.field_name(2), pool.field_name(7));
    }

    #[test]
    fn default_pool_names() {
        let pool = FieldNamePool::default();
        assert_eq!(pool.len(), 200);
        assert_eq!(pool.field_name(0), "field-0");
        assert_eq!(pool.field_name(3111), "field-111");
        assert_eq!(pool.prefix(3), ["field-0", "field-1", "field-2"]);
    }

    #[test]
    fn next_free_index_worked_example() {
        assert_eq!(next_free_index(0, 2, 1, 3), 6);
    }

    #[test]
    fn next_free_index_contiguous() {
        // skip == 1 ignores n: siblings start right after the path.
        assert_eq!(next_free_index(10, 15, 16, 1), 25);
        assert_eq!(next_free_index(10, 15, 0, 1), 25);
        assert_eq!(next_free_index(4, 0, 0, 1), 4);
    }

    #[test]
    fn unique_skip_worked_example() {
        assert_eq!(unique_skip(7, 5), 2);
        assert_eq!(unique_skip(4, 5), 1);
        assert_eq!(unique_skip(3111, 200), 16);
    }

    #[test]
    fn nested_leaf_path_for_unique_leaf_layout() {
        let pool = FieldNamePool::default();
        let shape = NestedShape::new(3111, 1, 2).with_skip(unique_skip(3111, pool.len()));
        assert_eq!(
            nested_leaf_path(&pool, &shape, 0, 0).dotted(),
            "field-111.field-142"
        );
        assert_eq!(
            nested_leaf_path(&pool, &shape, 0, 1).dotted(),
            "field-111.field-143"
        );
    }

    #[test]
    fn nested_leaf_path_for_deep_layout() {
        let pool = FieldNamePool::default();
        let shape = NestedShape::new(3111, 15, 16);
        let path = nested_leaf_path(&pool, &shape, 0, 0);
        assert_eq!(path.len(), 16);
        assert_eq!(path.segments()[0], "field-111");
        assert_eq!(path.segments()[14], "field-125");
        assert_eq!(path.segments()[15], "field-126");
    }

    #[test]
    fn field_path_display_and_parse() {
        let path = FieldPath::parse("a.b.c");
        assert_eq!(path.len(), 3);
        assert_eq!(path.to_string(), "a.b.c");
        assert!(path.starts_with(&FieldPath::parse("a.b")));
        assert!(!path.starts_with(&FieldPath::parse("a.c")));
        assert_eq!(FieldPath::parse("a").child("b"), FieldPath::parse("a.b"));
    }

    #[test]
    fn field_path_serializes_dotted() -> Result<(), serde_json::Error> {
        let path = FieldPath::parse("field-1.field-2");
        let json = serde_json::to_string(&path)?;
        assert_eq!(json, "\"field-1.field-2\"");
        let back: FieldPath = serde_json::from_str(&json)?;
        assert_eq!(back, path);
        Ok(())
    }

    proptest! {
        #[test]
        fn next_free_index_matches_signed_formula(
            offset in 0usize..10_000,
            depth in 1usize..32,
            n in 0usize..32,
            skip in 1usize..64,
        ) {
            let signed = offset as i64 + (depth as i64 - 1) * skip as i64
                + n as i64 * (skip as i64 - 1) + 1;
            prop_assert_eq!(next_free_index(offset, depth, n, skip) as i64, signed);
        }

        #[test]
        fn field_name_is_periodic(i in 0usize..100_000, size in 1usize..300) {
            let pool = FieldNamePool::with_size(size);
            prop_assert_eq!(pool.field_name(i), pool.field_name(i + size));
        }
    }
}
