use super::value::{DocValue, Document};
use crate::path::{FieldNamePool, FieldPath, NestedShape, PATH_SEPARATOR};
use smol_str::SmolStr;

// ════════════════════════════════════════════════════════════════════════
// Dotted writes
// ════════════════════════════════════════════════════════════════════════

/// Write `value` at the dotted `path`, creating intermediate objects.
///
/// A leaf found where an intermediate object is needed is replaced by an
/// empty object. The final segment is always overwritten.
pub fn set_field(doc: &mut Document, path: &str, value: DocValue) {
    match path.split_once(PATH_SEPARATOR) {
        None => {
            doc.insert(SmolStr::from(path), value);
        }
        Some((head, rest)) => {
            let child = doc
                .entry(SmolStr::from(head))
                .or_insert(DocValue::Null)
                .coerce_object();
            set_field(child, rest, value);
        }
    }
}

/// [`set_field`] for an already-split path. An empty path is a no-op.
pub fn set_field_path(doc: &mut Document, path: &FieldPath, value: DocValue) {
    let Some((last, parents)) = path.segments().split_last() else {
        return;
    };
    let mut node = doc;
    for segment in parents {
        node = node
            .entry(segment.clone())
            .or_insert(DocValue::Null)
            .coerce_object();
    }
    node.insert(last.clone(), value);
}

// ════════════════════════════════════════════════════════════════════════
// Generated layouts
// ════════════════════════════════════════════════════════════════════════

/// Write `n` siblings directly under `doc`: field `i` is named
/// `pool[offset + i]` and holds `values[i mod values.len()]`.
pub fn set_many_fields(
    doc: &mut Document,
    pool: &FieldNamePool,
    offset: usize,
    values: &[DocValue],
    n: usize,
) {
    if values.is_empty() {
        return;
    }
    for i in 0..n {
        let field = pool.field_name(offset + i).clone();
        doc.insert(field, values[i % values.len()].clone());
    }
}

/// Descend from `current_depth` to `shape.max_depth`, one object per level
/// named `pool[offset + depth * skip]`, then write `shape.n` siblings at
/// the first free pool index.
pub fn build_nested_with_skip(
    doc: &mut Document,
    pool: &FieldNamePool,
    shape: NestedShape,
    current_depth: usize,
    values: &[DocValue],
) {
    let mut node = doc;
    for depth in current_depth..shape.max_depth {
        let field = pool.field_name(shape.level_index(depth)).clone();
        node = node.entry(field).or_insert(DocValue::Null).coerce_object();
    }
    let terminal = current_depth.max(shape.max_depth);
    set_many_fields(node, pool, shape.first_leaf_index(terminal), values, shape.n);
}

/// [`build_nested_with_skip`] with a stride of one.
pub fn build_nested(
    doc: &mut Document,
    pool: &FieldNamePool,
    offset: usize,
    max_depth: usize,
    current_depth: usize,
    values: &[DocValue],
    n: usize,
) {
    build_nested_with_skip(
        doc,
        pool,
        NestedShape::new(offset, max_depth, n),
        current_depth,
        values,
    );
}

/// A single `value` nested `number_for_range - 1` levels deep.
pub fn add_range_nested_fields(
    doc: &mut Document,
    pool: &FieldNamePool,
    offset: usize,
    value: DocValue,
    number_for_range: usize,
) {
    build_nested(
        doc,
        pool,
        offset,
        number_for_range.saturating_sub(1),
        0,
        &[value],
        1,
    );
}

// ════════════════════════════════════════════════════════════════════════
// Traversal
// ════════════════════════════════════════════════════════════════════════

/// Every leaf in `doc` with its path, in key order. Empty objects have no
/// leaves.
pub fn leaf_paths(doc: &Document) -> Vec<(FieldPath, &DocValue)> {
    let mut out = Vec::new();
    collect_leaves(doc, &FieldPath::default(), &mut out);
    out
}

fn collect_leaves<'a>(
    doc: &'a Document,
    prefix: &FieldPath,
    out: &mut Vec<(FieldPath, &'a DocValue)>,
) {
    for (key, value) in doc {
        let path = prefix.child(key);
        match value {
            DocValue::Object(child) => collect_leaves(child, &path, out),
            leaf => out.push((path, leaf)),
        }
    }
}

/// Value stored at `path`, if every segment exists.
pub fn get_path<'a>(doc: &'a Document, path: &FieldPath) -> Option<&'a DocValue> {
    let (first, rest) = path.segments().split_first()?;
    let mut value = doc.get(first)?;
    for segment in rest {
        value = value.as_object()?.get(segment)?;
    }
    Some(value)
}

/// Number of nested objects between the root and the deepest leaf.
pub fn nesting_depth(doc: &Document) -> usize {
    doc.values()
        .map(|value| match value {
            DocValue::Object(child) => 1 + nesting_depth(child),
            _ => 0,
        })
        .max()
        .unwrap_or(0)
}
