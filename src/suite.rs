//! The all-paths index regression suite.

use crate::config::WorkloadConfig;
use crate::corpus::{CorpusCache, CorpusKind, top_level_fields_doc, unique_leaf_shape};
use crate::error::Result;
use crate::path::{FieldNamePool, FieldPath, NestedShape, nested_leaf_path};
use crate::registry::{Registry, Setup};
use std::sync::Arc;
use tracing::info;

/// Fields in each document of the fully excluded case.
pub const EXCLUDED_FAN_OUT: usize = 16;
pub const EXCLUDED_PROJECTION: &str = "nonexistent";

/// Build every case of the suite in registration order.
pub fn all_paths_suite(config: &WorkloadConfig) -> Result<Registry> {
    config.validate()?;
    let pool = Arc::new(config.pool());
    let cache = CorpusCache::new(Arc::clone(&pool), config.corpus_cache_capacity);
    let mut registry = Registry::new();

    // Every inserted field falls outside the projection.
    let wide = FieldNamePool::with_size(EXCLUDED_FAN_OUT);
    registry.register_insert_batch(
        "MultipleFieldsAllExcluded",
        Setup::all_paths_index(vec![FieldPath::parse(EXCLUDED_PROJECTION)]),
        top_level_fields_doc(wide.names()).as_ref(),
        config.batch_size,
    );

    let seed = config.index_for_queries;

    let primary = nested_leaf_path(&pool, &unique_leaf_shape(seed, pool.len()), 0, 0);
    registry.register_standard(
        "AllDiffFields",
        Setup::indexed_corpus(
            cache.clone(),
            CorpusKind::UniqueLeaves {
                count: config.corpus_size,
            },
        ),
        &primary,
        seed,
    );

    let depth = config.nested_depth();
    let n = config.number_for_range;
    let primary = nested_leaf_path(&pool, &NestedShape::new(seed, depth, n), 0, 0);
    registry.register_standard(
        "DeeplyNested",
        Setup::indexed_corpus(
            cache,
            CorpusKind::DeeplyNested {
                count: config.corpus_size,
                depth,
                n,
            },
        ),
        &primary,
        seed,
    );

    for &fan_out in &config.fan_outs {
        let names = FieldNamePool::with_size(fan_out);
        let fields: Vec<FieldPath> = names.names().iter().map(|n| FieldPath::parse(n)).collect();
        let plural = if fan_out > 1 { "s" } else { "" };
        registry.register_comparison_write(
            &format!("TopLevelField{plural}-{fan_out}"),
            &fields,
            top_level_fields_doc(names.names()).as_ref(),
            config.batch_size,
        );
    }

    info!(cases = registry.len(), "all-paths suite assembled");
    Ok(registry)
}
