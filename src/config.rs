use crate::corpus::{DEFAULT_CORPUS_SIZE, DEFAULT_NESTED_FIELDS};
use crate::error::{Result, WorkloadError};
use crate::path::{DEFAULT_POOL_SIZE, FieldNamePool};
use crate::registry::DEFAULT_BATCH_SIZE;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::Path;

/// Knobs for [`all_paths_suite`](crate::suite::all_paths_suite).
///
/// Every field has a default, so a JSON file only needs the fields it
/// changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkloadConfig {
    /// Number of names in the field-name pool.
    pub pool_size: usize,
    /// Seed of the document inserted by the standard cases. Also its value.
    pub index_for_queries: usize,
    /// Leaf siblings per nested document. Nesting depth is one less.
    pub number_for_range: usize,
    /// Documents loaded by the corpus setups.
    pub corpus_size: usize,
    /// Inserts per batch case.
    pub batch_size: usize,
    /// Field counts of the top-level comparison cases.
    pub fan_outs: Vec<usize>,
    /// Corpora kept alive between setups.
    pub corpus_cache_capacity: NonZeroUsize,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            pool_size: DEFAULT_POOL_SIZE,
            index_for_queries: 3111,
            number_for_range: DEFAULT_NESTED_FIELDS,
            corpus_size: DEFAULT_CORPUS_SIZE,
            batch_size: DEFAULT_BATCH_SIZE,
            fan_outs: vec![1, 2, 4, 8, 16],
            corpus_cache_capacity: NonZeroUsize::MIN.saturating_add(3),
        }
    }
}

impl WorkloadConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let config: Self = serde_json::from_slice(&bytes)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.pool_size == 0 {
            return Err(WorkloadError::Config("pool_size must be positive".into()));
        }
        if self.number_for_range < 2 {
            return Err(WorkloadError::Config(format!(
                "number_for_range must be at least 2, got {}",
                self.number_for_range
            )));
        }
        if let Some(zero) = self.fan_outs.iter().position(|&f| f == 0) {
            return Err(WorkloadError::Config(format!("fan_outs[{zero}] is zero")));
        }
        Ok(())
    }

    /// Nesting depth of the deeply nested corpus.
    pub fn nested_depth(&self) -> usize {
        self.number_for_range.saturating_sub(1)
    }

    pub fn pool(&self) -> FieldNamePool {
        FieldNamePool::with_size(self.pool_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = WorkloadConfig::default();
        assert_eq!(config.pool_size, 200);
        assert_eq!(config.index_for_queries, 3111);
        assert_eq!(config.nested_depth(), 15);
        assert_eq!(config.corpus_cache_capacity.get(), 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        file.write_all(br#"{ "pool_size": 50, "fan_outs": [3] }"#)?;
        let config = WorkloadConfig::from_json_file(file.path())?;
        assert_eq!(config.pool_size, 50);
        assert_eq!(config.fan_outs, vec![3]);
        assert_eq!(config.corpus_size, 4800);
        Ok(())
    }

    #[test]
    fn test_validate_rejects_degenerate_values() {
        let zero_pool = WorkloadConfig {
            pool_size: 0,
            ..WorkloadConfig::default()
        };
        assert!(matches!(zero_pool.validate(), Err(WorkloadError::Config(_))));

        let flat = WorkloadConfig {
            number_for_range: 1,
            ..WorkloadConfig::default()
        };
        assert!(matches!(flat.validate(), Err(WorkloadError::Config(_))));

        let empty_fan_out = WorkloadConfig {
            fan_outs: vec![2, 0],
            ..WorkloadConfig::default()
        };
        assert!(matches!(empty_fan_out.validate(), Err(WorkloadError::Config(_))));
    }
}
