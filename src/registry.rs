use crate::collection::Collection;
use crate::corpus::{CorpusCache, CorpusKind};
use crate::document::{DocValue, Document, set_field_path};
use crate::error::{Result, WorkloadError};
use crate::index::{SetupFn, all_paths_index_setup, indexed_corpus_setup, targeted_index_setup};
use crate::path::FieldPath;
use serde::Serialize;
use smol_str::SmolStr;
use std::collections::BTreeSet;
use std::fmt;
use tracing::{debug, info};

pub const CASE_INFIX: &str = "AllPathsIndex";
pub const BASE_TAGS: [&str; 3] = ["all_paths", "regression", "indexed"];
pub const INSERT_TYPE: &str = "Insert";
pub const INSERT_TAGS: [&str; 1] = ["insert"];
pub const DEFAULT_BATCH_SIZE: usize = 1000;

// ─── Operation ──────────────────────────────────────────────────────────────

/// One step the harness executes and measures. Serializes as
/// `{"op": "insert", "doc": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    Insert { doc: Document },
}

impl Operation {
    pub fn apply(&self, collection: &mut dyn Collection) -> Result<()> {
        match self {
            Operation::Insert { doc } => collection.insert(std::slice::from_ref(doc)),
        }
    }
}

// ─── Setup ──────────────────────────────────────────────────────────────────

/// A labelled setup procedure. The label is what gets exported; the closure
/// is what runs.
#[derive(Clone)]
pub struct Setup {
    label: SmolStr,
    run: SetupFn,
}

impl Setup {
    pub fn new(label: impl Into<SmolStr>, run: SetupFn) -> Self {
        Self {
            label: label.into(),
            run,
        }
    }

    /// Broad strategy: one all-paths index projected onto `fields`.
    pub fn all_paths_index(fields: Vec<FieldPath>) -> Self {
        let label = format!("all_paths_index({})", join(&fields));
        Self::new(label, all_paths_index_setup(fields))
    }

    /// Targeted strategy: one sparse index per field.
    pub fn targeted_index(fields: Vec<FieldPath>) -> Self {
        let label = format!("targeted_index({})", join(&fields));
        Self::new(label, targeted_index_setup(fields))
    }

    /// Load a cached corpus and index every path.
    pub fn indexed_corpus(cache: CorpusCache, kind: CorpusKind) -> Self {
        let label = match kind {
            CorpusKind::UniqueLeaves { count } => format!("unique_leaves({count})+all_paths_index"),
            CorpusKind::DeeplyNested { count, depth, n } => {
                format!("deeply_nested({count},{depth},{n})+all_paths_index")
            }
        };
        Self::new(label, indexed_corpus_setup(cache, kind))
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn run(&self, collection: &mut dyn Collection) -> Result<()> {
        (self.run)(collection)
    }
}

impl fmt::Debug for Setup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Setup").field(&self.label).finish()
    }
}

fn join(fields: &[FieldPath]) -> String {
    fields
        .iter()
        .map(FieldPath::dotted)
        .collect::<Vec<_>>()
        .join(",")
}

// ─── BenchmarkCase ──────────────────────────────────────────────────────────

/// A named scenario: how to prepare the collection and what to run on it.
#[derive(Debug, Clone)]
pub struct BenchmarkCase {
    name: String,
    tags: BTreeSet<SmolStr>,
    setup: Setup,
    operations: Vec<Operation>,
}

impl BenchmarkCase {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tags(&self) -> &BTreeSet<SmolStr> {
        &self.tags
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn setup_label(&self) -> &str {
        self.setup.label()
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Run the setup, then every operation in order. Nothing is timed.
    pub fn replay(&self, collection: &mut dyn Collection) -> Result<()> {
        debug!(case = %self.name, setup = %self.setup.label(), "running setup");
        self.setup
            .run(collection)
            .map_err(|source| WorkloadError::Setup {
                case: self.name.clone(),
                source: Box::new(source),
            })?;
        for op in &self.operations {
            op.apply(collection)?;
        }
        Ok(())
    }
}

// ─── Registry ───────────────────────────────────────────────────────────────

/// Ordered, append-only list of benchmark cases.
#[derive(Debug, Default, Clone)]
pub struct Registry {
    cases: Vec<BenchmarkCase>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a case named `{type_tag}.AllPathsIndex.{case_name}`.
    ///
    /// Names are not checked for uniqueness.
    pub fn register(
        &mut self,
        type_tag: &str,
        case_name: &str,
        setup: Setup,
        operations: Vec<Operation>,
        extra_tags: &[&str],
    ) {
        let name = format!("{type_tag}.{CASE_INFIX}.{case_name}");
        let tags = BASE_TAGS
            .iter()
            .chain(extra_tags)
            .map(|tag| SmolStr::from(*tag))
            .collect();
        debug!(%name, ops = operations.len(), "registering case");
        self.cases.push(BenchmarkCase {
            name,
            tags,
            setup,
            operations,
        });
    }

    /// Register `count` inserts of `generator(0..count)` as
    /// `Insert.AllPathsIndex.{name}.InsertDoc`.
    pub fn register_insert_batch(
        &mut self,
        name: &str,
        setup: Setup,
        generator: impl Fn(usize) -> Document,
        count: usize,
    ) {
        let operations = (0..count)
            .map(|i| Operation::Insert { doc: generator(i) })
            .collect();
        self.register(
            INSERT_TYPE,
            &format!("{name}.InsertDoc"),
            setup,
            operations,
            &INSERT_TAGS,
        );
    }

    /// Register a single insert of `doc`.
    pub fn register_insert(&mut self, name: &str, setup: Setup, doc: Document) {
        self.register(
            INSERT_TYPE,
            &format!("{name}.InsertDoc"),
            setup,
            vec![Operation::Insert { doc }],
            &INSERT_TAGS,
        );
    }

    /// The standard cases for one document shape: currently a single insert
    /// of a document holding `upper` at `primary`.
    pub fn register_standard(&mut self, name: &str, setup: Setup, primary: &FieldPath, upper: usize) {
        let mut doc = Document::new();
        set_field_path(&mut doc, primary, DocValue::from(upper));
        self.register_insert(name, setup, doc);
    }

    /// Register the same insert batch twice, once against a projected
    /// all-paths index and once against one sparse index per field.
    pub fn register_comparison_write(
        &mut self,
        name: &str,
        fields: &[FieldPath],
        generator: impl Fn(usize) -> Document,
        count: usize,
    ) {
        self.register_insert_batch(
            &format!("{name}.AllPathsIndex"),
            Setup::all_paths_index(fields.to_vec()),
            &generator,
            count,
        );
        self.register_insert_batch(
            &format!("{name}.StandardIndex"),
            Setup::targeted_index(fields.to_vec()),
            &generator,
            count,
        );
    }

    pub fn get(&self, name: &str) -> Option<&BenchmarkCase> {
        self.cases.iter().find(|case| case.name == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BenchmarkCase> {
        self.cases.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.cases.iter().map(BenchmarkCase::name).collect()
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    /// Replay every case against collections produced by `open`.
    pub fn replay_all<C, F>(&self, mut open: F) -> Result<Vec<(String, u64)>>
    where
        C: Collection,
        F: FnMut(&BenchmarkCase) -> Result<C>,
    {
        let mut entry_counts = Vec::with_capacity(self.cases.len());
        for case in &self.cases {
            let mut collection = open(case)?;
            case.replay(&mut collection)?;
            let entries = collection.index_entry_count()?;
            info!(case = %case.name, entries, "case replayed");
            entry_counts.push((case.name.clone(), entries));
        }
        Ok(entry_counts)
    }
}

impl<'a> IntoIterator for &'a Registry {
    type Item = &'a BenchmarkCase;
    type IntoIter = std::slice::Iter<'a, BenchmarkCase>;

    fn into_iter(self) -> Self::IntoIter {
        self.cases.iter()
    }
}

impl IntoIterator for Registry {
    type Item = BenchmarkCase;
    type IntoIter = std::vec::IntoIter<BenchmarkCase>;

    fn into_iter(self) -> Self::IntoIter {
        self.cases.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::MemoryCollection;
    use crate::corpus::top_level_fields_doc;
    use crate::doc;
    use std::sync::Arc;

    fn noop_setup() -> Setup {
        Setup::new("noop", Arc::new(|collection: &mut dyn Collection| collection.drop_collection()))
    }

    #[test]
    fn test_register_names_and_tags() {
        let mut registry = Registry::new();
        registry.register("Query", "Case", noop_setup(), vec![], &["extra"]);

        let case = registry.get("Query.AllPathsIndex.Case").expect("registered");
        let tags: Vec<&str> = case.tags().iter().map(SmolStr::as_str).collect();
        assert_eq!(tags, vec!["all_paths", "extra", "indexed", "regression"]);
        assert!(case.operations().is_empty());
    }

    #[test]
    fn test_register_is_append_only() {
        let mut registry = Registry::new();
        registry.register("T", "Same", noop_setup(), vec![], &[]);
        registry.register("T", "Same", noop_setup(), vec![], &[]);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names(), vec!["T.AllPathsIndex.Same"; 2]);
    }

    #[test]
    fn test_insert_batch_has_exact_count() {
        let mut registry = Registry::new();
        let names = [SmolStr::from("a")];
        let make = top_level_fields_doc(&names);
        registry.register_insert_batch("Batch", noop_setup(), make.as_ref(), DEFAULT_BATCH_SIZE);

        let case = registry
            .get("Insert.AllPathsIndex.Batch.InsertDoc")
            .expect("registered");
        assert_eq!(case.operations().len(), 1000);
        assert!(case.has_tag("insert"));
        assert_eq!(
            case.operations()[999],
            Operation::Insert {
                doc: doc!({ "a" => 999i64 })
            }
        );
    }

    #[test]
    fn test_register_standard_writes_primary_path() {
        let mut registry = Registry::new();
        registry.register_standard("Shape", noop_setup(), &FieldPath::parse("x.y"), 7);
        let case = registry.get("Insert.AllPathsIndex.Shape.InsertDoc").expect("registered");
        assert_eq!(
            case.operations(),
            &[Operation::Insert {
                doc: doc!({ "x" => { "y" => 7i64 } })
            }]
        );
    }

    #[test]
    fn test_comparison_write_registers_both_strategies() {
        let mut registry = Registry::new();
        let fields = vec![FieldPath::parse("a"), FieldPath::parse("b")];
        let names = [SmolStr::from("a"), SmolStr::from("b")];
        let make = top_level_fields_doc(&names);
        registry.register_comparison_write("Pair", &fields, make.as_ref(), 10);
        assert_eq!(
            registry.names(),
            vec![
                "Insert.AllPathsIndex.Pair.AllPathsIndex.InsertDoc",
                "Insert.AllPathsIndex.Pair.StandardIndex.InsertDoc",
            ]
        );

        let counts = registry
            .replay_all(|_| Ok(MemoryCollection::new()))
            .expect("replay");
        assert_eq!(counts[0].1, 20);
        assert_eq!(counts[0].1, counts[1].1);
    }

    #[test]
    fn test_operation_wire_shape() -> std::result::Result<(), serde_json::Error> {
        let op = Operation::Insert {
            doc: doc!({ "a" => 1i64 }),
        };
        assert_eq!(
            serde_json::to_value(&op)?,
            serde_json::json!({ "op": "insert", "doc": { "a": 1 } })
        );
        Ok(())
    }

    #[test]
    fn test_setup_failure_is_wrapped() {
        let failing = Setup::new(
            "fails",
            Arc::new(|_: &mut dyn Collection| -> Result<()> {
                Err(WorkloadError::Config("boom".into()))
            }),
        );
        let mut registry = Registry::new();
        registry.register_insert("Broken", failing, doc!({ "a" => 1i64 }));

        let mut coll = MemoryCollection::new();
        let case = registry.iter().next().expect("registered");
        let err = case.replay(&mut coll).unwrap_err();
        assert!(matches!(err, WorkloadError::Setup { ref case, .. } if case == "Insert.AllPathsIndex.Broken.InsertDoc"));
        // operations never ran
        assert_eq!(coll.document_count().expect("count"), 0);
    }
}
