//! Module dependency graph built from per-file import records.

use crate::module_path::ModulePath;
use crate::scanner::SourceFile;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// One import statement extracted from a source file.
///
/// This is the unit the cache persists: raw text, resolved target, and
/// line number. Classification happens later, so records stay valid when
/// unrelated configuration changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRecord {
    /// The reference as written, e.g. `core.a` or `..util`.
    pub raw: String,
    /// The resolved absolute module path.
    pub resolved: ModulePath,
    /// Line number of the statement (1-indexed).
    pub line: usize,
}

impl ImportRecord {
    /// Creates a record.
    #[must_use]
    pub fn new(raw: impl Into<String>, resolved: ModulePath, line: usize) -> Self {
        Self {
            raw: raw.into(),
            resolved,
            line,
        }
    }
}

/// A directed edge in the module graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportEdge {
    /// The importing module.
    pub origin: ModulePath,
    /// File the import was written in, relative to the project root.
    pub file: String,
    /// Line number of the import statement (1-indexed).
    pub line: usize,
    /// The reference as written in the source.
    pub raw: String,
    /// The resolved target module.
    pub target: ModulePath,
    /// True when the target lives in one of the configured source modules.
    pub is_internal: bool,
}

/// Module dependency graph keyed by origin module.
///
/// Iteration order is deterministic: origins in path order, edges per
/// origin in scan order.
#[derive(Debug, Default)]
pub struct ModuleGraph {
    edges: BTreeMap<ModulePath, Vec<ImportEdge>>,
    edge_count: usize,
}

impl ModuleGraph {
    /// All edges, flattened in deterministic order.
    pub fn edges(&self) -> impl Iterator<Item = &ImportEdge> {
        self.edges.values().flatten()
    }

    /// Edges whose target is inside a configured source module.
    pub fn internal_edges(&self) -> impl Iterator<Item = &ImportEdge> {
        self.edges().filter(|e| e.is_internal)
    }

    /// Origin modules present in the graph.
    pub fn modules(&self) -> impl Iterator<Item = &ModulePath> {
        self.edges.keys()
    }

    /// Number of origin modules.
    #[must_use]
    pub fn module_count(&self) -> usize {
        self.edges.len()
    }

    /// Total number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }
}

/// Merges per-file import records into a [`ModuleGraph`].
pub struct ModuleGraphBuilder {
    internal_roots: HashSet<String>,
    graph: ModuleGraph,
}

impl ModuleGraphBuilder {
    /// Creates a builder classifying targets against the given source
    /// module names.
    #[must_use]
    pub fn new(source_modules: &[String]) -> Self {
        Self {
            internal_roots: source_modules.iter().cloned().collect(),
            graph: ModuleGraph::default(),
        }
    }

    /// Adds one file's records to the graph.
    pub fn add_file(&mut self, file: &SourceFile, records: &[ImportRecord]) {
        let entry = self
            .graph
            .edges
            .entry(file.module.clone())
            .or_default();
        for record in records {
            let is_internal = record
                .resolved
                .head()
                .is_some_and(|head| self.internal_roots.contains(head));
            entry.push(ImportEdge {
                origin: file.module.clone(),
                file: file.rel_path.clone(),
                line: record.line,
                raw: record.raw.clone(),
                target: record.resolved.clone(),
                is_internal,
            });
            self.graph.edge_count += 1;
        }
    }

    /// Finishes the merge.
    #[must_use]
    pub fn build(self) -> ModuleGraph {
        self.graph
    }
}
