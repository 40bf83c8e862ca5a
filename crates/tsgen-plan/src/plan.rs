//! Emission plan types.

use indexmap::IndexMap;
use serde::Serialize;
use tsgen_graph::SymbolGraph;

/// One cross-namespace import: a symbol declared in `source_namespace`,
/// referenced under `alias` locally. The alias equals the symbol unless
/// it collided with a local declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportSpec {
    pub source_namespace: String,
    pub symbol: String,
    pub alias: String,
}

/// Per-namespace import specs, keyed by importing namespace in graph
/// order; specs are sorted by (source namespace, symbol).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportPlan {
    pub imports: IndexMap<String, Vec<ImportSpec>>,
}

impl ImportPlan {
    pub fn for_namespace(&self, namespace: &str) -> &[ImportSpec] {
        self.imports
            .get(namespace)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// Everything the external emitter needs: the final graph, the import
/// plan, and a total emit order over namespaces.
#[derive(Debug, Clone, Serialize)]
pub struct EmissionPlan {
    pub graph: SymbolGraph,
    pub imports: ImportPlan,
    pub emit_order: Vec<String>,
}
