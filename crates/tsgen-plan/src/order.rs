//! Namespace emit ordering.
//!
//! Topological order over the import dependency DAG with a lexicographic
//! tie-break. Cycles between namespaces are legal for the target module
//! system (declaration merging) but are reported and broken at the
//! lexicographically smallest remaining namespace.

use std::collections::BTreeSet;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;
use tsgen_common::diagnostics::codes;
use tsgen_common::{DiagnosticsSink, PipelineOptions, Severity};
use tsgen_graph::SymbolGraph;

use crate::plan::ImportPlan;

pub fn plan_emit_order(
    graph: &SymbolGraph,
    imports: &ImportPlan,
    options: &PipelineOptions,
    sink: &mut DiagnosticsSink,
) -> Vec<String> {
    // dependencies[n] = namespaces n imports from (must precede n)
    let mut dependencies: FxHashMap<&str, FxHashSet<&str>> = FxHashMap::default();
    let mut dependents: FxHashMap<&str, Vec<&str>> = FxHashMap::default();
    for namespace in &graph.namespaces {
        let deps: FxHashSet<&str> = imports
            .for_namespace(&namespace.id)
            .iter()
            .map(|spec| spec.source_namespace.as_str())
            .filter(|source| *source != namespace.id)
            .collect();
        for dep in &deps {
            dependents.entry(*dep).or_default().push(&namespace.id);
        }
        dependencies.insert(&namespace.id, deps);
    }

    let mut ready: BTreeSet<&str> = dependencies
        .iter()
        .filter(|(_, deps)| deps.is_empty())
        .map(|(id, _)| *id)
        .collect();
    let mut remaining: BTreeSet<&str> = dependencies.keys().copied().collect();
    let mut order = Vec::with_capacity(remaining.len());

    while !remaining.is_empty() {
        let next = match ready.iter().next().copied() {
            Some(id) => id,
            None => {
                // Import cycle: break it at the smallest remaining id.
                let Some(&chosen) = remaining.iter().next() else {
                    break;
                };
                let severity = if options.treat_namespace_cycle_as_error {
                    Severity::Error
                } else {
                    Severity::Warning
                };
                sink.record(
                    tsgen_common::Diagnostic::new(
                        severity,
                        codes::PLAN_NS_CYCLE,
                        format!("import cycle between namespaces; order forced at '{chosen}'"),
                    )
                    .with_namespace(chosen),
                );
                chosen
            }
        };

        ready.remove(next);
        remaining.remove(next);
        order.push(next.to_string());

        if let Some(waiting) = dependents.get(next) {
            for &dependent in waiting {
                if !remaining.contains(dependent) {
                    continue;
                }
                if let Some(deps) = dependencies.get_mut(dependent) {
                    deps.remove(next);
                    if deps.is_empty() {
                        ready.insert(dependent);
                    }
                }
            }
        }
    }

    debug!(namespaces = order.len(), "emit order planned");
    order
}
