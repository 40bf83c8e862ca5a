//! Cross-namespace import planning.

use indexmap::IndexSet;
use rustc_hash::FxHashSet;
use tracing::debug;
use tsgen_graph::{EmitScope, GraphIndices, Signature, SymbolGraph, Type, TypeRef};

use crate::plan::{ImportPlan, ImportSpec};

/// For each namespace, compute the set of symbols it references that are
/// declared in other namespaces, and assign each a deterministic local
/// alias.
pub fn plan_imports(graph: &SymbolGraph, indices: &GraphIndices) -> ImportPlan {
    let mut plan = ImportPlan::default();

    for namespace in &graph.namespaces {
        let local_names: FxHashSet<&str> = namespace
            .types
            .iter()
            .filter_map(|t| t.ts_name.as_deref())
            .collect();

        // Referenced foreign types, in deterministic traversal order.
        let mut foreign: IndexSet<(String, String)> = IndexSet::new();
        for ty in &namespace.types {
            if ty.emit_scope == EmitScope::Omitted {
                continue;
            }
            for referenced in referenced_ids(ty) {
                let Some(target) = indices.lookup(graph, &referenced) else {
                    continue;
                };
                if target.emit_scope == EmitScope::Omitted {
                    continue;
                }
                let Some(source_ns) = indices.namespace_of(graph, &referenced) else {
                    continue;
                };
                if source_ns == namespace.id {
                    continue;
                }
                let Some(symbol) = target.ts_name.clone() else {
                    continue;
                };
                foreign.insert((source_ns.to_string(), symbol));
            }
        }

        let mut specs: Vec<(String, String)> = foreign.into_iter().collect();
        specs.sort();

        let mut used_aliases: FxHashSet<String> = FxHashSet::default();
        let specs: Vec<ImportSpec> = specs
            .into_iter()
            .map(|(source_namespace, symbol)| {
                let alias = assign_alias(&symbol, &local_names, &mut used_aliases);
                ImportSpec {
                    source_namespace,
                    symbol,
                    alias,
                }
            })
            .collect();

        if !specs.is_empty() {
            debug!(namespace = %namespace.id, imports = specs.len(), "imports planned");
        }
        plan.imports.insert(namespace.id.clone(), specs);
    }
    plan
}

/// The imported symbol keeps its own name unless that collides with a
/// local declaration or an earlier alias; collisions take the smallest
/// numeric suffix >= 2.
fn assign_alias(
    symbol: &str,
    local_names: &FxHashSet<&str>,
    used_aliases: &mut FxHashSet<String>,
) -> String {
    let mut alias = symbol.to_string();
    if local_names.contains(alias.as_str()) || used_aliases.contains(&alias) {
        let mut suffix = 2usize;
        loop {
            let candidate = format!("{symbol}{suffix}");
            if !local_names.contains(candidate.as_str()) && !used_aliases.contains(&candidate) {
                alias = candidate;
                break;
            }
            suffix += 1;
        }
    }
    used_aliases.insert(alias.clone());
    alias
}

/// Every type id a declaration references: base, implemented interfaces,
/// member signatures (including overloads and view members), and generic
/// constraints.
fn referenced_ids(ty: &Type) -> IndexSet<String> {
    let mut ids = IndexSet::new();
    if let Some(base) = &ty.base {
        collect_type_ref(base, &mut ids);
    }
    for interface in &ty.interfaces {
        collect_type_ref(interface, &mut ids);
    }
    for param in &ty.generics {
        for constraint in &param.constraints {
            match constraint {
                tsgen_graph::Constraint::Interface(r) | tsgen_graph::Constraint::BaseClass(r) => {
                    collect_type_ref(r, &mut ids);
                }
                tsgen_graph::Constraint::DefaultCtor => {}
            }
        }
    }
    for member in &ty.members {
        if member.is_omitted() {
            continue;
        }
        for signature in member.signatures() {
            collect_signature(signature, &mut ids);
        }
    }
    for view in &ty.views {
        for member in &view.members {
            if member.is_omitted() {
                continue;
            }
            for signature in member.signatures() {
                collect_signature(signature, &mut ids);
            }
        }
    }
    ids
}

fn collect_signature(signature: &Signature, ids: &mut IndexSet<String>) {
    for param in &signature.params {
        collect_type_ref(&param.ty, ids);
    }
    collect_type_ref(&signature.ret, ids);
}

fn collect_type_ref(r: &TypeRef, ids: &mut IndexSet<String>) {
    ids.insert(r.id.clone());
    for arg in &r.args {
        collect_type_ref(arg, ids);
    }
}
