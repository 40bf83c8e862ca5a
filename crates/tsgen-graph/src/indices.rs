//! Derived lookup tables over a symbol graph.
//!
//! Indices are a pure function of the graph they were built from and must
//! be rebuilt after any structural rewrite. Only the Phase-2 build reports
//! diagnostics (duplicate ids, base-interface cycles, unresolved
//! references); the per-pass rebuilds are silent.

use indexmap::IndexSet;
use rustc_hash::FxHashMap;
use tracing::debug;
use tsgen_common::diagnostics::{DiagnosticsSink, codes};

use crate::model::{Member, SymbolGraph, Type, TypeRef};

/// Position of a type inside the graph's namespace/type vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypePos {
    pub ns: usize,
    pub ty: usize,
}

#[derive(Debug, Default)]
pub struct GraphIndices {
    /// Namespace id to position.
    pub namespaces: FxHashMap<String, usize>,
    /// Canonical type id to position.
    pub types: FxHashMap<String, TypePos>,
    /// Interface id to the transitive set of inherited interface ids, in
    /// breadth-first discovery order.
    pub interface_closure: FxHashMap<String, IndexSet<String>>,
    /// Interface id to its directly declared members (inherited copies
    /// carry a foreign declaring-interface tag and are excluded).
    pub interface_decls: FxHashMap<String, Vec<Member>>,
}

impl GraphIndices {
    /// Phase-2 build: reports duplicate canonical ids, base-interface
    /// cycles, and unresolved non-external references.
    pub fn build(graph: &SymbolGraph, sink: &mut DiagnosticsSink) -> Self {
        Self::collect(graph, Some(sink))
    }

    /// Silent rebuild after a structural rewrite.
    pub fn rebuild(graph: &SymbolGraph) -> Self {
        Self::collect(graph, None)
    }

    fn collect(graph: &SymbolGraph, mut sink: Option<&mut DiagnosticsSink>) -> Self {
        let mut indices = GraphIndices::default();

        for (ns_pos, namespace) in graph.namespaces.iter().enumerate() {
            indices.namespaces.insert(namespace.id.clone(), ns_pos);
            for (ty_pos, ty) in namespace.types.iter().enumerate() {
                let previous = indices.types.insert(
                    ty.canonical_id.clone(),
                    TypePos {
                        ns: ns_pos,
                        ty: ty_pos,
                    },
                );
                if let Some(first) = previous {
                    // Keep the earliest declaration.
                    indices.types.insert(ty.canonical_id.clone(), first);
                    if let Some(sink) = sink.as_deref_mut() {
                        sink.record(
                            tsgen_common::Diagnostic::new(
                                tsgen_common::Severity::Error,
                                codes::INDEX_DUPLICATE_TYPE,
                                format!("duplicate canonical id '{}'", ty.canonical_id),
                            )
                            .with_namespace(namespace.id.clone())
                            .with_type(ty.canonical_id.clone()),
                        );
                    }
                }
            }
        }

        indices.build_interface_tables(graph, &mut sink);

        if let Some(sink) = sink.as_deref_mut() {
            indices.check_unresolved_refs(graph, sink);
        }

        debug!(
            types = indices.types.len(),
            interfaces = indices.interface_closure.len(),
            "graph indices built"
        );
        indices
    }

    fn build_interface_tables(
        &mut self,
        graph: &SymbolGraph,
        sink: &mut Option<&mut DiagnosticsSink>,
    ) {
        for (namespace, ty) in graph.types() {
            if !ty.is_interface() {
                continue;
            }

            // Directly declared members only: an inlined copy carries the
            // declaring interface it was copied from.
            let declared: Vec<Member> = ty
                .members
                .iter()
                .filter(|m| {
                    m.declaring_interface.is_none()
                        || m.declaring_interface.as_deref() == Some(ty.canonical_id.as_str())
                })
                .cloned()
                .collect();
            self.interface_decls
                .insert(ty.canonical_id.clone(), declared);

            let closure = self.interface_closure_of(graph, ty);
            if closure.contains(&ty.canonical_id) {
                if let Some(sink) = sink.as_deref_mut() {
                    sink.record(
                        tsgen_common::Diagnostic::new(
                            tsgen_common::Severity::Error,
                            codes::INDEX_IFACE_CYCLE,
                            format!(
                                "interface '{}' participates in a base-interface cycle",
                                ty.canonical_id
                            ),
                        )
                        .with_namespace(namespace.id.clone())
                        .with_type(ty.canonical_id.clone()),
                    );
                }
            }
            self.interface_closure.insert(ty.canonical_id.clone(), closure);
        }
    }

    /// Transitive closure of an interface's declared bases. Iterative
    /// worklist; the closure set doubles as the visited set so cycles
    /// terminate.
    fn interface_closure_of(&self, graph: &SymbolGraph, ty: &Type) -> IndexSet<String> {
        let mut closure: IndexSet<String> = IndexSet::new();
        let mut worklist: Vec<String> = ty.interfaces.iter().map(|r| r.id.clone()).collect();
        worklist.reverse();

        while let Some(id) = worklist.pop() {
            if !closure.insert(id.clone()) {
                continue;
            }
            if let Some(base) = self.lookup(graph, &id) {
                for next in &base.interfaces {
                    if !closure.contains(&next.id) {
                        worklist.push(next.id.clone());
                    }
                }
            }
        }
        closure
    }

    fn check_unresolved_refs(&self, graph: &SymbolGraph, sink: &mut DiagnosticsSink) {
        for (namespace, ty) in graph.types() {
            let mut check = |r: &TypeRef| {
                if !r.external && !self.types.contains_key(&r.id) {
                    sink.record(
                        tsgen_common::Diagnostic::new(
                            tsgen_common::Severity::Warning,
                            codes::INDEX_UNRESOLVED_REF,
                            format!("reference to '{}' does not resolve and is not marked external", r.id),
                        )
                        .with_namespace(namespace.id.clone())
                        .with_type(ty.canonical_id.clone()),
                    );
                }
            };
            if let Some(base) = &ty.base {
                check(base);
            }
            for interface in &ty.interfaces {
                check(interface);
            }
        }
    }

    /// Resolve a canonical id to its type in the given graph.
    pub fn lookup<'g>(&self, graph: &'g SymbolGraph, id: &str) -> Option<&'g Type> {
        let pos = self.types.get(id)?;
        graph
            .namespaces
            .get(pos.ns)
            .and_then(|ns| ns.types.get(pos.ty))
    }

    /// Namespace id owning the given type, if it resolves.
    pub fn namespace_of<'g>(&self, graph: &'g SymbolGraph, id: &str) -> Option<&'g str> {
        let pos = self.types.get(id)?;
        graph.namespaces.get(pos.ns).map(|ns| ns.id.as_str())
    }

    /// True when interface `derived` transitively inherits `base`.
    pub fn interface_derives(&self, derived: &str, base: &str) -> bool {
        self.interface_closure
            .get(derived)
            .is_some_and(|closure| closure.contains(base))
    }

    /// All nominal ancestors of a type: itself, its transitive base
    /// chain, and every interface reachable from those, in discovery
    /// order.
    pub fn ancestors(&self, graph: &SymbolGraph, id: &str) -> IndexSet<String> {
        let mut result = IndexSet::new();
        let mut worklist = vec![id.to_string()];
        while let Some(current) = worklist.pop() {
            if !result.insert(current.clone()) {
                continue;
            }
            let Some(ty) = self.lookup(graph, &current) else {
                continue;
            };
            if let Some(base) = &ty.base {
                worklist.push(base.id.clone());
            }
            for interface in &ty.interfaces {
                worklist.push(interface.id.clone());
            }
            if let Some(closure) = self.interface_closure.get(&current) {
                for inherited in closure {
                    worklist.push(inherited.clone());
                }
            }
        }
        result
    }

    /// Nominal assignability: `from` is `to`, or `to` is among `from`'s
    /// ancestors.
    pub fn is_assignable(&self, graph: &SymbolGraph, from: &TypeRef, to: &TypeRef) -> bool {
        from.id == to.id || self.ancestors(graph, &from.id).contains(&to.id)
    }
}
