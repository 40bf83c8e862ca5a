//! Interface flattening.
//!
//! TypeScript interfaces are structural; the source system's multi-level
//! interface inheritance is flattened at the IR level so every interface
//! carries its full member surface, and interfaces internal to the base
//! class library are then dropped without losing the members that reached
//! public descendants through them.

use rustc_hash::FxHashSet;
use tracing::debug;
use tsgen_graph::{Member, PassFlags, SymbolGraph, TypeKind};

use super::{ShapeContext, ShapePass};

/// Append to every interface the members it inherits from its transitive
/// bases, tagging each copy with its originating declarer. Deduplication
/// is by (name, erased signature); on clash the most-derived declarer
/// wins. Running the pass twice is a no-op: copies already present keep
/// their keys occupied.
pub struct InterfaceInliner;

impl ShapePass for InterfaceInliner {
    fn name(&self) -> &'static str {
        "InterfaceInliner"
    }

    fn flag(&self) -> PassFlags {
        PassFlags::INTERFACE_INLINER
    }

    fn run(&self, ctx: &mut ShapeContext<'_>, graph: &SymbolGraph) -> SymbolGraph {
        let mut out = graph.clone();
        let mut inlined_total = 0usize;

        for namespace in &mut out.namespaces {
            for ty in &mut namespace.types {
                if ty.kind != TypeKind::Interface {
                    continue;
                }
                let Some(closure) = ctx.indices.interface_closure.get(&ty.canonical_id) else {
                    continue;
                };

                let present: FxHashSet<(String, String)> =
                    ty.members.iter().map(|m| m.erased_key()).collect();
                // key -> index into `appended`, for most-derived clash resolution
                let mut appended: Vec<Member> = Vec::new();
                let mut appended_by_key: Vec<((String, String), usize)> = Vec::new();

                for base_id in closure {
                    let Some(declared) = ctx.indices.interface_decls.get(base_id) else {
                        continue;
                    };
                    for member in declared {
                        let key = member.erased_key();
                        if present.contains(&key) {
                            continue;
                        }
                        let mut copy = member.clone();
                        copy.declaring_interface = Some(base_id.clone());

                        match appended_by_key.iter().find(|(k, _)| *k == key) {
                            None => {
                                appended_by_key.push((key, appended.len()));
                                appended.push(copy);
                            }
                            Some(&(_, slot)) => {
                                let incumbent = appended[slot]
                                    .declaring_interface
                                    .as_deref()
                                    .unwrap_or_default();
                                if declarer_wins(ctx, base_id, incumbent) {
                                    appended[slot] = copy;
                                }
                            }
                        }
                    }
                }

                inlined_total += appended.len();
                ty.members.extend(appended);
            }
        }

        debug!(inlined = inlined_total, "interface members inlined");
        out
    }
}

/// True when `candidate` should replace `incumbent` as the declarer of a
/// clashing inherited member: it is more derived, or neither derives from
/// the other and it sorts first.
fn declarer_wins(ctx: &ShapeContext<'_>, candidate: &str, incumbent: &str) -> bool {
    if ctx.indices.interface_derives(candidate, incumbent) {
        return true;
    }
    if ctx.indices.interface_derives(incumbent, candidate) {
        return false;
    }
    candidate < incumbent
}

/// Drop interfaces marked internal to the base class library from every
/// implements-list and from their namespaces. Runs after inlining so that
/// members inherited through an internal interface survive on public
/// descendants.
pub struct InternalInterfaceFilter;

impl ShapePass for InternalInterfaceFilter {
    fn name(&self) -> &'static str {
        "InternalInterfaceFilter"
    }

    fn flag(&self) -> PassFlags {
        PassFlags::INTERNAL_INTERFACE_FILTER
    }

    fn requires(&self) -> PassFlags {
        PassFlags::INTERFACE_INLINER
    }

    fn run(&self, ctx: &mut ShapeContext<'_>, graph: &SymbolGraph) -> SymbolGraph {
        let mut out = graph.clone();
        if ctx.options.emit_internal_interfaces {
            return out;
        }

        let dropped: FxHashSet<String> = graph
            .types()
            .filter(|(_, ty)| ty.kind == TypeKind::Interface && ty.bcl_internal)
            .map(|(_, ty)| ty.canonical_id.clone())
            .collect();
        if dropped.is_empty() {
            return out;
        }

        for namespace in &mut out.namespaces {
            namespace
                .types
                .retain(|ty| !dropped.contains(&ty.canonical_id));
            for ty in &mut namespace.types {
                ty.interfaces.retain(|r| !dropped.contains(&r.id));
            }
        }

        debug!(dropped = dropped.len(), "internal interfaces filtered");
        out
    }
}
