//! Indexer elision.
//!
//! TypeScript index signatures are emitted separately by the back end;
//! indexers never survive as named members.

use tracing::debug;
use tsgen_graph::{MemberKind, OmitReason, PassFlags, SymbolGraph, ViewTag};

use super::{ShapeContext, ShapePass};

/// Mark declared indexers Omitted with the index-signature rationale.
pub struct IndexerPlanner;

impl ShapePass for IndexerPlanner {
    fn name(&self) -> &'static str {
        "IndexerPlanner"
    }

    fn flag(&self) -> PassFlags {
        PassFlags::INDEXER_PLANNER
    }

    fn run(&self, _ctx: &mut ShapeContext<'_>, graph: &SymbolGraph) -> SymbolGraph {
        let mut out = graph.clone();
        for namespace in &mut out.namespaces {
            for ty in &mut namespace.types {
                for member in &mut ty.members {
                    if member.kind == MemberKind::Indexer && !member.view_tag.is_omitted() {
                        member.view_tag = ViewTag::Omitted(OmitReason::IndexSignature);
                    }
                }
            }
        }
        out
    }
}

/// Remove any indexer that leaked onto a surface or into a view through
/// inlining. After this pass no member of kind indexer has a non-omitted
/// tag.
pub struct FinalIndexersPass;

impl ShapePass for FinalIndexersPass {
    fn name(&self) -> &'static str {
        "FinalIndexersPass"
    }

    fn flag(&self) -> PassFlags {
        PassFlags::FINAL_INDEXERS
    }

    fn requires(&self) -> PassFlags {
        PassFlags::INDEXER_PLANNER | PassFlags::INTERFACE_INLINER
    }

    fn run(&self, _ctx: &mut ShapeContext<'_>, graph: &SymbolGraph) -> SymbolGraph {
        let mut out = graph.clone();
        let mut removed = 0usize;

        for namespace in &mut out.namespaces {
            for ty in &mut namespace.types {
                let leaked =
                    |m: &tsgen_graph::Member| m.kind == MemberKind::Indexer && !m.view_tag.is_omitted();
                let before = ty.members.len();
                ty.members.retain(|m| !leaked(m));
                removed += before - ty.members.len();
                for view in &mut ty.views {
                    let before = view.members.len();
                    view.members.retain(|m| !leaked(m));
                    removed += before - view.members.len();
                }
            }
        }

        if removed > 0 {
            debug!(removed, "leaked indexers removed");
        }
        out
    }
}
