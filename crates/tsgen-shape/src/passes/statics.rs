//! Static-side analysis.

use tsgen_graph::{MemberKind, PassFlags, SymbolGraph, TypeKind};

use super::{ShapeContext, ShapePass};

/// Partition each class's members into instance and static sides and
/// record whether the static side is non-empty, which controls the
/// emitter's companion object. Constructors do not count: every class
/// gets construct signatures regardless.
pub struct StaticSideAnalyzer;

impl ShapePass for StaticSideAnalyzer {
    fn name(&self) -> &'static str {
        "StaticSideAnalyzer"
    }

    fn flag(&self) -> PassFlags {
        PassFlags::STATIC_SIDE_ANALYZER
    }

    fn requires(&self) -> PassFlags {
        PassFlags::FINAL_INDEXERS
    }

    fn run(&self, _ctx: &mut ShapeContext<'_>, graph: &SymbolGraph) -> SymbolGraph {
        let mut out = graph.clone();
        for namespace in &mut out.namespaces {
            for ty in &mut namespace.types {
                if !matches!(ty.kind, TypeKind::Class | TypeKind::Struct) {
                    continue;
                }
                ty.static_side = ty.members.iter().any(|m| {
                    m.is_static && !m.is_omitted() && m.kind != MemberKind::Constructor
                });
            }
        }
        out
    }
}
