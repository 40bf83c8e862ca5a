//! Duplicate elimination on class surfaces.

use rustc_hash::FxHashSet;
use tracing::debug;
use tsgen_graph::{PassFlags, SymbolGraph, ViewTag};

use super::{ShapeContext, ShapePass};

/// Remove exact duplicates (same name, same erased signature, same view
/// tag), keeping the earliest in declaration order.
pub struct MemberDeduplicator;

impl ShapePass for MemberDeduplicator {
    fn name(&self) -> &'static str {
        "MemberDeduplicator"
    }

    fn flag(&self) -> PassFlags {
        PassFlags::MEMBER_DEDUPLICATOR
    }

    fn requires(&self) -> PassFlags {
        PassFlags::OVERLOAD_RETURN_RESOLVER
    }

    fn run(&self, _ctx: &mut ShapeContext<'_>, graph: &SymbolGraph) -> SymbolGraph {
        let mut out = graph.clone();
        let mut removed = 0usize;

        for namespace in &mut out.namespaces {
            for ty in &mut namespace.types {
                let mut seen: FxHashSet<(String, String, ViewTag)> = FxHashSet::default();
                let before = ty.members.len();
                ty.members.retain(|m| {
                    let (name, erased) = m.erased_key();
                    seen.insert((name, erased, m.view_tag.clone()))
                });
                removed += before - ty.members.len();
            }
        }

        if removed > 0 {
            debug!(removed, "duplicate members removed");
        }
        out
    }
}

/// When a view member exactly duplicates a class-surface member, the
/// surface copy yields so the view remains the single source of truth.
pub struct ClassSurfaceDeduplicator;

impl ShapePass for ClassSurfaceDeduplicator {
    fn name(&self) -> &'static str {
        "ClassSurfaceDeduplicator"
    }

    fn flag(&self) -> PassFlags {
        PassFlags::CLASS_SURFACE_DEDUPLICATOR
    }

    fn requires(&self) -> PassFlags {
        PassFlags::VIEW_PLANNER
    }

    fn run(&self, _ctx: &mut ShapeContext<'_>, graph: &SymbolGraph) -> SymbolGraph {
        let mut out = graph.clone();

        for namespace in &mut out.namespaces {
            for ty in &mut namespace.types {
                if ty.views.is_empty() {
                    continue;
                }
                let views = std::mem::take(&mut ty.views);
                ty.members.retain(|member| {
                    if member.view_tag != ViewTag::None {
                        return true;
                    }
                    let duplicated = views.iter().any(|view| {
                        view.members
                            .iter()
                            .any(|vm| vm.name == member.name && vm.signature == member.signature)
                    });
                    !duplicated
                });
                ty.views = views;
            }
        }
        out
    }
}
