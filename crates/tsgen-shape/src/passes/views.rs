//! View materialization.
//!
//! Every ViewOnly(I) group on a type becomes a named projection that the
//! emitter renders as a separate object scoped to (type, interface).
//! Views are ordered by interface id so downstream name reservation sees
//! a stable sequence.

use std::collections::BTreeMap;

use tracing::debug;
use tsgen_graph::{PassFlags, SymbolGraph, View, ViewTag};

use super::{ShapeContext, ShapePass};

pub struct ViewPlanner;

impl ShapePass for ViewPlanner {
    fn name(&self) -> &'static str {
        "ViewPlanner"
    }

    fn flag(&self) -> PassFlags {
        PassFlags::VIEW_PLANNER
    }

    fn requires(&self) -> PassFlags {
        PassFlags::STRUCTURAL_CONFORMANCE
            | PassFlags::EXPLICIT_IMPL_SYNTHESIZER
            | PassFlags::DIAMOND_RESOLVER
    }

    fn run(&self, _ctx: &mut ShapeContext<'_>, graph: &SymbolGraph) -> SymbolGraph {
        let mut out = graph.clone();
        let mut views_total = 0usize;

        for namespace in &mut out.namespaces {
            for ty in &mut namespace.types {
                let mut grouped: BTreeMap<String, Vec<tsgen_graph::Member>> = BTreeMap::new();
                let mut surface = Vec::with_capacity(ty.members.len());
                for member in ty.members.drain(..) {
                    match &member.view_tag {
                        ViewTag::ViewOnly(iface) => {
                            grouped.entry(iface.clone()).or_default().push(member);
                        }
                        _ => surface.push(member),
                    }
                }
                ty.members = surface;

                // Merge with any views from an earlier run of the pass.
                for view in ty.views.drain(..) {
                    grouped.entry(view.interface_id).or_default().extend(view.members);
                }
                ty.views = grouped
                    .into_iter()
                    .map(|(interface_id, members)| View {
                        interface_id,
                        members,
                    })
                    .collect();
                views_total += ty.views.len();
            }
        }

        debug!(views = views_total, "views materialized");
        out
    }
}

#[cfg(test)]
mod tests {
    use tsgen_common::{DiagnosticsSink, PipelineOptions};
    use tsgen_graph::{GraphBuilder, GraphIndices, MemberBuilder, TypeBuilder};

    use super::*;

    #[test]
    fn test_view_only_members_group_by_interface_sorted() {
        let mut graph = GraphBuilder::new()
            .namespace("N")
            .ty(TypeBuilder::class("N.C")
                .member(MemberBuilder::method("Keep", "System.Void"))
                .member(MemberBuilder::method("B1", "System.Void"))
                .member(MemberBuilder::method("A1", "System.Void")))
            .build();
        graph.namespaces[0].types[0].members[1].view_tag = ViewTag::ViewOnly("N.IB".to_string());
        graph.namespaces[0].types[0].members[2].view_tag = ViewTag::ViewOnly("N.IA".to_string());

        let options = PipelineOptions::default();
        let mut sink = DiagnosticsSink::new();
        let mut ctx = ShapeContext {
            indices: GraphIndices::rebuild(&graph),
            options: &options,
            sink: &mut sink,
        };
        let out = ViewPlanner.run(&mut ctx, &graph);

        let c = &out.namespaces[0].types[0];
        assert_eq!(c.members.len(), 1);
        assert_eq!(c.members[0].name, "Keep");
        let view_ids: Vec<&str> = c.views.iter().map(|v| v.interface_id.as_str()).collect();
        assert_eq!(view_ids, vec!["N.IA", "N.IB"]);
        assert_eq!(c.views[0].members[0].name, "A1");
        assert_eq!(c.views[1].members[0].name, "B1");
    }
}
