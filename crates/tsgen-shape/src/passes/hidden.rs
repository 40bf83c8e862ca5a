//! Member hiding (`new` modifier).

use tsgen_graph::{PassFlags, SymbolGraph, ViewTag};

use super::{ShapeContext, ShapePass};

/// Tag shadowing members Hidden and sever the documentation link they
/// would otherwise inherit from the member they hide.
pub struct HiddenMemberPlanner;

impl ShapePass for HiddenMemberPlanner {
    fn name(&self) -> &'static str {
        "HiddenMemberPlanner"
    }

    fn flag(&self) -> PassFlags {
        PassFlags::HIDDEN_MEMBER_PLANNER
    }

    fn requires(&self) -> PassFlags {
        PassFlags::INTERFACE_INLINER
    }

    fn run(&self, _ctx: &mut ShapeContext<'_>, graph: &SymbolGraph) -> SymbolGraph {
        let mut out = graph.clone();
        for namespace in &mut out.namespaces {
            for ty in &mut namespace.types {
                for member in &mut ty.members {
                    if member.hides_base && member.view_tag == ViewTag::None {
                        member.view_tag = ViewTag::Hidden;
                        member.doc_link = None;
                    }
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use tsgen_common::{DiagnosticsSink, PipelineOptions};
    use tsgen_graph::{GraphBuilder, GraphIndices, MemberBuilder, TypeBuilder};

    use super::*;

    #[test]
    fn test_hiding_member_tagged_and_doc_link_severed() {
        let graph = GraphBuilder::new()
            .namespace("N")
            .ty(TypeBuilder::class("N.D")
                .member(MemberBuilder::method("Foo", "System.String").hides_base().doc_link("B.Foo")))
            .build();

        let options = PipelineOptions::default();
        let mut sink = DiagnosticsSink::new();
        let mut ctx = ShapeContext {
            indices: GraphIndices::rebuild(&graph),
            options: &options,
            sink: &mut sink,
        };
        let out = HiddenMemberPlanner.run(&mut ctx, &graph);

        let foo = &out.namespaces[0].types[0].members[0];
        assert_eq!(foo.view_tag, ViewTag::Hidden);
        assert!(foo.doc_link.is_none());
    }
}
