//! Generic-constraint closure.

use tsgen_common::diagnostics::codes;
use tsgen_graph::{Constraint, GenericParam, GraphIndices, PassFlags, SymbolGraph, TypeRef};

use super::{ShapeContext, ShapePass};

/// For every generic parameter, close the interface-constraint set under
/// interface inheritance: `T: I` where I extends J implies `T: J`. A
/// cyclic constraint graph is already closed and is left alone;
/// contradictory class constraints are reported.
pub struct ConstraintCloser;

impl ShapePass for ConstraintCloser {
    fn name(&self) -> &'static str {
        "ConstraintCloser"
    }

    fn flag(&self) -> PassFlags {
        PassFlags::CONSTRAINT_CLOSER
    }

    fn run(&self, ctx: &mut ShapeContext<'_>, graph: &SymbolGraph) -> SymbolGraph {
        let mut out = graph.clone();

        for (ns_pos, namespace) in graph.namespaces.iter().enumerate() {
            for (ty_pos, ty) in namespace.types.iter().enumerate() {
                let target = &mut out.namespaces[ns_pos].types[ty_pos];
                for param in &mut target.generics {
                    close_param(&ctx.indices, param);
                    report_class_conflicts(ctx, graph, &namespace.id, &ty.canonical_id, param);
                }
                for member in &mut target.members {
                    for param in &mut member.signature.generics {
                        close_param(&ctx.indices, param);
                        report_class_conflicts(ctx, graph, &namespace.id, &ty.canonical_id, param);
                    }
                }
            }
        }
        out
    }
}

fn close_param(indices: &GraphIndices, param: &mut GenericParam) {
    let mut inherited: Vec<TypeRef> = Vec::new();
    for constraint in &param.constraints {
        let Constraint::Interface(iface) = constraint else {
            continue;
        };
        let Some(closure) = indices.interface_closure.get(&iface.id) else {
            continue;
        };
        for base in closure {
            let already = param.constraints.iter().any(
                |c| matches!(c, Constraint::Interface(r) if r.id == *base),
            ) || inherited.iter().any(|r| r.id == *base);
            if !already {
                inherited.push(TypeRef::named(base.clone()));
            }
        }
    }
    param
        .constraints
        .extend(inherited.into_iter().map(Constraint::Interface));
}

fn report_class_conflicts(
    ctx: &mut ShapeContext<'_>,
    graph: &SymbolGraph,
    ns_id: &str,
    type_id: &str,
    param: &GenericParam,
) {
    let classes: Vec<&TypeRef> = param
        .constraints
        .iter()
        .filter_map(|c| match c {
            Constraint::BaseClass(r) => Some(r),
            _ => None,
        })
        .collect();
    if classes.len() < 2 {
        return;
    }
    for pair in classes.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if a.id == b.id
            || ctx.indices.is_assignable(graph, a, b)
            || ctx.indices.is_assignable(graph, b, a)
        {
            continue;
        }
        ctx.sink.record(
            tsgen_common::Diagnostic::new(
                tsgen_common::Severity::Error,
                codes::SHAPE_CONSTRAINT_CONFLICT,
                format!(
                    "generic parameter '{}' carries contradictory class constraints '{}' and '{}'",
                    param.name, a.id, b.id
                ),
            )
            .with_namespace(ns_id)
            .with_type(type_id),
        );
    }
}

#[cfg(test)]
mod tests {
    use tsgen_common::{DiagnosticsSink, PipelineOptions};
    use tsgen_graph::{GraphBuilder, MemberBuilder, TypeBuilder};

    use super::*;

    fn run(graph: &SymbolGraph, sink: &mut DiagnosticsSink) -> SymbolGraph {
        let options = PipelineOptions::default();
        let mut ctx = ShapeContext {
            indices: GraphIndices::rebuild(graph),
            options: &options,
            sink,
        };
        ConstraintCloser.run(&mut ctx, graph)
    }

    #[test]
    fn test_interface_constraints_close_transitively() {
        let graph = GraphBuilder::new()
            .namespace("N")
            .ty(TypeBuilder::interface("N.IBase"))
            .ty(TypeBuilder::interface("N.IDerived").implements("N.IBase"))
            .ty(TypeBuilder::class("N.Holder`1").generic(
                "T",
                vec![Constraint::Interface(TypeRef::named("N.IDerived"))],
            ))
            .build();

        let mut sink = DiagnosticsSink::new();
        let out = run(&graph, &mut sink);

        let holder = &out.namespaces[0].types[2];
        let constraint_ids: Vec<&str> = holder.generics[0]
            .constraints
            .iter()
            .filter_map(|c| match c {
                Constraint::Interface(r) => Some(r.id.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(constraint_ids, vec!["N.IDerived", "N.IBase"]);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_closing_twice_is_noop() {
        let graph = GraphBuilder::new()
            .namespace("N")
            .ty(TypeBuilder::interface("N.IBase"))
            .ty(TypeBuilder::interface("N.IDerived").implements("N.IBase"))
            .ty(TypeBuilder::class("N.Holder`1").generic(
                "T",
                vec![Constraint::Interface(TypeRef::named("N.IDerived"))],
            ))
            .build();

        let mut sink = DiagnosticsSink::new();
        let once = run(&graph, &mut sink);
        let twice = run(&once, &mut sink);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_contradictory_class_constraints_reported() {
        let graph = GraphBuilder::new()
            .namespace("N")
            .ty(TypeBuilder::class("N.A"))
            .ty(TypeBuilder::class("N.B"))
            .ty(TypeBuilder::class("N.Holder`1")
                .generic(
                    "T",
                    vec![
                        Constraint::BaseClass(TypeRef::named("N.A")),
                        Constraint::BaseClass(TypeRef::named("N.B")),
                    ],
                )
                .member(MemberBuilder::method("Get", "System.Void")))
            .build();

        let mut sink = DiagnosticsSink::new();
        let _ = run(&graph, &mut sink);
        assert!(sink.has_errors());
        assert!(sink.iter().any(|d| d.code == codes::SHAPE_CONSTRAINT_CONFLICT));
    }
}
