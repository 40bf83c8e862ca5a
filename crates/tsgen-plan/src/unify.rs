//! Overload unification.
//!
//! Members that share a scope and a source name collapse into a single
//! declaration carrying every distinct parameter list as an overload
//! signature, ordered by descending specificity; the merged declaration
//! keeps the lead member's reserved emission name. Constructors unify
//! the same way: every constructor shares the `constructor` slot.
//! Non-callable groups are left untouched.

use rustc_hash::FxHashSet;
use tracing::debug;
use tsgen_common::{DiagnosticsSink, PipelineOptions};
use tsgen_graph::{GraphIndices, Member, MemberKind, Signature, SymbolGraph, Type, TypeKind, View, ViewTag};
use tsgen_shape::passes::reconcile_member_returns;

pub fn unify_overloads(
    graph: &SymbolGraph,
    indices: &GraphIndices,
    options: &PipelineOptions,
    sink: &mut DiagnosticsSink,
) -> SymbolGraph {
    let mut out = graph.clone();
    let mut merged_total = 0usize;

    for (ns_pos, namespace) in graph.namespaces.iter().enumerate() {
        for (ty_pos, ty) in namespace.types.iter().enumerate() {
            if !matches!(ty.kind, TypeKind::Class | TypeKind::Struct | TypeKind::Interface) {
                continue;
            }
            let target = &mut out.namespaces[ns_pos].types[ty_pos];
            let mut extra = Vec::new();

            for is_static in [false, true] {
                merged_total += unify_member_list(
                    &mut target.members,
                    Some(is_static),
                    indices,
                    graph,
                    options,
                    sink,
                    &namespace.id,
                    &ty.canonical_id,
                    &mut extra,
                );
            }
            for view in &mut target.views {
                merged_total += unify_member_list(
                    &mut view.members,
                    None,
                    indices,
                    graph,
                    options,
                    sink,
                    &namespace.id,
                    &ty.canonical_id,
                    &mut extra,
                );
            }
            // Demoted signatures materialized after view planning must
            // still land in their views; the surface only keeps omitted
            // tombstones.
            for member in extra {
                place_demoted(target, member);
            }
        }
    }

    if merged_total > 0 {
        debug!(merged = merged_total, "overload groups unified");
    }
    out
}

fn place_demoted(target: &mut Type, member: Member) {
    match &member.view_tag {
        ViewTag::ViewOnly(interface_id) => {
            let interface_id = interface_id.clone();
            match target.view_mut(&interface_id) {
                Some(view) => view.members.push(member),
                None => target.views.push(View {
                    interface_id,
                    members: vec![member],
                }),
            }
        }
        _ => target.members.push(member),
    }
}

fn is_callable(member: &Member) -> bool {
    matches!(member.kind, MemberKind::Method | MemberKind::Constructor)
}

/// Merge same-name callable groups inside one member list. Returns the
/// number of groups merged; any members split off by return demotion are
/// pushed onto `extra`.
fn unify_member_list(
    members: &mut Vec<Member>,
    staticness: Option<bool>,
    indices: &GraphIndices,
    graph: &SymbolGraph,
    options: &PipelineOptions,
    sink: &mut DiagnosticsSink,
    ns_id: &str,
    type_id: &str,
    extra: &mut Vec<Member>,
) -> usize {
    // Group positions by source name, in first-seen order.
    let mut groups: Vec<(String, Vec<usize>)> = Vec::new();
    for (pos, member) in members.iter().enumerate() {
        if member.is_omitted() {
            continue;
        }
        if let Some(wanted) = staticness
            && member.is_static != wanted
        {
            continue;
        }
        // Group on the source name: the reserver has already split the
        // group across suffixed emission names, and the merged
        // declaration keeps the lead member's reservation.
        let name = member.name.clone();
        match groups.iter_mut().find(|(n, _)| *n == name) {
            Some((_, positions)) => positions.push(pos),
            None => groups.push((name, vec![pos])),
        }
    }

    let mut merged = 0usize;
    let mut remove: FxHashSet<usize> = FxHashSet::default();
    for (_, positions) in groups {
        if positions.len() < 2 || !positions.iter().all(|&p| is_callable(&members[p])) {
            continue;
        }
        // All signatures of the group, deduped on erased shape, in
        // declaration order.
        let mut seen: FxHashSet<String> = FxHashSet::default();
        let mut signatures: Vec<Signature> = Vec::new();
        for &p in &positions {
            for signature in members[p].signatures() {
                if seen.insert(signature.erased()) {
                    signatures.push(signature.clone());
                }
            }
        }
        // Descending specificity: fewer optional/rest parameters first;
        // stable sort keeps declaration order on ties.
        signatures.sort_by_key(Signature::looseness);

        let lead = positions[0];
        let mut iter = signatures.into_iter();
        if let Some(primary) = iter.next() {
            members[lead].signature = primary;
        }
        members[lead].overloads = iter.collect();
        for &p in &positions[1..] {
            remove.insert(p);
        }
        merged += 1;

        if members[lead].kind == MemberKind::Method {
            extra.extend(reconcile_member_returns(
                indices,
                graph,
                options,
                sink,
                ns_id,
                type_id,
                &mut members[lead],
            ));
        }
    }

    if !remove.is_empty() {
        let mut pos = 0usize;
        members.retain(|_| {
            let keep = !remove.contains(&pos);
            pos += 1;
            keep
        });
    }
    merged
}

#[cfg(test)]
mod tests {
    use tsgen_common::diagnostics::codes;
    use tsgen_graph::{EmitScope, GraphBuilder, MemberBuilder, SymbolGraph, TypeBuilder};

    use super::*;

    fn named(mut graph: SymbolGraph) -> SymbolGraph {
        for namespace in &mut graph.namespaces {
            for ty in &mut namespace.types {
                ty.emit_scope = EmitScope::Public;
                ty.ts_name = Some(ty.proposed_name().to_string());
                for member in &mut ty.members {
                    member.ts_name = Some(member.name.clone());
                }
            }
        }
        graph
    }

    #[test]
    fn test_same_name_methods_merge_into_overload_set() {
        let graph = named(
            GraphBuilder::new()
                .namespace("N")
                .ty(TypeBuilder::class("N.C")
                    .member(MemberBuilder::method("Run", "System.Void").optional_param("x", "System.Int32"))
                    .member(MemberBuilder::method("Run", "System.Void").param("x", "System.String")))
                .build(),
        );
        let indices = GraphIndices::rebuild(&graph);
        let options = PipelineOptions::default();
        let mut sink = DiagnosticsSink::new();
        let out = unify_overloads(&graph, &indices, &options, &mut sink);

        let c = &out.namespaces[0].types[0];
        assert_eq!(c.members.len(), 1);
        let run = &c.members[0];
        // The stricter signature (no optional parameters) leads.
        assert_eq!(run.signature.params[0].ty.id, "System.String");
        assert_eq!(run.overloads.len(), 1);
        assert!(run.overloads[0].params[0].optional);
    }

    #[test]
    fn test_mixed_kind_group_is_untouched() {
        let graph = named(
            GraphBuilder::new()
                .namespace("N")
                .ty(TypeBuilder::class("N.C")
                    .member(MemberBuilder::method("Count", "System.Int32"))
                    .member(MemberBuilder::property("Count", "System.Int32")))
                .build(),
        );
        let indices = GraphIndices::rebuild(&graph);
        let options = PipelineOptions::default();
        let mut sink = DiagnosticsSink::new();
        let out = unify_overloads(&graph, &indices, &options, &mut sink);
        assert_eq!(out.namespaces[0].types[0].members.len(), 2);
    }

    #[test]
    fn test_constructor_overloads_collapse() {
        let mut graph = named(
            GraphBuilder::new()
                .namespace("N")
                .ty(TypeBuilder::class("N.C")
                    .member(MemberBuilder::constructor())
                    .member(MemberBuilder::constructor()))
                .build(),
        );
        // Reservation gives every constructor the shared slot.
        for member in &mut graph.namespaces[0].types[0].members {
            member.ts_name = Some("constructor".to_string());
        }
        graph.namespaces[0].types[0].members[1]
            .signature
            .params
            .push(tsgen_graph::Param::new(
                "x",
                tsgen_graph::TypeRef::named("System.Int32"),
            ));

        let indices = GraphIndices::rebuild(&graph);
        let options = PipelineOptions::default();
        let mut sink = DiagnosticsSink::new();
        let out = unify_overloads(&graph, &indices, &options, &mut sink);

        let c = &out.namespaces[0].types[0];
        assert_eq!(c.members.len(), 1);
        assert_eq!(c.members[0].overloads.len(), 1);
    }

    #[test]
    fn test_unreconciled_returns_reconcile_here() {
        let graph = named(
            GraphBuilder::new()
                .namespace("N")
                .ty(TypeBuilder::class("N.Animal"))
                .ty(TypeBuilder::class("N.Cat").base("N.Animal"))
                .ty(TypeBuilder::class("N.Dog").base("N.Animal"))
                .ty(TypeBuilder::class("N.Shelter")
                    .member(MemberBuilder::method("M", "N.Cat").param("x", "System.Int32"))
                    .member(MemberBuilder::method("M", "N.Dog").param("x", "System.String")))
                .build(),
        );
        let indices = GraphIndices::rebuild(&graph);
        let options = PipelineOptions::default();
        let mut sink = DiagnosticsSink::new();
        let out = unify_overloads(&graph, &indices, &options, &mut sink);

        let shelter = &out.namespaces[0].types[3];
        assert_eq!(shelter.members.len(), 1);
        assert!(
            shelter.members[0]
                .signatures()
                .all(|s| s.ret.id == "N.Animal")
        );
        assert!(sink.iter().any(|d| d.code == codes::SHAPE_OVERLOAD_WIDENED));
    }
}
