//! Overload surface construction and return reconciliation.
//!
//! TypeScript redeclares the full callable surface on every override, so
//! visible base-class signatures are pulled into each method's overload
//! list; overload sets whose returns diverge are widened to a common
//! nominal supertype or demoted to views.

use rustc_hash::FxHashSet;
use tsgen_common::diagnostics::codes;
use tsgen_common::{DiagnosticsSink, PipelineOptions};
use tsgen_graph::{
    GraphIndices, Member, MemberKind, OmitReason, PassFlags, SymbolGraph, TypeKind, TypeRef,
    Visibility, ViewTag,
};

use super::{ShapeContext, ShapePass};

/// For each class method, add all visible base-class methods sharing its
/// name that are not already represented. Hiding (`new` modifier) severs
/// the relationship: a hidden member never merges with what it shadows.
pub struct BaseOverloadAdder;

impl ShapePass for BaseOverloadAdder {
    fn name(&self) -> &'static str {
        "BaseOverloadAdder"
    }

    fn flag(&self) -> PassFlags {
        PassFlags::BASE_OVERLOAD_ADDER
    }

    fn requires(&self) -> PassFlags {
        PassFlags::DIAMOND_RESOLVER
    }

    fn run(&self, ctx: &mut ShapeContext<'_>, graph: &SymbolGraph) -> SymbolGraph {
        let mut out = graph.clone();

        for (ns_pos, namespace) in graph.namespaces.iter().enumerate() {
            for (ty_pos, ty) in namespace.types.iter().enumerate() {
                if ty.kind != TypeKind::Class {
                    continue;
                }
                for (m_pos, member) in ty.members.iter().enumerate() {
                    if member.kind != MemberKind::Method
                        || member.view_tag != ViewTag::None
                        || member.hides_base
                    {
                        continue;
                    }
                    // Signatures already represented anywhere on this
                    // surface under this name.
                    let mut represented: FxHashSet<String> = ty
                        .members
                        .iter()
                        .filter(|m| m.name == member.name && m.is_static == member.is_static)
                        .flat_map(|m| m.signatures().map(|s| s.erased()))
                        .collect();

                    let mut added = Vec::new();
                    let mut visited: FxHashSet<String> = FxHashSet::default();
                    let mut base_ref = ty.base.clone();
                    while let Some(current) = base_ref {
                        if !visited.insert(current.id.clone()) {
                            break;
                        }
                        let Some(base) = ctx.indices.lookup(graph, &current.id) else {
                            break;
                        };
                        for base_member in &base.members {
                            if base_member.kind != MemberKind::Method
                                || base_member.name != member.name
                                || base_member.is_static != member.is_static
                                || !matches!(
                                    base_member.visibility,
                                    Visibility::Public | Visibility::Protected
                                )
                            {
                                continue;
                            }
                            for signature in base_member.signatures() {
                                if represented.insert(signature.erased()) {
                                    added.push(signature.clone());
                                }
                            }
                        }
                        base_ref = base.base.clone();
                    }

                    out.namespaces[ns_pos].types[ty_pos].members[m_pos]
                        .overloads
                        .extend(added);
                }
            }
        }
        out
    }
}

/// Reconcile an overload set whose returns diverge: widen to the minimal
/// common nominal supertype when the set is small enough and the returns
/// are nominal siblings, else demote the offending signatures. Returns
/// any members split off by demotion.
pub fn reconcile_member_returns(
    indices: &GraphIndices,
    graph: &SymbolGraph,
    options: &PipelineOptions,
    sink: &mut DiagnosticsSink,
    ns_id: &str,
    type_id: &str,
    member: &mut Member,
) -> Vec<Member> {
    if member.overloads.is_empty() {
        return Vec::new();
    }
    let mut distinct: Vec<&TypeRef> = Vec::new();
    for signature in member.signatures() {
        if !distinct.iter().any(|r| r.id == signature.ret.id) {
            distinct.push(&signature.ret);
        }
    }
    if distinct.len() < 2 {
        return Vec::new();
    }

    if options.widen_overload_returns
        && distinct.len() <= options.max_overload_return_union
        && let Some(common) = common_supertype(indices, graph, &distinct)
    {
        sink.record(
            tsgen_common::Diagnostic::new(
                tsgen_common::Severity::Warning,
                codes::SHAPE_OVERLOAD_WIDENED,
                format!(
                    "overloads of '{}' return {} distinct types; widened to '{}'",
                    member.name,
                    distinct.len(),
                    common
                ),
            )
            .with_namespace(ns_id)
            .with_type(type_id)
            .with_member(member.name.clone()),
        );
        let widened = TypeRef::named(common);
        member.signature.ret = widened.clone();
        for overload in &mut member.overloads {
            overload.ret = widened.clone();
        }
        return Vec::new();
    }

    // Demote: signatures disagreeing with the primary return leave the
    // overload set.
    let primary_ret = member.signature.ret.id.clone();
    let overloads = std::mem::take(&mut member.overloads);
    let mut demoted = Vec::new();
    let mut kept = Vec::new();
    for overload in overloads {
        if overload.ret.id == primary_ret {
            kept.push(overload);
            continue;
        }
        let mut split = member.clone();
        split.signature = overload;
        split.overloads = Vec::new();
        split.view_tag = match &member.declaring_interface {
            Some(iface) => ViewTag::ViewOnly(iface.clone()),
            None => ViewTag::Omitted(OmitReason::ReturnConflict),
        };
        demoted.push(split);
    }
    member.overloads = kept;

    sink.record(
        tsgen_common::Diagnostic::new(
            tsgen_common::Severity::Warning,
            codes::SHAPE_OVERLOAD_DEMOTED,
            format!(
                "overloads of '{}' return incompatible types; {} signature(s) demoted",
                member.name,
                demoted.len()
            ),
        )
        .with_namespace(ns_id)
        .with_type(type_id)
        .with_member(member.name.clone()),
    );
    demoted
}

/// The minimal nominal supertype shared by every given return type, if
/// one resolves inside the graph. Discovery order of the first return's
/// ancestor walk makes the choice deterministic.
fn common_supertype(
    indices: &GraphIndices,
    graph: &SymbolGraph,
    returns: &[&TypeRef],
) -> Option<String> {
    let first = indices.ancestors(graph, &returns[0].id);
    'candidates: for candidate in &first {
        if candidate == &returns[0].id {
            continue;
        }
        if !indices.types.contains_key(candidate) {
            continue;
        }
        for ret in &returns[1..] {
            if !indices.ancestors(graph, &ret.id).contains(candidate) {
                continue 'candidates;
            }
        }
        return Some(candidate.clone());
    }
    None
}

/// Apply return reconciliation to every class-surface overload set.
pub struct OverloadReturnConflictResolver;

impl ShapePass for OverloadReturnConflictResolver {
    fn name(&self) -> &'static str {
        "OverloadReturnConflictResolver"
    }

    fn flag(&self) -> PassFlags {
        PassFlags::OVERLOAD_RETURN_RESOLVER
    }

    fn requires(&self) -> PassFlags {
        PassFlags::BASE_OVERLOAD_ADDER
    }

    fn run(&self, ctx: &mut ShapeContext<'_>, graph: &SymbolGraph) -> SymbolGraph {
        let mut out = graph.clone();

        for (ns_pos, namespace) in graph.namespaces.iter().enumerate() {
            for (ty_pos, ty) in namespace.types.iter().enumerate() {
                if !matches!(ty.kind, TypeKind::Class | TypeKind::Struct) {
                    continue;
                }
                let mut split_members = Vec::new();
                for member in &mut out.namespaces[ns_pos].types[ty_pos].members {
                    if member.kind != MemberKind::Method || member.view_tag != ViewTag::None {
                        continue;
                    }
                    split_members.extend(reconcile_member_returns(
                        &ctx.indices,
                        graph,
                        ctx.options,
                        ctx.sink,
                        &namespace.id,
                        &ty.canonical_id,
                        member,
                    ));
                }
                out.namespaces[ns_pos].types[ty_pos]
                    .members
                    .extend(split_members);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use tsgen_graph::{GraphBuilder, MemberBuilder, Param, Signature, TypeBuilder};

    use super::*;

    fn animal_graph() -> SymbolGraph {
        GraphBuilder::new()
            .namespace("N")
            .ty(TypeBuilder::class("N.Animal"))
            .ty(TypeBuilder::class("N.Cat").base("N.Animal"))
            .ty(TypeBuilder::class("N.Dog").base("N.Animal"))
            .ty(TypeBuilder::class("N.Shelter").member(
                MemberBuilder::method("M", "N.Cat").param("x", "System.Int32").overload(
                    Signature::with_params(
                        [Param::new("x", TypeRef::named("System.String"))],
                        TypeRef::named("N.Dog"),
                    ),
                ),
            ))
            .build()
    }

    #[test]
    fn test_nominal_siblings_widen_to_common_supertype() {
        let graph = animal_graph();
        let options = PipelineOptions::default();
        let mut sink = DiagnosticsSink::new();
        let mut ctx = ShapeContext {
            indices: GraphIndices::rebuild(&graph),
            options: &options,
            sink: &mut sink,
        };
        let out = OverloadReturnConflictResolver.run(&mut ctx, &graph);

        let member = &out.namespaces[0].types[3].members[0];
        assert_eq!(member.signature.ret.id, "N.Animal");
        assert!(member.overloads.iter().all(|s| s.ret.id == "N.Animal"));
        assert!(sink.iter().any(|d| d.code == codes::SHAPE_OVERLOAD_WIDENED));
    }

    #[test]
    fn test_unrelated_returns_demote() {
        let graph = GraphBuilder::new()
            .namespace("N")
            .ty(TypeBuilder::class("N.Cat"))
            .ty(TypeBuilder::class("N.Dog"))
            .ty(TypeBuilder::class("N.Shelter").member(
                MemberBuilder::method("M", "N.Cat").param("x", "System.Int32").overload(
                    Signature::with_params(
                        [Param::new("x", TypeRef::named("System.String"))],
                        TypeRef::named("N.Dog"),
                    ),
                ),
            ))
            .build();

        let options = PipelineOptions::default();
        let mut sink = DiagnosticsSink::new();
        let mut ctx = ShapeContext {
            indices: GraphIndices::rebuild(&graph),
            options: &options,
            sink: &mut sink,
        };
        let out = OverloadReturnConflictResolver.run(&mut ctx, &graph);

        let shelter = &out.namespaces[0].types[2];
        assert_eq!(shelter.members.len(), 2);
        assert!(shelter.members[0].overloads.is_empty());
        assert_eq!(
            shelter.members[1].view_tag,
            ViewTag::Omitted(OmitReason::ReturnConflict)
        );
        assert!(sink.iter().any(|d| d.code == codes::SHAPE_OVERLOAD_DEMOTED));
    }

    #[test]
    fn test_widen_disabled_by_option() {
        let graph = animal_graph();
        let options = PipelineOptions {
            widen_overload_returns: false,
            ..PipelineOptions::default()
        };
        let mut sink = DiagnosticsSink::new();
        let mut ctx = ShapeContext {
            indices: GraphIndices::rebuild(&graph),
            options: &options,
            sink: &mut sink,
        };
        let out = OverloadReturnConflictResolver.run(&mut ctx, &graph);
        let shelter = &out.namespaces[0].types[3];
        assert!(sink.iter().any(|d| d.code == codes::SHAPE_OVERLOAD_DEMOTED));
        assert_eq!(shelter.members.len(), 2);
    }

    #[test]
    fn test_base_overloads_pulled_into_derived_method() {
        let graph = GraphBuilder::new()
            .namespace("N")
            .ty(TypeBuilder::class("N.Base")
                .member(MemberBuilder::method("Write", "System.Void").param("value", "System.Int32")))
            .ty(TypeBuilder::class("N.Derived")
                .base("N.Base")
                .member(MemberBuilder::method("Write", "System.Void").param("value", "System.String")))
            .build();

        let options = PipelineOptions::default();
        let mut sink = DiagnosticsSink::new();
        let mut ctx = ShapeContext {
            indices: GraphIndices::rebuild(&graph),
            options: &options,
            sink: &mut sink,
        };
        let out = BaseOverloadAdder.run(&mut ctx, &graph);

        let derived_write = &out.namespaces[0].types[1].members[0];
        assert_eq!(derived_write.overloads.len(), 1);
        assert_eq!(derived_write.overloads[0].params[0].ty.id, "System.Int32");
    }

    #[test]
    fn test_hiding_member_never_merges_base_signatures() {
        let graph = GraphBuilder::new()
            .namespace("N")
            .ty(TypeBuilder::class("N.B").member(MemberBuilder::method("Foo", "System.Int32")))
            .ty(TypeBuilder::class("N.D")
                .base("N.B")
                .member(MemberBuilder::method("Foo", "System.String").hides_base()))
            .build();

        let options = PipelineOptions::default();
        let mut sink = DiagnosticsSink::new();
        let mut ctx = ShapeContext {
            indices: GraphIndices::rebuild(&graph),
            options: &options,
            sink: &mut sink,
        };
        let out = BaseOverloadAdder.run(&mut ctx, &graph);
        let foo = &out.namespaces[0].types[1].members[0];
        assert!(foo.overloads.is_empty());
    }
}
