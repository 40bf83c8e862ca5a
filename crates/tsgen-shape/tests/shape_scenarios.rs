//! End-to-end scenarios over the full shape pass chain.

use tsgen_common::diagnostics::codes;
use tsgen_common::{DiagnosticsSink, PipelineOptions, Severity};
use tsgen_graph::{
    EmitScope, GraphBuilder, MemberBuilder, MemberKind, Param, Signature, SymbolGraph, TypeBuilder,
    TypeRef, ViewTag,
};
use tsgen_shape::run_shape_passes;

fn shape(graph: SymbolGraph) -> (SymbolGraph, DiagnosticsSink) {
    shape_with(graph, PipelineOptions::default())
}

fn shape_with(graph: SymbolGraph, options: PipelineOptions) -> (SymbolGraph, DiagnosticsSink) {
    let mut sink = DiagnosticsSink::new();
    let shaped = run_shape_passes(graph, &options, &mut sink).expect("pass chain in order");
    (shaped, sink)
}

#[test]
fn test_diamond_resolves_to_single_surface_member() {
    let graph = GraphBuilder::new()
        .namespace("N")
        .ty(TypeBuilder::interface("N.IA").member(MemberBuilder::method("M", "System.Void")))
        .ty(TypeBuilder::interface("N.IB").member(MemberBuilder::method("M", "System.Void")))
        .ty(TypeBuilder::class("N.D")
            .implements("N.IA")
            .implements("N.IB")
            .member(MemberBuilder::method("M", "System.Void")))
        .build();

    let (shaped, sink) = shape(graph);

    let d = shaped
        .types()
        .find(|(_, t)| t.canonical_id == "N.D")
        .map(|(_, t)| t)
        .expect("N.D survives");
    let surface_m: Vec<_> = d
        .members
        .iter()
        .filter(|m| m.name == "M" && m.view_tag == ViewTag::None)
        .collect();
    assert_eq!(surface_m.len(), 1, "surface carries exactly one M");

    let resolved: Vec<_> = sink
        .iter()
        .filter(|d| d.code == codes::SHAPE_DIAMOND_RESOLVED)
        .collect();
    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved[0].severity, Severity::Info);
    assert!(resolved[0].message.contains("N.IA") && resolved[0].message.contains("N.IB"));
}

#[test]
fn test_hidden_member_is_tagged_and_not_merged() {
    let graph = GraphBuilder::new()
        .namespace("N")
        .ty(TypeBuilder::class("N.B").member(MemberBuilder::method("Foo", "System.Int32")))
        .ty(TypeBuilder::class("N.D")
            .base("N.B")
            .member(MemberBuilder::method("Foo", "System.String").hides_base()))
        .build();

    let (shaped, _sink) = shape(graph);

    let d = shaped
        .types()
        .find(|(_, t)| t.canonical_id == "N.D")
        .map(|(_, t)| t)
        .expect("N.D survives");
    let foo = d.members.iter().find(|m| m.name == "Foo").expect("Foo kept");
    assert_eq!(foo.view_tag, ViewTag::Hidden);
    assert!(
        foo.overloads.is_empty(),
        "hiding severs overload merging with the base declaration"
    );
    assert_eq!(foo.signature.ret.id, "System.String");
}

#[test]
fn test_overload_returns_widen_to_common_supertype() {
    let graph = GraphBuilder::new()
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
        .build();

    let (shaped, sink) = shape(graph);

    let shelter = shaped
        .types()
        .find(|(_, t)| t.canonical_id == "N.Shelter")
        .map(|(_, t)| t)
        .expect("shelter survives");
    let m = shelter.members.iter().find(|m| m.name == "M").expect("M kept");
    assert!(m.signatures().all(|s| s.ret.id == "N.Animal"));

    let widened: Vec<_> = sink
        .iter()
        .filter(|d| d.code == codes::SHAPE_OVERLOAD_WIDENED)
        .collect();
    assert_eq!(widened.len(), 1);
    assert_eq!(widened[0].severity, Severity::Warning);
}

#[test]
fn test_indexer_leaves_no_named_member() {
    let graph = GraphBuilder::new()
        .namespace("N")
        .ty(TypeBuilder::class("N.Lookup")
            .member(MemberBuilder::indexer("System.Int32", "System.String"))
            .member(MemberBuilder::method("Count", "System.Int32")))
        .build();

    let (shaped, _sink) = shape(graph);

    let lookup = shaped
        .types()
        .find(|(_, t)| t.canonical_id == "N.Lookup")
        .map(|(_, t)| t)
        .expect("lookup survives");
    assert!(
        lookup
            .members
            .iter()
            .all(|m| m.kind != MemberKind::Indexer || m.view_tag.is_omitted()),
        "no indexer with a non-omitted tag remains"
    );
    // The type itself still emits.
    assert_ne!(lookup.emit_scope, EmitScope::Omitted);
    assert!(lookup.members.iter().any(|m| m.name == "Count"));
}

#[test]
fn test_unimplemented_contract_lands_in_view() {
    let graph = GraphBuilder::new()
        .namespace("N")
        .ty(TypeBuilder::interface("N.ILog").member(MemberBuilder::method("Log", "System.Void")))
        .ty(TypeBuilder::class("N.Quiet").implements("N.ILog"))
        .build();

    let (shaped, _sink) = shape(graph);

    let quiet = shaped
        .types()
        .find(|(_, t)| t.canonical_id == "N.Quiet")
        .map(|(_, t)| t)
        .expect("quiet survives");
    assert!(quiet.members.iter().all(|m| m.name != "Log"));
    let view = quiet.view("N.ILog").expect("view for N.ILog");
    assert_eq!(view.members.len(), 1);
    assert_eq!(view.members[0].name, "Log");
}

#[test]
fn test_inliner_fixpoint_through_the_chain() {
    let graph = GraphBuilder::new()
        .namespace("N")
        .ty(TypeBuilder::interface("N.IBase").member(MemberBuilder::method("M", "System.Void")))
        .ty(TypeBuilder::interface("N.IDerived").implements("N.IBase"))
        .build();

    let (once, _) = shape(graph);
    // Re-running the chain over its own output must not duplicate
    // inlined members.
    let mut again = once.clone();
    again.passes_run = tsgen_graph::PassFlags::empty();
    let (twice, _) = shape(again);

    let d_once = once
        .types()
        .find(|(_, t)| t.canonical_id == "N.IDerived")
        .map(|(_, t)| t.members.len())
        .expect("derived");
    let d_twice = twice
        .types()
        .find(|(_, t)| t.canonical_id == "N.IDerived")
        .map(|(_, t)| t.members.len())
        .expect("derived");
    assert_eq!(d_once, 1);
    assert_eq!(d_once, d_twice);
}

#[test]
fn test_purity_input_graph_is_untouched() {
    let graph = GraphBuilder::new()
        .namespace("N")
        .ty(TypeBuilder::interface("N.IA").member(MemberBuilder::method("M", "System.Void")))
        .ty(TypeBuilder::class("N.C").implements("N.IA"))
        .build();
    let snapshot = graph.clone();

    let (_shaped, _sink) = shape(graph.clone());
    assert_eq!(graph, snapshot, "shape passes never mutate their input");
}

#[test]
fn test_internal_area_types_emit_internal() {
    let graph = GraphBuilder::new()
        .internal_namespace("Impl")
        .ty(TypeBuilder::class("Impl.Helper"))
        .build();

    let (shaped, _sink) = shape(graph);
    assert_eq!(
        shaped.namespaces[0].types[0].emit_scope,
        EmitScope::Internal
    );
}
