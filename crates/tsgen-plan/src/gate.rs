//! The phase gate.
//!
//! Final cross-cutting validation before anything reaches the emitter.
//! Checks run from a fixed table, grouped into families: name
//! completeness, per-scope uniqueness, reference resolution, indexer
//! elision, view integrity, import coverage, emit-order totality,
//! constraint resolution, interface-cycle freedom, and scope
//! determinacy. Every failed check records a `GATE-*` diagnostic; any
//! error gates emission off.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;
use tsgen_common::diagnostics::codes;
use tsgen_common::{Diagnostic, DiagnosticsSink, Severity};
use tsgen_graph::{
    Constraint, EmitScope, GraphIndices, Member, MemberKind, SymbolGraph, Type, TypeRef, ViewTag,
};

use crate::audit::ConstraintFinding;
use crate::plan::ImportPlan;

/// Everything the gate inspects. The gate never mutates any of it.
pub struct GateInput<'a> {
    pub graph: &'a SymbolGraph,
    pub indices: &'a GraphIndices,
    pub imports: &'a ImportPlan,
    pub emit_order: &'a [String],
    pub findings: &'a [ConstraintFinding],
}

struct GateCheck {
    name: &'static str,
    run: fn(&GateInput<'_>, &mut DiagnosticsSink),
}

const CHECKS: &[GateCheck] = &[
    // (a) every non-omitted symbol has an emission name
    GateCheck { name: "type-names-complete", run: check_type_names },
    GateCheck { name: "surface-member-names-complete", run: check_surface_member_names },
    GateCheck { name: "view-member-names-complete", run: check_view_member_names },
    GateCheck { name: "hidden-member-names-complete", run: check_hidden_member_names },
    // (b) no duplicate emission name within any scope
    GateCheck { name: "namespace-scope-unique", run: check_namespace_scope_unique },
    GateCheck { name: "instance-surface-unique", run: check_instance_surface_unique },
    GateCheck { name: "static-surface-unique", run: check_static_surface_unique },
    GateCheck { name: "view-scope-unique", run: check_view_scope_unique },
    // (c) every type reference resolves or is flagged external
    GateCheck { name: "base-refs-resolve", run: check_base_refs },
    GateCheck { name: "interface-refs-resolve", run: check_interface_refs },
    GateCheck { name: "param-refs-resolve", run: check_param_refs },
    GateCheck { name: "return-refs-resolve", run: check_return_refs },
    GateCheck { name: "constraint-refs-resolve", run: check_constraint_refs },
    // (d) no indexer remains on a surface
    GateCheck { name: "no-surface-indexers", run: check_surface_indexers },
    GateCheck { name: "no-view-indexers", run: check_view_indexers },
    // (e) ViewOnly members map to materialized views
    GateCheck { name: "no-stranded-view-only", run: check_no_stranded_view_only },
    GateCheck { name: "views-non-empty", run: check_views_non_empty },
    GateCheck { name: "view-interfaces-resolve", run: check_view_interfaces_resolve },
    // (f) import plan covers every cross-namespace reference
    GateCheck { name: "import-coverage", run: check_import_coverage },
    GateCheck { name: "import-alias-unique", run: check_import_alias_unique },
    GateCheck { name: "no-self-import", run: check_no_self_import },
    // (g) emit order is total
    GateCheck { name: "order-covers-namespaces", run: check_order_total },
    GateCheck { name: "order-has-no-duplicates", run: check_order_no_duplicates },
    GateCheck { name: "order-respects-dag", run: check_order_respects_dag },
    // (h) constraint findings contain no unresolved errors
    GateCheck { name: "constraint-findings-resolved", run: check_findings_resolved },
    // (i) no interface-inheritance cycle
    GateCheck { name: "no-interface-cycles", run: check_interface_cycles },
    // (j) no unset emit scope
    GateCheck { name: "type-scopes-set", run: check_type_scopes_set },
];

/// Run the full check table. The caller decides gating from the sink's
/// error state afterwards.
pub fn run_gate(input: &GateInput<'_>, sink: &mut DiagnosticsSink) {
    let before = sink.error_count();
    for check in CHECKS {
        let errors_before = sink.error_count();
        (check.run)(input, sink);
        if sink.error_count() > errors_before {
            debug!(check = check.name, "gate check failed");
        }
    }
    debug!(
        checks = CHECKS.len(),
        new_errors = sink.error_count() - before,
        "phase gate complete"
    );
}

fn emittable_types<'a>(
    input: &'a GateInput<'_>,
) -> impl Iterator<Item = (&'a tsgen_graph::Namespace, &'a Type)> {
    input
        .graph
        .types()
        .filter(|(_, ty)| ty.emit_scope != EmitScope::Omitted)
}

fn surface_members(ty: &Type) -> impl Iterator<Item = &Member> {
    ty.members.iter().filter(|m| !m.is_omitted())
}

// ---- family (a): name completeness ----

fn check_type_names(input: &GateInput<'_>, sink: &mut DiagnosticsSink) {
    for (namespace, ty) in emittable_types(input) {
        if ty.ts_name.is_none() {
            sink.record(
                Diagnostic::new(
                    Severity::Error,
                    codes::GATE_NAME_MISSING,
                    format!("type '{}' has no emission name", ty.canonical_id),
                )
                .with_namespace(namespace.id.clone())
                .with_type(ty.canonical_id.clone()),
            );
        }
    }
}

fn check_surface_member_names(input: &GateInput<'_>, sink: &mut DiagnosticsSink) {
    for (namespace, ty) in emittable_types(input) {
        for member in surface_members(ty) {
            if member.view_tag == ViewTag::None && member.ts_name.is_none() {
                sink.record(
                    Diagnostic::new(
                        Severity::Error,
                        codes::GATE_NAME_MISSING,
                        format!("member '{}.{}' has no emission name", ty.canonical_id, member.name),
                    )
                    .with_namespace(namespace.id.clone())
                    .with_type(ty.canonical_id.clone())
                    .with_member(member.name.clone()),
                );
            }
        }
    }
}

fn check_view_member_names(input: &GateInput<'_>, sink: &mut DiagnosticsSink) {
    for (namespace, ty) in emittable_types(input) {
        for view in &ty.views {
            for member in view.members.iter().filter(|m| !m.is_omitted()) {
                if member.ts_name.is_none() {
                    sink.record(
                        Diagnostic::new(
                            Severity::Error,
                            codes::GATE_NAME_MISSING,
                            format!(
                                "view member '{}/{}::{}' has no emission name",
                                ty.canonical_id, view.interface_id, member.name
                            ),
                        )
                        .with_namespace(namespace.id.clone())
                        .with_type(ty.canonical_id.clone())
                        .with_member(member.name.clone()),
                    );
                }
            }
        }
    }
}

fn check_hidden_member_names(input: &GateInput<'_>, sink: &mut DiagnosticsSink) {
    for (namespace, ty) in emittable_types(input) {
        for member in surface_members(ty) {
            if member.view_tag == ViewTag::Hidden && member.ts_name.is_none() {
                sink.record(
                    Diagnostic::new(
                        Severity::Error,
                        codes::GATE_NAME_MISSING,
                        format!(
                            "hidden member '{}.{}' has no emission name",
                            ty.canonical_id, member.name
                        ),
                    )
                    .with_namespace(namespace.id.clone())
                    .with_type(ty.canonical_id.clone())
                    .with_member(member.name.clone()),
                );
            }
        }
    }
}

// ---- family (b): per-scope uniqueness ----

fn report_collision(
    sink: &mut DiagnosticsSink,
    namespace: &str,
    type_id: Option<&str>,
    name: &str,
    scope: &str,
) {
    let mut diagnostic = Diagnostic::new(
        Severity::Error,
        codes::GATE_NAME_COLLIDE,
        format!("emission name '{name}' assigned twice in {scope}"),
    )
    .with_namespace(namespace);
    if let Some(type_id) = type_id {
        diagnostic = diagnostic.with_type(type_id);
    }
    sink.record(diagnostic);
}

fn check_namespace_scope_unique(input: &GateInput<'_>, sink: &mut DiagnosticsSink) {
    let mut seen: FxHashMap<(String, String), ()> = FxHashMap::default();
    for (namespace, ty) in emittable_types(input) {
        let Some(name) = &ty.ts_name else { continue };
        if seen
            .insert((namespace.id.clone(), name.clone()), ())
            .is_some()
        {
            report_collision(sink, &namespace.id, None, name, "namespace scope");
        }
    }
}

fn check_surface_unique(
    input: &GateInput<'_>,
    sink: &mut DiagnosticsSink,
    want_static: bool,
    scope_label: &str,
) {
    for (namespace, ty) in emittable_types(input) {
        let mut seen: FxHashSet<&str> = FxHashSet::default();
        let mut ctor_seen = false;
        for member in surface_members(ty) {
            if member.is_static != want_static || member.view_tag.is_view_only() {
                continue;
            }
            let Some(name) = member.ts_name.as_deref() else {
                continue;
            };
            // Constructor overloads legitimately share the slot until
            // unification collapses them; one survivor is required.
            if member.kind == MemberKind::Constructor {
                if ctor_seen {
                    report_collision(sink, &namespace.id, Some(&ty.canonical_id), name, scope_label);
                }
                ctor_seen = true;
                continue;
            }
            if !seen.insert(name) {
                report_collision(sink, &namespace.id, Some(&ty.canonical_id), name, scope_label);
            }
        }
    }
}

fn check_instance_surface_unique(input: &GateInput<'_>, sink: &mut DiagnosticsSink) {
    check_surface_unique(input, sink, false, "instance surface");
}

fn check_static_surface_unique(input: &GateInput<'_>, sink: &mut DiagnosticsSink) {
    check_surface_unique(input, sink, true, "static surface");
}

fn check_view_scope_unique(input: &GateInput<'_>, sink: &mut DiagnosticsSink) {
    for (namespace, ty) in emittable_types(input) {
        for view in &ty.views {
            let mut seen: FxHashSet<&str> = FxHashSet::default();
            for member in view.members.iter().filter(|m| !m.is_omitted()) {
                let Some(name) = member.ts_name.as_deref() else {
                    continue;
                };
                if !seen.insert(name) {
                    report_collision(
                        sink,
                        &namespace.id,
                        Some(&ty.canonical_id),
                        name,
                        "view scope",
                    );
                }
            }
        }
    }
}

// ---- family (c): reference resolution ----

fn check_ref(
    input: &GateInput<'_>,
    sink: &mut DiagnosticsSink,
    namespace: &str,
    type_id: &str,
    r: &TypeRef,
    role: &str,
) {
    // Dangling references are flagged, never silently dropped; they are
    // lossy rather than invalid, so they do not gate emission.
    if !r.external && !input.indices.types.contains_key(&r.id) {
        sink.record(
            Diagnostic::new(
                Severity::Warning,
                codes::GATE_DANGLING_REF,
                format!("{role} reference '{}' dangles and is not marked external", r.id),
            )
            .with_namespace(namespace)
            .with_type(type_id),
        );
    }
    for arg in &r.args {
        check_ref(input, sink, namespace, type_id, arg, role);
    }
}

/// Generic parameter names in scope for a member of a type; references
/// to them are not dangling.
fn generic_names<'a>(ty: &'a Type, member: Option<&'a Member>) -> FxHashSet<&'a str> {
    let mut names: FxHashSet<&str> = ty.generics.iter().map(|p| p.name.as_str()).collect();
    if let Some(member) = member {
        names.extend(member.signature.generics.iter().map(|p| p.name.as_str()));
    }
    names
}

fn check_base_refs(input: &GateInput<'_>, sink: &mut DiagnosticsSink) {
    for (namespace, ty) in emittable_types(input) {
        if let Some(base) = &ty.base {
            check_ref(input, sink, &namespace.id, &ty.canonical_id, base, "base");
        }
    }
}

fn check_interface_refs(input: &GateInput<'_>, sink: &mut DiagnosticsSink) {
    for (namespace, ty) in emittable_types(input) {
        for iface in &ty.interfaces {
            check_ref(input, sink, &namespace.id, &ty.canonical_id, iface, "interface");
        }
    }
}

fn check_signature_refs(
    input: &GateInput<'_>,
    sink: &mut DiagnosticsSink,
    namespace: &str,
    ty: &Type,
    member: &Member,
    params: bool,
) {
    let generics = generic_names(ty, Some(member));
    for signature in member.signatures() {
        if params {
            for param in &signature.params {
                if generics.contains(param.ty.id.as_str()) {
                    continue;
                }
                check_ref(input, sink, namespace, &ty.canonical_id, &param.ty, "parameter");
            }
        } else {
            if generics.contains(signature.ret.id.as_str()) {
                continue;
            }
            check_ref(input, sink, namespace, &ty.canonical_id, &signature.ret, "return");
        }
    }
}

fn check_param_refs(input: &GateInput<'_>, sink: &mut DiagnosticsSink) {
    for (namespace, ty) in emittable_types(input) {
        for member in surface_members(ty) {
            check_signature_refs(input, sink, &namespace.id, ty, member, true);
        }
    }
}

fn check_return_refs(input: &GateInput<'_>, sink: &mut DiagnosticsSink) {
    for (namespace, ty) in emittable_types(input) {
        for member in surface_members(ty) {
            check_signature_refs(input, sink, &namespace.id, ty, member, false);
        }
    }
}

fn check_constraint_refs(input: &GateInput<'_>, sink: &mut DiagnosticsSink) {
    for (namespace, ty) in emittable_types(input) {
        for param in &ty.generics {
            for constraint in &param.constraints {
                match constraint {
                    Constraint::Interface(r) | Constraint::BaseClass(r) => {
                        check_ref(input, sink, &namespace.id, &ty.canonical_id, r, "constraint");
                    }
                    Constraint::DefaultCtor => {}
                }
            }
        }
    }
}

// ---- family (d): indexer elision ----

fn check_surface_indexers(input: &GateInput<'_>, sink: &mut DiagnosticsSink) {
    for (namespace, ty) in emittable_types(input) {
        for member in &ty.members {
            if member.kind == MemberKind::Indexer && !member.is_omitted() {
                sink.record(
                    Diagnostic::new(
                        Severity::Error,
                        codes::GATE_INDEXER_LEAK,
                        format!("indexer on '{}' survived elision", ty.canonical_id),
                    )
                    .with_namespace(namespace.id.clone())
                    .with_type(ty.canonical_id.clone()),
                );
            }
        }
    }
}

fn check_view_indexers(input: &GateInput<'_>, sink: &mut DiagnosticsSink) {
    for (namespace, ty) in emittable_types(input) {
        for view in &ty.views {
            for member in &view.members {
                if member.kind == MemberKind::Indexer && !member.is_omitted() {
                    sink.record(
                        Diagnostic::new(
                            Severity::Error,
                            codes::GATE_INDEXER_LEAK,
                            format!(
                                "indexer in view '{}/{}' survived elision",
                                ty.canonical_id, view.interface_id
                            ),
                        )
                        .with_namespace(namespace.id.clone())
                        .with_type(ty.canonical_id.clone()),
                    );
                }
            }
        }
    }
}

// ---- family (e): view integrity ----

fn check_no_stranded_view_only(input: &GateInput<'_>, sink: &mut DiagnosticsSink) {
    for (namespace, ty) in emittable_types(input) {
        for member in &ty.members {
            if member.view_tag.is_view_only() {
                sink.record(
                    Diagnostic::new(
                        Severity::Error,
                        codes::GATE_VIEW_ORPHAN,
                        format!(
                            "member '{}.{}' is tagged for a view but was never planned into one",
                            ty.canonical_id, member.name
                        ),
                    )
                    .with_namespace(namespace.id.clone())
                    .with_type(ty.canonical_id.clone())
                    .with_member(member.name.clone()),
                );
            }
        }
    }
}

fn check_views_non_empty(input: &GateInput<'_>, sink: &mut DiagnosticsSink) {
    for (namespace, ty) in emittable_types(input) {
        for view in &ty.views {
            if view.members.is_empty() {
                sink.record(
                    Diagnostic::new(
                        Severity::Error,
                        codes::GATE_VIEW_ORPHAN,
                        format!("view '{}/{}' is empty", ty.canonical_id, view.interface_id),
                    )
                    .with_namespace(namespace.id.clone())
                    .with_type(ty.canonical_id.clone()),
                );
            }
        }
    }
}

fn check_view_interfaces_resolve(input: &GateInput<'_>, sink: &mut DiagnosticsSink) {
    for (namespace, ty) in emittable_types(input) {
        for view in &ty.views {
            if !input.indices.types.contains_key(&view.interface_id) {
                sink.record(
                    Diagnostic::new(
                        Severity::Warning,
                        codes::GATE_VIEW_ORPHAN,
                        format!(
                            "view '{}/{}' projects an interface outside the graph",
                            ty.canonical_id, view.interface_id
                        ),
                    )
                    .with_namespace(namespace.id.clone())
                    .with_type(ty.canonical_id.clone()),
                );
            }
        }
    }
}

// ---- family (f): import coverage ----

fn check_import_coverage(input: &GateInput<'_>, sink: &mut DiagnosticsSink) {
    // Recompute the reference walk and compare against the plan.
    let expected = crate::imports::plan_imports(input.graph, input.indices);
    for (namespace, specs) in &expected.imports {
        let planned = input.imports.for_namespace(namespace);
        for spec in specs {
            let covered = planned.iter().any(|p| {
                p.source_namespace == spec.source_namespace && p.symbol == spec.symbol
            });
            if !covered {
                sink.record(
                    Diagnostic::new(
                        Severity::Error,
                        codes::GATE_IMPORT_MISSING,
                        format!(
                            "namespace '{}' references '{}::{}' without an import",
                            namespace, spec.source_namespace, spec.symbol
                        ),
                    )
                    .with_namespace(namespace.clone()),
                );
            }
        }
    }
}

fn check_import_alias_unique(input: &GateInput<'_>, sink: &mut DiagnosticsSink) {
    for (namespace, specs) in &input.imports.imports {
        let mut seen: FxHashSet<&str> = FxHashSet::default();
        for spec in specs {
            if !seen.insert(spec.alias.as_str()) {
                sink.record(
                    Diagnostic::new(
                        Severity::Error,
                        codes::GATE_IMPORT_ALIAS_COLLIDE,
                        format!("alias '{}' used twice in namespace '{}'", spec.alias, namespace),
                    )
                    .with_namespace(namespace.clone()),
                );
            }
        }
    }
}

fn check_no_self_import(input: &GateInput<'_>, sink: &mut DiagnosticsSink) {
    for (namespace, specs) in &input.imports.imports {
        for spec in specs {
            if spec.source_namespace == *namespace {
                sink.record(
                    Diagnostic::new(
                        Severity::Error,
                        codes::GATE_IMPORT_MISSING,
                        format!("namespace '{namespace}' imports from itself"),
                    )
                    .with_namespace(namespace.clone()),
                );
            }
        }
    }
}

// ---- family (g): emit-order totality ----

fn check_order_total(input: &GateInput<'_>, sink: &mut DiagnosticsSink) {
    let ordered: FxHashSet<&str> = input.emit_order.iter().map(String::as_str).collect();
    for namespace in &input.graph.namespaces {
        if !ordered.contains(namespace.id.as_str()) {
            sink.record(
                Diagnostic::new(
                    Severity::Error,
                    codes::GATE_ORDER_INCOMPLETE,
                    format!("namespace '{}' is missing from the emit order", namespace.id),
                )
                .with_namespace(namespace.id.clone()),
            );
        }
    }
}

fn check_order_no_duplicates(input: &GateInput<'_>, sink: &mut DiagnosticsSink) {
    let mut seen: FxHashSet<&str> = FxHashSet::default();
    for id in input.emit_order {
        if !seen.insert(id.as_str()) {
            sink.record(
                Diagnostic::new(
                    Severity::Error,
                    codes::GATE_ORDER_INCOMPLETE,
                    format!("namespace '{id}' appears twice in the emit order"),
                )
                .with_namespace(id.clone()),
            );
        }
    }
}

fn check_order_respects_dag(input: &GateInput<'_>, sink: &mut DiagnosticsSink) {
    let position: FxHashMap<&str, usize> = input
        .emit_order
        .iter()
        .enumerate()
        .map(|(i, id)| (id.as_str(), i))
        .collect();

    for (namespace, specs) in &input.imports.imports {
        let Some(&ns_pos) = position.get(namespace.as_str()) else {
            continue;
        };
        for spec in specs {
            let Some(&dep_pos) = position.get(spec.source_namespace.as_str()) else {
                continue;
            };
            if dep_pos > ns_pos && !on_cycle(input, namespace, &spec.source_namespace) {
                sink.record(
                    Diagnostic::new(
                        Severity::Error,
                        codes::GATE_ORDER_INCOMPLETE,
                        format!(
                            "'{}' is emitted before its dependency '{}' without a cycle to excuse it",
                            namespace, spec.source_namespace
                        ),
                    )
                    .with_namespace(namespace.clone()),
                );
            }
        }
    }
}

/// True when `from` is reachable from `to` through import edges, i.e.
/// the pair sits on a cycle that the planner had to break.
fn on_cycle(input: &GateInput<'_>, from: &str, to: &str) -> bool {
    let mut worklist = vec![to];
    let mut visited: FxHashSet<&str> = FxHashSet::default();
    while let Some(current) = worklist.pop() {
        if !visited.insert(current) {
            continue;
        }
        if current == from {
            return true;
        }
        for spec in input.imports.for_namespace(current) {
            worklist.push(spec.source_namespace.as_str());
        }
    }
    false
}

// ---- family (h): constraint findings ----

fn check_findings_resolved(input: &GateInput<'_>, sink: &mut DiagnosticsSink) {
    for finding in input.findings {
        if finding.severity == Severity::Error {
            sink.record(
                Diagnostic::new(
                    Severity::Error,
                    codes::GATE_CONSTRAINT_UNRESOLVED,
                    format!(
                        "constraint finding on '{}' implementing '{}' is unresolved",
                        finding.type_id, finding.interface_id
                    ),
                )
                .with_type(finding.type_id.clone()),
            );
        }
    }
}

// ---- family (i): interface cycles ----

fn check_interface_cycles(input: &GateInput<'_>, sink: &mut DiagnosticsSink) {
    for (namespace, ty) in emittable_types(input) {
        if !ty.is_interface() {
            continue;
        }
        if let Some(closure) = input.indices.interface_closure.get(&ty.canonical_id)
            && closure.contains(&ty.canonical_id)
        {
            sink.record(
                Diagnostic::new(
                    Severity::Error,
                    codes::GATE_IFACE_CYCLE,
                    format!("interface '{}' inherits itself", ty.canonical_id),
                )
                .with_namespace(namespace.id.clone())
                .with_type(ty.canonical_id.clone()),
            );
        }
    }
}

// ---- family (j): scope determinacy ----

fn check_type_scopes_set(input: &GateInput<'_>, sink: &mut DiagnosticsSink) {
    for (namespace, ty) in input.graph.types() {
        if ty.emit_scope == EmitScope::Unset {
            sink.record(
                Diagnostic::new(
                    Severity::Error,
                    codes::GATE_SCOPE_UNSET,
                    format!("type '{}' has no determinate emit scope", ty.canonical_id),
                )
                .with_namespace(namespace.id.clone())
                .with_type(ty.canonical_id.clone()),
            );
        }
    }
}
