//! Constraint auditing.
//!
//! Read-only pass over (type, interface) pairs: where an interface
//! demands a default-constructible type argument that the implementing
//! type cannot guarantee, the declaration is unsound at the TypeScript
//! level and the finding is recorded. The graph is never rewritten.

use serde::Serialize;
use tracing::debug;
use tsgen_common::diagnostics::codes;
use tsgen_common::{DiagnosticsSink, Severity};
use tsgen_graph::{
    Constraint, GraphIndices, MemberKind, SymbolGraph, Type, TypeKind, TypeRef, Visibility,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    /// The type argument provably lacks a public parameterless
    /// constructor.
    DefaultCtorUnsatisfied,
    /// The type argument is outside the input closure; satisfaction is
    /// unknown and precision is lost.
    DefaultCtorUnknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConstraintFinding {
    pub type_id: String,
    pub interface_id: String,
    pub kind: ConstraintKind,
    pub severity: Severity,
}

pub fn audit_constraints(
    graph: &SymbolGraph,
    indices: &GraphIndices,
    sink: &mut DiagnosticsSink,
) -> Vec<ConstraintFinding> {
    let mut findings = Vec::new();

    for (namespace, ty) in graph.types() {
        if !matches!(ty.kind, TypeKind::Class | TypeKind::Struct) {
            continue;
        }
        for iface_ref in &ty.interfaces {
            let Some(iface) = indices.lookup(graph, &iface_ref.id) else {
                continue;
            };
            for (param, argument) in iface.generics.iter().zip(iface_ref.args.iter()) {
                if !param
                    .constraints
                    .iter()
                    .any(|c| matches!(c, Constraint::DefaultCtor))
                {
                    continue;
                }
                let Some(kind) = check_default_ctor(graph, indices, ty, argument) else {
                    continue;
                };
                let severity = match kind {
                    ConstraintKind::DefaultCtorUnsatisfied => Severity::Error,
                    ConstraintKind::DefaultCtorUnknown => Severity::Warning,
                };
                let (code, detail) = match kind {
                    ConstraintKind::DefaultCtorUnsatisfied => (
                        codes::AUDIT_CTOR_UNSATISFIED,
                        "is not default-constructible",
                    ),
                    ConstraintKind::DefaultCtorUnknown => (
                        codes::AUDIT_CTOR_IMPRECISE,
                        "cannot be proven default-constructible",
                    ),
                };
                sink.record(
                    tsgen_common::Diagnostic::new(
                        severity,
                        code,
                        format!(
                            "argument '{}' for '{}' of '{}' {}",
                            argument.id, param.name, iface.canonical_id, detail
                        ),
                    )
                    .with_namespace(namespace.id.clone())
                    .with_type(ty.canonical_id.clone()),
                );
                findings.push(ConstraintFinding {
                    type_id: ty.canonical_id.clone(),
                    interface_id: iface.canonical_id.clone(),
                    kind,
                    severity,
                });
            }
        }
    }

    debug!(findings = findings.len(), "constraint audit complete");
    findings
}

/// None when the constraint is satisfied; otherwise the kind of failure.
fn check_default_ctor(
    graph: &SymbolGraph,
    indices: &GraphIndices,
    implementor: &Type,
    argument: &TypeRef,
) -> Option<ConstraintKind> {
    // The argument may be one of the implementor's own generic
    // parameters; then its constraints must carry `new()` forward.
    if let Some(own) = implementor.generics.iter().find(|p| p.name == argument.id) {
        if own
            .constraints
            .iter()
            .any(|c| matches!(c, Constraint::DefaultCtor))
        {
            return None;
        }
        return Some(ConstraintKind::DefaultCtorUnsatisfied);
    }

    let Some(target) = indices.lookup(graph, &argument.id) else {
        return Some(ConstraintKind::DefaultCtorUnknown);
    };
    // Value types are always default-constructible.
    if target.kind == TypeKind::Struct || target.kind == TypeKind::Enum {
        return None;
    }
    let has_default_ctor = target.members.iter().any(|m| {
        m.kind == MemberKind::Constructor
            && m.visibility == Visibility::Public
            && m.signature.params.is_empty()
    });
    if has_default_ctor {
        None
    } else {
        Some(ConstraintKind::DefaultCtorUnsatisfied)
    }
}

#[cfg(test)]
mod tests {
    use tsgen_graph::{GraphBuilder, MemberBuilder, TypeBuilder};

    use super::*;

    fn with_ctor_constraint() -> tsgen_graph::TypeBuilder {
        TypeBuilder::interface("N.IFactory`1").generic("T", vec![Constraint::DefaultCtor])
    }

    #[test]
    fn test_satisfied_constraint_yields_no_finding() {
        let graph = GraphBuilder::new()
            .namespace("N")
            .ty(with_ctor_constraint())
            .ty(TypeBuilder::class("N.Widget").member(MemberBuilder::constructor()))
            .ty(TypeBuilder::class("N.Maker").implements_ref(TypeRef::generic(
                "N.IFactory`1",
                vec![TypeRef::named("N.Widget")],
            )))
            .build();

        let indices = GraphIndices::rebuild(&graph);
        let mut sink = DiagnosticsSink::new();
        let findings = audit_constraints(&graph, &indices, &mut sink);
        assert!(findings.is_empty());
        assert!(sink.is_empty());
    }

    #[test]
    fn test_missing_default_ctor_is_error_finding() {
        let graph = GraphBuilder::new()
            .namespace("N")
            .ty(with_ctor_constraint())
            .ty(TypeBuilder::class("N.Widget").member(
                MemberBuilder::constructor().param("size", "System.Int32"),
            ))
            .ty(TypeBuilder::class("N.Maker").implements_ref(TypeRef::generic(
                "N.IFactory`1",
                vec![TypeRef::named("N.Widget")],
            )))
            .build();

        let indices = GraphIndices::rebuild(&graph);
        let mut sink = DiagnosticsSink::new();
        let findings = audit_constraints(&graph, &indices, &mut sink);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, ConstraintKind::DefaultCtorUnsatisfied);
        assert_eq!(findings[0].severity, Severity::Error);
        assert!(sink.has_errors());
    }

    #[test]
    fn test_struct_argument_always_satisfies() {
        let graph = GraphBuilder::new()
            .namespace("N")
            .ty(with_ctor_constraint())
            .ty(TypeBuilder::strukt("N.Point"))
            .ty(TypeBuilder::class("N.Maker").implements_ref(TypeRef::generic(
                "N.IFactory`1",
                vec![TypeRef::named("N.Point")],
            )))
            .build();

        let indices = GraphIndices::rebuild(&graph);
        let mut sink = DiagnosticsSink::new();
        let findings = audit_constraints(&graph, &indices, &mut sink);
        assert!(findings.is_empty());
    }

    #[test]
    fn test_external_argument_is_precision_warning() {
        let graph = GraphBuilder::new()
            .namespace("N")
            .ty(with_ctor_constraint())
            .ty(TypeBuilder::class("N.Maker").implements_ref(TypeRef::generic(
                "N.IFactory`1",
                vec![TypeRef::external("Elsewhere.Thing")],
            )))
            .build();

        let indices = GraphIndices::rebuild(&graph);
        let mut sink = DiagnosticsSink::new();
        let findings = audit_constraints(&graph, &indices, &mut sink);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, ConstraintKind::DefaultCtorUnknown);
        assert!(!sink.has_errors());
    }

    #[test]
    fn test_forwarded_generic_parameter_requires_own_constraint() {
        let graph = GraphBuilder::new()
            .namespace("N")
            .ty(with_ctor_constraint())
            .ty(TypeBuilder::class("N.Maker`1")
                .generic("U", vec![])
                .implements_ref(TypeRef::generic("N.IFactory`1", vec![TypeRef::named("U")])))
            .build();

        let indices = GraphIndices::rebuild(&graph);
        let mut sink = DiagnosticsSink::new();
        let findings = audit_constraints(&graph, &indices, &mut sink);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, ConstraintKind::DefaultCtorUnsatisfied);
    }
}
