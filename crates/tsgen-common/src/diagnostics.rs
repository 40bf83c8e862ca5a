//! Diagnostics for the symbol-graph pipeline.
//!
//! User-facing anomalies are recorded as [`Diagnostic`] values in an
//! append-only [`DiagnosticsSink`]. Codes are stable strings grouped by
//! phase prefix (`INDEX-`, `SHAPE-`, `PLAN-`, `AUDIT-`, `GATE-`); the
//! `INTERNAL-` family is reserved for fatal invariant failures and never
//! appears in the sink.

use serde::Serialize;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Stable diagnostic codes, grouped by the phase that reports them.
pub mod codes {
    // Phase 2: index construction
    pub const INDEX_DUPLICATE_TYPE: &str = "INDEX-DUPLICATE-TYPE";
    pub const INDEX_IFACE_CYCLE: &str = "INDEX-IFACE-CYCLE";
    pub const INDEX_UNRESOLVED_REF: &str = "INDEX-UNRESOLVED-REF";

    // Phase 3: shape passes
    pub const SHAPE_DIAMOND_RESOLVED: &str = "SHAPE-DIAMOND-RESOLVED";
    pub const SHAPE_DIAMOND_AMBIGUOUS: &str = "SHAPE-DIAMOND-AMBIGUOUS";
    pub const SHAPE_OVERLOAD_WIDENED: &str = "SHAPE-OVERLOAD-WIDENED";
    pub const SHAPE_OVERLOAD_DEMOTED: &str = "SHAPE-OVERLOAD-DEMOTED";
    pub const SHAPE_CONSTRAINT_CONFLICT: &str = "SHAPE-CONSTRAINT-CONFLICT";

    // Phase 4: planning
    pub const PLAN_NS_CYCLE: &str = "PLAN-NS-CYCLE";

    // Phase 4.6: constraint audit
    pub const AUDIT_CTOR_UNSATISFIED: &str = "AUDIT-CTOR-UNSATISFIED";
    pub const AUDIT_CTOR_IMPRECISE: &str = "AUDIT-CTOR-IMPRECISE";

    // Phase 4.7: phase gate
    pub const GATE_NAME_MISSING: &str = "GATE-NAME-MISSING";
    pub const GATE_NAME_COLLIDE: &str = "GATE-NAME-COLLIDE";
    pub const GATE_DANGLING_REF: &str = "GATE-DANGLING-REF";
    pub const GATE_INDEXER_LEAK: &str = "GATE-INDEXER-LEAK";
    pub const GATE_VIEW_ORPHAN: &str = "GATE-VIEW-ORPHAN";
    pub const GATE_IMPORT_MISSING: &str = "GATE-IMPORT-MISSING";
    pub const GATE_IMPORT_ALIAS_COLLIDE: &str = "GATE-IMPORT-ALIAS-COLLIDE";
    pub const GATE_ORDER_INCOMPLETE: &str = "GATE-ORDER-INCOMPLETE";
    pub const GATE_CONSTRAINT_UNRESOLVED: &str = "GATE-CONSTRAINT-UNRESOLVED";
    pub const GATE_IFACE_CYCLE: &str = "GATE-IFACE-CYCLE";
    pub const GATE_SCOPE_UNSET: &str = "GATE-SCOPE-UNSET";

    // Internal invariant failures (fatal, never recorded in the sink)
    pub const INTERNAL_PHASE_ORDER: &str = "INTERNAL-PHASE-ORDER";
    pub const INTERNAL_RESERVE_INCOMPLETE: &str = "INTERNAL-RESERVE-INCOMPLETE";
}

/// A single pipeline diagnostic.
///
/// Location fields are optional and progressively more specific: a
/// namespace-level diagnostic sets only `namespace`, a member-level one
/// sets all three.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member: Option<String>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(severity: Severity, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            severity,
            code,
            namespace: None,
            type_id: None,
            member: None,
            message: message.into(),
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_type(mut self, type_id: impl Into<String>) -> Self {
        self.type_id = Some(type_id.into());
        self
    }

    pub fn with_member(mut self, member: impl Into<String>) -> Self {
        self.member = Some(member.into());
        self
    }
}

/// Append-only accumulator for diagnostics.
///
/// Recording order is pipeline order and is observable: consumers (and
/// the determinism tests) rely on the sequence being reproducible.
#[derive(Debug, Default, Clone, Serialize)]
pub struct DiagnosticsSink {
    diagnostics: Vec<Diagnostic>,
    error_count: usize,
}

impl DiagnosticsSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, diagnostic: Diagnostic) {
        if diagnostic.severity == Severity::Error {
            self.error_count += 1;
            tracing::warn!(code = diagnostic.code, "pipeline error: {}", diagnostic.message);
        }
        self.diagnostics.push(diagnostic);
    }

    pub fn error(&mut self, code: &'static str, message: impl Into<String>) {
        self.record(Diagnostic::new(Severity::Error, code, message));
    }

    pub fn warning(&mut self, code: &'static str, message: impl Into<String>) {
        self.record(Diagnostic::new(Severity::Warning, code, message));
    }

    pub fn info(&mut self, code: &'static str, message: impl Into<String>) {
        self.record(Diagnostic::new(Severity::Info, code, message));
    }

    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}
