//! Phase sequencing.
//!
//! One build is a strict sequence: index construction, the shape pass
//! chain, name reservation and audit, import and emit-order planning,
//! overload unification, constraint auditing, and the phase gate. Every
//! phase consumes the previous snapshot and produces a new one; the sink
//! is the only accumulator. An error-bearing sink withholds the plan.

use tracing::{debug, info_span};
use tsgen_common::{DiagnosticsSink, InternalError, PipelineOptions};
use tsgen_graph::{GraphIndices, SymbolGraph};
use tsgen_plan::{
    ConstraintFinding, EmissionPlan, GateInput, audit_constraints, plan_emit_order, plan_imports,
    run_gate, unify_overloads,
};
use tsgen_shape::{apply_names, audit_names, run_shape_passes};

/// Result of one build: the plan (withheld when any error was recorded),
/// the constraint findings, and the full diagnostic log in pipeline
/// order.
#[derive(Debug)]
pub struct BuildOutcome {
    pub plan: Option<EmissionPlan>,
    pub findings: Vec<ConstraintFinding>,
    pub sink: DiagnosticsSink,
}

impl BuildOutcome {
    pub fn succeeded(&self) -> bool {
        self.plan.is_some()
    }
}

pub fn run_pipeline(
    graph: SymbolGraph,
    options: &PipelineOptions,
) -> Result<BuildOutcome, InternalError> {
    let mut sink = DiagnosticsSink::new();

    // Phase 2: indices with input diagnostics.
    {
        let span = info_span!("phase", name = "indices");
        let _enter = span.enter();
        let _ = GraphIndices::build(&graph, &mut sink);
    }

    // Phase 3: shape passes.
    let shaped = {
        let span = info_span!("phase", name = "shape");
        let _enter = span.enter();
        run_shape_passes(graph, options, &mut sink)?
    };

    // Phase 3.5: name reservation, application, completeness audit.
    let named = {
        let span = info_span!("phase", name = "reserve");
        let _enter = span.enter();
        let (named, _reserver) = apply_names(&shaped);
        audit_names(&named)?;
        named
    };

    // Phase 4: planning.
    let span = info_span!("phase", name = "plan");
    let enter = span.enter();
    let indices = GraphIndices::rebuild(&named);
    let imports = plan_imports(&named, &indices);
    let emit_order = plan_emit_order(&named, &imports, options, &mut sink);
    drop(enter);

    // Phase 4.5: overload unification.
    let unified = {
        let span = info_span!("phase", name = "unify");
        let _enter = span.enter();
        unify_overloads(&named, &indices, options, &mut sink)
    };
    let indices = GraphIndices::rebuild(&unified);

    // Phase 4.6: constraint audit.
    let findings = {
        let span = info_span!("phase", name = "audit");
        let _enter = span.enter();
        audit_constraints(&unified, &indices, &mut sink)
    };

    // Phase 4.7: the gate.
    {
        let span = info_span!("phase", name = "gate");
        let _enter = span.enter();
        let input = GateInput {
            graph: &unified,
            indices: &indices,
            imports: &imports,
            emit_order: &emit_order,
            findings: &findings,
        };
        run_gate(&input, &mut sink);
    }

    let plan = if sink.has_errors() {
        debug!(errors = sink.error_count(), "emission gated off");
        None
    } else {
        Some(EmissionPlan {
            graph: unified,
            imports,
            emit_order,
        })
    };

    Ok(BuildOutcome {
        plan,
        findings,
        sink,
    })
}
