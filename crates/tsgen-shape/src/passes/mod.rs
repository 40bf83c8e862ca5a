//! The shape pass chain.
//!
//! Every pass shares one signature: `(context, graph) -> graph`. A pass
//! never mutates its input; it clones the spine it touches and returns a
//! fresh graph. Sequencing is mechanical: each pass declares the flags of
//! the passes it depends on, the sequencer verifies them against the
//! graph's `passes_run` set and stamps the pass's own flag on the result.
//! Indices are rebuilt (silently) after every pass.

use tracing::debug_span;
use tsgen_common::diagnostics::codes;
use tsgen_common::{DiagnosticsSink, InternalError, PipelineOptions};
use tsgen_graph::{GraphIndices, PassFlags, SymbolGraph};

mod inline;
pub use inline::{InterfaceInliner, InternalInterfaceFilter};

mod conformance;
pub use conformance::{ExplicitImplSynthesizer, InterfaceResolver, StructuralConformance};

mod diamond;
pub use diamond::DiamondResolver;

mod overloads;
pub use overloads::{BaseOverloadAdder, OverloadReturnConflictResolver, reconcile_member_returns};

mod dedup;
pub use dedup::{ClassSurfaceDeduplicator, MemberDeduplicator};

mod views;
pub use views::ViewPlanner;

mod hidden;
pub use hidden::HiddenMemberPlanner;

mod indexers;
pub use indexers::{FinalIndexersPass, IndexerPlanner};

mod statics;
pub use statics::StaticSideAnalyzer;

mod constraints;
pub use constraints::ConstraintCloser;

mod scope;
pub use scope::EmitScopeAssigner;

/// Shared state threaded through the pass chain. The indices always
/// describe the graph a pass is handed; the sink is the build's
/// append-only diagnostic log.
pub struct ShapeContext<'a> {
    pub indices: GraphIndices,
    pub options: &'a PipelineOptions,
    pub sink: &'a mut DiagnosticsSink,
}

pub trait ShapePass {
    fn name(&self) -> &'static str;
    /// Flag stamped onto the graph after this pass runs.
    fn flag(&self) -> PassFlags;
    /// Flags that must already be stamped before this pass may run.
    fn requires(&self) -> PassFlags {
        PassFlags::empty()
    }
    fn run(&self, ctx: &mut ShapeContext<'_>, graph: &SymbolGraph) -> SymbolGraph;
}

/// The full pass chain in its required order.
pub fn default_passes() -> Vec<Box<dyn ShapePass>> {
    vec![
        Box::new(InterfaceInliner),
        Box::new(InternalInterfaceFilter),
        Box::new(StructuralConformance),
        Box::new(ExplicitImplSynthesizer),
        Box::new(InterfaceResolver),
        Box::new(DiamondResolver),
        Box::new(BaseOverloadAdder),
        Box::new(OverloadReturnConflictResolver),
        Box::new(MemberDeduplicator),
        Box::new(ViewPlanner),
        Box::new(ClassSurfaceDeduplicator),
        Box::new(HiddenMemberPlanner),
        Box::new(IndexerPlanner),
        Box::new(FinalIndexersPass),
        Box::new(StaticSideAnalyzer),
        Box::new(ConstraintCloser),
        Box::new(EmitScopeAssigner),
    ]
}

/// Run the whole chain over a graph whose indices were already built by
/// Phase 2.
pub fn run_shape_passes(
    graph: SymbolGraph,
    options: &PipelineOptions,
    sink: &mut DiagnosticsSink,
) -> Result<SymbolGraph, InternalError> {
    let mut ctx = ShapeContext {
        indices: GraphIndices::rebuild(&graph),
        options,
        sink,
    };
    let mut current = graph;

    for pass in default_passes() {
        if !current.passes_run.contains(pass.requires()) {
            return Err(InternalError::new(
                codes::INTERNAL_PHASE_ORDER,
                format!(
                    "pass {} requires {:?} but graph has only {:?}",
                    pass.name(),
                    pass.requires(),
                    current.passes_run
                ),
            ));
        }
        let span = debug_span!("shape_pass", pass = pass.name());
        let _enter = span.enter();
        let mut next = pass.run(&mut ctx, &current);
        next.passes_run = current.passes_run | pass.flag();
        ctx.indices = GraphIndices::rebuild(&next);
        current = next;
    }
    Ok(current)
}
