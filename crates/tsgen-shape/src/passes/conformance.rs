//! Interface conformance on class surfaces.
//!
//! TypeScript checks classes against interfaces structurally: member name
//! plus assignable signature. Where a class does not satisfy a contract
//! on its own surface, the required members are synthesized as a
//! per-interface projection; explicit implementations from the source
//! metadata are routed the same way.

use tracing::debug;
use tsgen_graph::{
    GraphIndices, Member, MemberKind, PassFlags, Signature, SymbolGraph, Type, TypeKind, ViewTag,
};

use super::{ShapeContext, ShapePass};

fn is_class_like(ty: &Type) -> bool {
    matches!(ty.kind, TypeKind::Class | TypeKind::Struct)
}

/// Nominal signature satisfaction: same parameter count, parameters
/// accept at least the required types, return assignable to the required
/// return.
fn signature_satisfies(
    indices: &GraphIndices,
    graph: &SymbolGraph,
    offered: &Signature,
    required: &Signature,
) -> bool {
    if offered.params.len() != required.params.len() {
        return false;
    }
    for (have, want) in offered.params.iter().zip(required.params.iter()) {
        if have.rest != want.rest {
            return false;
        }
        if !indices.is_assignable(graph, &want.ty, &have.ty) {
            return false;
        }
    }
    indices.is_assignable(graph, &offered.ret, &required.ret)
}

fn member_satisfies(
    indices: &GraphIndices,
    graph: &SymbolGraph,
    offered: &Member,
    required: &Member,
) -> bool {
    offered.name == required.name
        && !offered.is_static
        && offered
            .signatures()
            .any(|sig| signature_satisfies(indices, graph, sig, &required.signature))
}

/// For each class implementing an interface, determine whether the class
/// surface structurally satisfies the contract; if not, synthesize a
/// ViewOnly projection exposing the interface's members in their required
/// shapes.
pub struct StructuralConformance;

impl ShapePass for StructuralConformance {
    fn name(&self) -> &'static str {
        "StructuralConformance"
    }

    fn flag(&self) -> PassFlags {
        PassFlags::STRUCTURAL_CONFORMANCE
    }

    fn requires(&self) -> PassFlags {
        PassFlags::INTERFACE_INLINER | PassFlags::INTERNAL_INTERFACE_FILTER
    }

    fn run(&self, ctx: &mut ShapeContext<'_>, graph: &SymbolGraph) -> SymbolGraph {
        let mut out = graph.clone();
        let mut synthesized_total = 0usize;

        for (ns_pos, namespace) in graph.namespaces.iter().enumerate() {
            for (ty_pos, ty) in namespace.types.iter().enumerate() {
                if !is_class_like(ty) {
                    continue;
                }
                let mut synthesized: Vec<Member> = Vec::new();

                for iface_ref in &ty.interfaces {
                    let Some(iface) = ctx.indices.lookup(graph, &iface_ref.id) else {
                        continue;
                    };
                    if iface.kind != TypeKind::Interface {
                        continue;
                    }
                    // Post-inline, the interface's member list is its full
                    // contract.
                    for required in &iface.members {
                        if required.kind == MemberKind::Constructor || required.is_static {
                            continue;
                        }
                        let satisfied = ty
                            .members
                            .iter()
                            .any(|m| member_satisfies(&ctx.indices, graph, m, required));
                        if satisfied {
                            continue;
                        }
                        let already_projected = ty.members.iter().chain(synthesized.iter()).any(|m| {
                            m.view_tag == ViewTag::ViewOnly(iface.canonical_id.clone())
                                && m.erased_key() == required.erased_key()
                        });
                        if already_projected {
                            continue;
                        }
                        let mut projection = required.clone();
                        projection.view_tag = ViewTag::ViewOnly(iface.canonical_id.clone());
                        projection.declaring_interface = Some(iface.canonical_id.clone());
                        synthesized.push(projection);
                    }
                }

                synthesized_total += synthesized.len();
                out.namespaces[ns_pos].types[ty_pos]
                    .members
                    .extend(synthesized);
            }
        }

        debug!(synthesized = synthesized_total, "conformance projections synthesized");
        out
    }
}

/// Route every explicit interface implementation through the interface's
/// view: the member leaves the class surface and is tagged for its
/// target interface.
pub struct ExplicitImplSynthesizer;

impl ShapePass for ExplicitImplSynthesizer {
    fn name(&self) -> &'static str {
        "ExplicitImplSynthesizer"
    }

    fn flag(&self) -> PassFlags {
        PassFlags::EXPLICIT_IMPL_SYNTHESIZER
    }

    fn run(&self, _ctx: &mut ShapeContext<'_>, graph: &SymbolGraph) -> SymbolGraph {
        let mut out = graph.clone();
        for namespace in &mut out.namespaces {
            for ty in &mut namespace.types {
                if !is_class_like(ty) {
                    continue;
                }
                for member in &mut ty.members {
                    let Some(iface) = member.explicit_impl.clone() else {
                        continue;
                    };
                    if member.view_tag == ViewTag::None {
                        member.view_tag = ViewTag::ViewOnly(iface.clone());
                    }
                    member.declaring_interface = Some(iface);
                }
            }
        }
        out
    }
}

/// Attach the declaring-interface back-reference to class members that
/// originate in an interface contract. Where several interfaces declare a
/// matching member, the most-derived one wins; incomparable candidates
/// tie-break lexicographically.
pub struct InterfaceResolver;

impl ShapePass for InterfaceResolver {
    fn name(&self) -> &'static str {
        "InterfaceResolver"
    }

    fn flag(&self) -> PassFlags {
        PassFlags::INTERFACE_RESOLVER
    }

    fn requires(&self) -> PassFlags {
        PassFlags::INTERFACE_INLINER
    }

    fn run(&self, ctx: &mut ShapeContext<'_>, graph: &SymbolGraph) -> SymbolGraph {
        let mut out = graph.clone();

        for (ns_pos, namespace) in graph.namespaces.iter().enumerate() {
            for (ty_pos, ty) in namespace.types.iter().enumerate() {
                if !is_class_like(ty) {
                    continue;
                }
                for (m_pos, member) in ty.members.iter().enumerate() {
                    if member.declaring_interface.is_some()
                        || member.view_tag != ViewTag::None
                        || member.is_static
                        || member.kind == MemberKind::Constructor
                    {
                        continue;
                    }
                    let declarers = declaring_interfaces(&ctx.indices, ty, member);
                    if let Some(winner) = most_derived(&ctx.indices, &declarers) {
                        out.namespaces[ns_pos].types[ty_pos].members[m_pos]
                            .declaring_interface = Some(winner);
                    }
                }
            }
        }
        out
    }
}

/// Every interface in the type's implements-closure that directly
/// declares a member matching the given one.
pub(crate) fn declaring_interfaces(
    indices: &GraphIndices,
    ty: &Type,
    member: &Member,
) -> Vec<String> {
    let key = member.erased_key();
    let mut result: Vec<String> = Vec::new();
    let mut consider = |id: &str| {
        if result.iter().any(|seen| seen == id) {
            return;
        }
        if let Some(declared) = indices.interface_decls.get(id)
            && declared.iter().any(|d| d.erased_key() == key)
        {
            result.push(id.to_string());
        }
    };
    for iface_ref in &ty.interfaces {
        consider(&iface_ref.id);
        if let Some(closure) = indices.interface_closure.get(&iface_ref.id) {
            for inherited in closure {
                consider(inherited);
            }
        }
    }
    result
}

/// The most-derived id in a set of interfaces; incomparable maxima
/// tie-break lexicographically.
pub(crate) fn most_derived(indices: &GraphIndices, candidates: &[String]) -> Option<String> {
    let mut maximal: Vec<&String> = Vec::new();
    for candidate in candidates {
        if candidates
            .iter()
            .any(|other| other != candidate && indices.interface_derives(other, candidate))
        {
            continue;
        }
        maximal.push(candidate);
    }
    maximal.sort();
    maximal.first().map(|s| (*s).clone())
}

#[cfg(test)]
mod tests {
    use tsgen_common::{DiagnosticsSink, PipelineOptions};
    use tsgen_graph::{GraphBuilder, GraphIndices, MemberBuilder, TypeBuilder};

    use super::*;

    fn context<'a>(
        graph: &SymbolGraph,
        options: &'a PipelineOptions,
        sink: &'a mut DiagnosticsSink,
    ) -> ShapeContext<'a> {
        ShapeContext {
            indices: GraphIndices::rebuild(graph),
            options,
            sink,
        }
    }

    #[test]
    fn test_satisfied_contract_synthesizes_nothing() {
        let graph = GraphBuilder::new()
            .namespace("N")
            .ty(TypeBuilder::interface("N.IRun").member(MemberBuilder::method("Run", "System.Void")))
            .ty(TypeBuilder::class("N.Runner")
                .implements("N.IRun")
                .member(MemberBuilder::method("Run", "System.Void")))
            .build();

        let options = PipelineOptions::default();
        let mut sink = DiagnosticsSink::new();
        let mut ctx = context(&graph, &options, &mut sink);
        let out = StructuralConformance.run(&mut ctx, &graph);
        assert_eq!(out.namespaces[0].types[1].members.len(), 1);
    }

    #[test]
    fn test_unsatisfied_contract_synthesizes_view_only_projection() {
        let graph = GraphBuilder::new()
            .namespace("N")
            .ty(TypeBuilder::interface("N.IRun").member(MemberBuilder::method("Run", "System.Void")))
            .ty(TypeBuilder::class("N.Runner").implements("N.IRun"))
            .build();

        let options = PipelineOptions::default();
        let mut sink = DiagnosticsSink::new();
        let mut ctx = context(&graph, &options, &mut sink);
        let out = StructuralConformance.run(&mut ctx, &graph);

        let runner = &out.namespaces[0].types[1];
        assert_eq!(runner.members.len(), 1);
        let projection = &runner.members[0];
        assert_eq!(projection.name, "Run");
        assert_eq!(projection.view_tag, ViewTag::ViewOnly("N.IRun".to_string()));
        assert_eq!(projection.declaring_interface.as_deref(), Some("N.IRun"));
    }

    #[test]
    fn test_covariant_return_satisfies() {
        let graph = GraphBuilder::new()
            .namespace("N")
            .ty(TypeBuilder::class("N.Animal"))
            .ty(TypeBuilder::class("N.Cat").base("N.Animal"))
            .ty(TypeBuilder::interface("N.IShelter").member(MemberBuilder::method("Rescue", "N.Animal")))
            .ty(TypeBuilder::class("N.CatShelter")
                .implements("N.IShelter")
                .member(MemberBuilder::method("Rescue", "N.Cat")))
            .build();

        let options = PipelineOptions::default();
        let mut sink = DiagnosticsSink::new();
        let mut ctx = context(&graph, &options, &mut sink);
        let out = StructuralConformance.run(&mut ctx, &graph);
        // Rescue(): Cat is assignable to the required Rescue(): Animal.
        assert_eq!(out.namespaces[0].types[3].members.len(), 1);
    }

    #[test]
    fn test_explicit_impl_routes_to_view() {
        let graph = GraphBuilder::new()
            .namespace("N")
            .ty(TypeBuilder::interface("N.IDisposable").member(MemberBuilder::method("Dispose", "System.Void")))
            .ty(TypeBuilder::class("N.Resource")
                .implements("N.IDisposable")
                .member(MemberBuilder::method("Dispose", "System.Void").explicit_impl("N.IDisposable")))
            .build();

        let options = PipelineOptions::default();
        let mut sink = DiagnosticsSink::new();
        let mut ctx = context(&graph, &options, &mut sink);
        let out = ExplicitImplSynthesizer.run(&mut ctx, &graph);

        let member = &out.namespaces[0].types[1].members[0];
        assert_eq!(member.view_tag, ViewTag::ViewOnly("N.IDisposable".to_string()));
        assert_eq!(member.declaring_interface.as_deref(), Some("N.IDisposable"));
    }

    #[test]
    fn test_resolver_prefers_most_derived_interface() {
        let graph = GraphBuilder::new()
            .namespace("N")
            .ty(TypeBuilder::interface("N.IBase").member(MemberBuilder::method("M", "System.Void")))
            .ty(TypeBuilder::interface("N.IDerived")
                .implements("N.IBase")
                .member(MemberBuilder::method("M", "System.Void")))
            .ty(TypeBuilder::class("N.C")
                .implements("N.IDerived")
                .member(MemberBuilder::method("M", "System.Void")))
            .build();

        let options = PipelineOptions::default();
        let mut sink = DiagnosticsSink::new();
        let mut ctx = context(&graph, &options, &mut sink);
        let out = InterfaceResolver.run(&mut ctx, &graph);

        let member = &out.namespaces[0].types[2].members[0];
        assert_eq!(member.declaring_interface.as_deref(), Some("N.IDerived"));
    }
}
