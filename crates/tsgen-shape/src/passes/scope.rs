//! Emit-scope assignment.

use tracing::debug;
use tsgen_graph::{Area, EmitScope, PassFlags, SymbolGraph, TypeKind, Visibility};

use super::{ShapeContext, ShapePass};

/// Give every type a determinate emit scope from its namespace area and
/// declared visibility. This is the final shape pass: afterwards no type
/// carries `EmitScope::Unset`.
pub struct EmitScopeAssigner;

impl ShapePass for EmitScopeAssigner {
    fn name(&self) -> &'static str {
        "EmitScopeAssigner"
    }

    fn flag(&self) -> PassFlags {
        PassFlags::EMIT_SCOPE_ASSIGNER
    }

    fn requires(&self) -> PassFlags {
        PassFlags::INTERNAL_INTERFACE_FILTER | PassFlags::INDEXER_PLANNER
    }

    fn run(&self, ctx: &mut ShapeContext<'_>, graph: &SymbolGraph) -> SymbolGraph {
        let mut out = graph.clone();
        for namespace in &mut out.namespaces {
            for ty in &mut namespace.types {
                if ty.emit_scope == EmitScope::Omitted {
                    continue;
                }
                ty.emit_scope = match ty.visibility {
                    Visibility::Private => EmitScope::Omitted,
                    Visibility::Internal | Visibility::Protected => EmitScope::Internal,
                    Visibility::Public => {
                        if ty.kind == TypeKind::Interface
                            && ty.bcl_internal
                            && ctx.options.emit_internal_interfaces
                        {
                            EmitScope::Internal
                        } else {
                            match namespace.area {
                                Area::Public => EmitScope::Public,
                                Area::Internal => EmitScope::Internal,
                            }
                        }
                    }
                };
            }
        }
        debug!("emit scopes assigned");
        out
    }
}
