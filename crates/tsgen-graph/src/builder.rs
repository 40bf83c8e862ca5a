//! Programmatic graph construction.
//!
//! The builder produces graphs in the raw loaded state (EmitScope unset,
//! no ts names, no views), the same contract the JSON loader guarantees.
//! Tests across the workspace construct their fixtures through it.

use crate::model::{
    Area, Constraint, GenericParam, Member, MemberKind, Namespace, Param, Signature, SymbolGraph,
    Type, TypeKind, TypeRef, Visibility,
};

#[derive(Debug, Default)]
pub struct GraphBuilder {
    namespaces: Vec<Namespace>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn namespace(mut self, id: impl Into<String>) -> Self {
        self.namespaces.push(Namespace {
            id: id.into(),
            area: Area::Public,
            types: Vec::new(),
        });
        self
    }

    pub fn internal_namespace(mut self, id: impl Into<String>) -> Self {
        self.namespaces.push(Namespace {
            id: id.into(),
            area: Area::Internal,
            types: Vec::new(),
        });
        self
    }

    /// Add a type to the most recently added namespace.
    pub fn ty(mut self, type_builder: TypeBuilder) -> Self {
        let namespace = self
            .namespaces
            .last_mut()
            .expect("add a namespace before adding types");
        namespace.types.push(type_builder.build());
        self
    }

    pub fn build(self) -> SymbolGraph {
        SymbolGraph::new(self.namespaces)
    }
}

#[derive(Debug)]
pub struct TypeBuilder {
    ty: Type,
}

impl TypeBuilder {
    pub fn class(canonical_id: impl Into<String>) -> Self {
        Self {
            ty: Type::new(canonical_id, TypeKind::Class),
        }
    }

    pub fn interface(canonical_id: impl Into<String>) -> Self {
        Self {
            ty: Type::new(canonical_id, TypeKind::Interface),
        }
    }

    pub fn strukt(canonical_id: impl Into<String>) -> Self {
        Self {
            ty: Type::new(canonical_id, TypeKind::Struct),
        }
    }

    pub fn enumeration(canonical_id: impl Into<String>) -> Self {
        Self {
            ty: Type::new(canonical_id, TypeKind::Enum),
        }
    }

    pub fn delegate(canonical_id: impl Into<String>) -> Self {
        Self {
            ty: Type::new(canonical_id, TypeKind::Delegate),
        }
    }

    pub fn base(mut self, base: impl Into<String>) -> Self {
        self.ty.base = Some(TypeRef::named(base));
        self
    }

    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.ty.interfaces.push(TypeRef::named(interface));
        self
    }

    pub fn implements_ref(mut self, interface: TypeRef) -> Self {
        self.ty.interfaces.push(interface);
        self
    }

    pub fn bcl_internal(mut self) -> Self {
        self.ty.bcl_internal = true;
        self
    }

    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.ty.visibility = visibility;
        self
    }

    pub fn generic(mut self, name: impl Into<String>, constraints: Vec<Constraint>) -> Self {
        self.ty.generics.push(GenericParam {
            name: name.into(),
            constraints,
        });
        self
    }

    pub fn member(mut self, member_builder: MemberBuilder) -> Self {
        self.ty.members.push(member_builder.build());
        self
    }

    pub fn build(self) -> Type {
        self.ty
    }
}

#[derive(Debug)]
pub struct MemberBuilder {
    member: Member,
}

impl MemberBuilder {
    pub fn method(name: impl Into<String>, ret: impl Into<String>) -> Self {
        Self {
            member: Member::new(
                MemberKind::Method,
                name,
                Signature::returning(TypeRef::named(ret)),
            ),
        }
    }

    pub fn property(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            member: Member::new(
                MemberKind::Property,
                name,
                Signature::returning(TypeRef::named(ty)),
            ),
        }
    }

    pub fn field(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            member: Member::new(
                MemberKind::Field,
                name,
                Signature::returning(TypeRef::named(ty)),
            ),
        }
    }

    pub fn event(name: impl Into<String>, handler: impl Into<String>) -> Self {
        Self {
            member: Member::new(
                MemberKind::Event,
                name,
                Signature::returning(TypeRef::named(handler)),
            ),
        }
    }

    pub fn indexer(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            member: Member::new(
                MemberKind::Indexer,
                "Item",
                Signature::with_params(
                    [Param::new("index", TypeRef::named(key))],
                    TypeRef::named(value),
                ),
            ),
        }
    }

    pub fn constructor() -> Self {
        Self {
            member: Member::new(
                MemberKind::Constructor,
                ".ctor",
                Signature::returning(TypeRef::named("System.Void")),
            ),
        }
    }

    pub fn param(mut self, name: impl Into<String>, ty: impl Into<String>) -> Self {
        self.member
            .signature
            .params
            .push(Param::new(name, TypeRef::named(ty)));
        self
    }

    pub fn optional_param(mut self, name: impl Into<String>, ty: impl Into<String>) -> Self {
        let mut param = Param::new(name, TypeRef::named(ty));
        param.optional = true;
        self.member.signature.params.push(param);
        self
    }

    pub fn rest_param(mut self, name: impl Into<String>, ty: impl Into<String>) -> Self {
        let mut param = Param::new(name, TypeRef::named(ty));
        param.rest = true;
        self.member.signature.params.push(param);
        self
    }

    pub fn is_static(mut self) -> Self {
        self.member.is_static = true;
        self
    }

    pub fn hides_base(mut self) -> Self {
        self.member.hides_base = true;
        self
    }

    pub fn explicit_impl(mut self, interface: impl Into<String>) -> Self {
        self.member.explicit_impl = Some(interface.into());
        self
    }

    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.member.visibility = visibility;
        self
    }

    pub fn doc_link(mut self, link: impl Into<String>) -> Self {
        self.member.doc_link = Some(link.into());
        self
    }

    pub fn overload(mut self, signature: Signature) -> Self {
        self.member.overloads.push(signature);
        self
    }

    pub fn build(self) -> Member {
        self.member
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EmitScope;

    #[test]
    fn test_builder_produces_raw_state() {
        let graph = GraphBuilder::new()
            .namespace("System.Text")
            .ty(TypeBuilder::class("System.Text.StringBuilder")
                .member(MemberBuilder::method("Append", "System.Text.StringBuilder").param("value", "System.String")))
            .build();

        assert_eq!(graph.namespaces.len(), 1);
        let ty = &graph.namespaces[0].types[0];
        assert_eq!(ty.emit_scope, EmitScope::Unset);
        assert!(ty.ts_name.is_none());
        assert!(ty.views.is_empty());
        assert!(graph.passes_run.is_empty());
    }

    #[test]
    fn test_types_iterates_in_graph_order() {
        let graph = GraphBuilder::new()
            .namespace("B")
            .ty(TypeBuilder::class("B.First"))
            .namespace("A")
            .ty(TypeBuilder::class("A.Second"))
            .build();

        let ids: Vec<&str> = graph.types().map(|(_, t)| t.canonical_id.as_str()).collect();
        assert_eq!(ids, vec!["B.First", "A.Second"]);
    }
}
