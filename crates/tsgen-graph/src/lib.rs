//! Symbol graph data model and indices for the tsgen declaration generator.
//!
//! The graph is the in-memory IR the whole pipeline rewrites: namespaces
//! own types, types own members, and every cross-entity link is a symbolic
//! canonical id resolved through [`GraphIndices`]. Rewrites are
//! clone-and-modify: a pass never mutates its input graph.

pub mod model;
pub use model::{
    Area, Constraint, EmitScope, GenericParam, Member, MemberKind, Namespace, OmitReason, Param,
    PassFlags, Signature, SymbolGraph, Type, TypeKind, TypeRef, View, ViewTag, Visibility,
};

pub mod builder;
pub use builder::{GraphBuilder, MemberBuilder, TypeBuilder};

pub mod indices;
pub use indices::{GraphIndices, TypePos};
