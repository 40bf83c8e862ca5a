//! The symbol graph IR.
//!
//! All entities are plain data with tagged variants and exhaustive
//! matching at use sites; there is no node hierarchy. Canonical ids carry
//! the full source-system name including generic arity (`` List`1 ``) and
//! the `+`-joined enclosing-type path (`Outer+Inner`).

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

bitflags! {
    /// Record of which shape passes have run on a graph.
    ///
    /// Passes declare preconditions against this set; the sequencer
    /// refuses to run a pass whose requirements are not yet stamped.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct PassFlags: u32 {
        const INTERFACE_INLINER = 1 << 0;
        const INTERNAL_INTERFACE_FILTER = 1 << 1;
        const STRUCTURAL_CONFORMANCE = 1 << 2;
        const EXPLICIT_IMPL_SYNTHESIZER = 1 << 3;
        const INTERFACE_RESOLVER = 1 << 4;
        const DIAMOND_RESOLVER = 1 << 5;
        const BASE_OVERLOAD_ADDER = 1 << 6;
        const OVERLOAD_RETURN_RESOLVER = 1 << 7;
        const MEMBER_DEDUPLICATOR = 1 << 8;
        const VIEW_PLANNER = 1 << 9;
        const CLASS_SURFACE_DEDUPLICATOR = 1 << 10;
        const HIDDEN_MEMBER_PLANNER = 1 << 11;
        const INDEXER_PLANNER = 1 << 12;
        const FINAL_INDEXERS = 1 << 13;
        const STATIC_SIDE_ANALYZER = 1 << 14;
        const CONSTRAINT_CLOSER = 1 << 15;
        const EMIT_SCOPE_ASSIGNER = 1 << 16;
        const NAMES_APPLIED = 1 << 17;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Area {
    Public,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    Class,
    Interface,
    Struct,
    Enum,
    Delegate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberKind {
    Method,
    Property,
    Field,
    Event,
    Indexer,
    Constructor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Protected,
    Internal,
    Private,
}

/// Visibility classification controlling whether and where a symbol
/// appears in output. `Unset` is the raw loaded state; after the final
/// shape pass every type has a determinate scope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmitScope {
    #[default]
    Unset,
    Public,
    Internal,
    Omitted,
}

/// Why a member was omitted from emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OmitReason {
    /// Indexers become index signatures, handled by the emitter, never
    /// named members.
    IndexSignature,
    /// Overload with a return type that could not be reconciled and had
    /// no interface view to live in.
    ReturnConflict,
    /// Member of an interface internal to the base class library.
    InternalInterface,
}

/// Placement of a member relative to the class surface.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewTag {
    /// Ordinary surface member.
    #[default]
    None,
    /// Surfaced only through the per-interface projection for the given
    /// interface id.
    ViewOnly(String),
    /// Excluded from emission.
    Omitted(OmitReason),
    /// Shadows an inherited member (source `new` modifier).
    Hidden,
}

impl ViewTag {
    pub fn is_omitted(&self) -> bool {
        matches!(self, ViewTag::Omitted(_))
    }

    pub fn is_view_only(&self) -> bool {
        matches!(self, ViewTag::ViewOnly(_))
    }
}

/// A symbolic reference to a type, resolved through the indices.
///
/// May dangle only for types outside the input closure; the loader marks
/// those `external`. A dangling non-external reference is a diagnostic,
/// never a silent drop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeRef {
    pub id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<TypeRef>,
    #[serde(default)]
    pub external: bool,
}

impl TypeRef {
    pub fn named(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            args: Vec::new(),
            external: false,
        }
    }

    pub fn external(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            args: Vec::new(),
            external: true,
        }
    }

    pub fn generic(id: impl Into<String>, args: Vec<TypeRef>) -> Self {
        Self {
            id: id.into(),
            args,
            external: false,
        }
    }
}

/// A constraint on a generic parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Constraint {
    /// `T : I` for an interface I.
    Interface(TypeRef),
    /// `T : B` for a class B.
    BaseClass(TypeRef),
    /// `T : new()`: T must be default-constructible.
    DefaultCtor,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenericParam {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<Constraint>,
}

impl GenericParam {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            constraints: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub ty: TypeRef,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub rest: bool,
}

impl Param {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            optional: false,
            rest: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    #[serde(default)]
    pub params: SmallVec<[Param; 4]>,
    pub ret: TypeRef,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub generics: Vec<GenericParam>,
}

impl Signature {
    pub fn returning(ret: TypeRef) -> Self {
        Self {
            params: SmallVec::new(),
            ret,
            generics: Vec::new(),
        }
    }

    pub fn with_params(params: impl IntoIterator<Item = Param>, ret: TypeRef) -> Self {
        Self {
            params: params.into_iter().collect(),
            ret,
            generics: Vec::new(),
        }
    }

    /// Erased shape of the parameter list: root type ids only, generic
    /// arguments dropped. Two members with equal name and equal erased
    /// signature are the same member for dedup and diamond purposes.
    pub fn erased(&self) -> String {
        let mut key = String::new();
        for param in &self.params {
            if param.rest {
                key.push('*');
            }
            key.push_str(&param.ty.id);
            key.push(';');
        }
        key
    }

    /// Count of optional and rest parameters, used for overload
    /// specificity ordering.
    pub fn looseness(&self) -> usize {
        self.params
            .iter()
            .filter(|p| p.optional || p.rest)
            .count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub kind: MemberKind,
    pub name: String,
    pub signature: Signature,
    #[serde(default = "default_visibility")]
    pub visibility: Visibility,
    #[serde(default)]
    pub is_static: bool,
    /// Source `new` modifier: this member hides an inherited one.
    #[serde(default)]
    pub hides_base: bool,
    /// Interface whose contract this member originates from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declaring_interface: Option<String>,
    /// Interface this member explicitly implements, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explicit_impl: Option<String>,
    #[serde(default)]
    pub view_tag: ViewTag,
    /// Additional overload signatures beyond `signature`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub overloads: Vec<Signature>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts_name: Option<String>,
}

fn default_visibility() -> Visibility {
    Visibility::Public
}

impl Member {
    pub fn new(kind: MemberKind, name: impl Into<String>, signature: Signature) -> Self {
        Self {
            kind,
            name: name.into(),
            signature,
            visibility: Visibility::Public,
            is_static: false,
            hides_base: false,
            declaring_interface: None,
            explicit_impl: None,
            view_tag: ViewTag::None,
            overloads: Vec::new(),
            doc_link: None,
            ts_name: None,
        }
    }

    /// Dedup key: name plus erased signature.
    pub fn erased_key(&self) -> (String, String) {
        (self.name.clone(), self.signature.erased())
    }

    /// All signatures this member carries, primary first.
    pub fn signatures(&self) -> impl Iterator<Item = &Signature> {
        std::iter::once(&self.signature).chain(self.overloads.iter())
    }

    pub fn is_omitted(&self) -> bool {
        self.view_tag.is_omitted()
    }
}

/// The per-interface projection that groups ViewOnly members for one
/// interface on one type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct View {
    pub interface_id: String,
    pub members: Vec<Member>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Type {
    pub canonical_id: String,
    pub kind: TypeKind,
    #[serde(default = "default_visibility")]
    pub visibility: Visibility,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<TypeRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<TypeRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub generics: Vec<GenericParam>,
    #[serde(default)]
    pub members: Vec<Member>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub views: Vec<View>,
    /// Interface internal to the base class library.
    #[serde(default)]
    pub bcl_internal: bool,
    #[serde(default)]
    pub emit_scope: EmitScope,
    /// Whether the static side is non-empty (companion-object emission).
    #[serde(default)]
    pub static_side: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts_name: Option<String>,
}

impl Type {
    pub fn new(canonical_id: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            canonical_id: canonical_id.into(),
            kind,
            visibility: Visibility::Public,
            base: None,
            interfaces: Vec::new(),
            generics: Vec::new(),
            members: Vec::new(),
            views: Vec::new(),
            bcl_internal: false,
            emit_scope: EmitScope::Unset,
            static_side: false,
            ts_name: None,
        }
    }

    /// Last segment of the canonical id: the name a reserver proposal
    /// starts from. `System.Outer+Inner` yields `Inner`-with-enclosing
    /// (`Outer+Inner`), since nested types flatten into one TS name.
    pub fn proposed_name(&self) -> &str {
        match self.canonical_id.rfind('.') {
            Some(dot) => &self.canonical_id[dot + 1..],
            None => &self.canonical_id,
        }
    }

    pub fn is_interface(&self) -> bool {
        self.kind == TypeKind::Interface
    }

    pub fn view(&self, interface_id: &str) -> Option<&View> {
        self.views.iter().find(|v| v.interface_id == interface_id)
    }

    pub fn view_mut(&mut self, interface_id: &str) -> Option<&mut View> {
        self.views
            .iter_mut()
            .find(|v| v.interface_id == interface_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Namespace {
    pub id: String,
    #[serde(default = "default_area")]
    pub area: Area,
    #[serde(default)]
    pub types: Vec<Type>,
}

fn default_area() -> Area {
    Area::Public
}

/// The root IR value: an ordered sequence of namespaces plus the record
/// of completed shape passes. Indices are derived separately and rebuilt
/// after every structural rewrite.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolGraph {
    #[serde(default)]
    pub namespaces: Vec<Namespace>,
    #[serde(skip)]
    pub passes_run: PassFlags,
}

impl SymbolGraph {
    pub fn new(namespaces: Vec<Namespace>) -> Self {
        Self {
            namespaces,
            passes_run: PassFlags::empty(),
        }
    }

    pub fn types(&self) -> impl Iterator<Item = (&Namespace, &Type)> {
        self.namespaces
            .iter()
            .flat_map(|ns| ns.types.iter().map(move |ty| (ns, ty)))
    }

    pub fn type_count(&self) -> usize {
        self.namespaces.iter().map(|ns| ns.types.len()).sum()
    }
}
