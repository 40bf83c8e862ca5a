//! Name reservation (Phase 3.5).
//!
//! A stateful collaborator enforcing lexical uniqueness across three
//! scope kinds: namespace-area (type names), class surface per staticness
//! (member names), and view per interface (projected member names).
//! Population order is fully deterministic (the same input graph yields
//! byte-identical name assignments) and that determinism is the entire
//! behavioral contract.

use once_cell::sync::Lazy;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;
use tsgen_common::diagnostics::codes;
use tsgen_common::InternalError;
use tsgen_graph::{Area, EmitScope, MemberKind, PassFlags, SymbolGraph};

/// TypeScript reserved words, including the strict-mode set. A proposed
/// name colliding with one of these gets an underscore suffix.
static RESERVED_WORDS: Lazy<FxHashSet<&'static str>> = Lazy::new(|| {
    [
        "break", "case", "catch", "class", "const", "continue", "debugger", "default", "delete",
        "do", "else", "enum", "export", "extends", "false", "finally", "for", "function", "if",
        "import", "in", "instanceof", "new", "null", "return", "super", "switch", "this", "throw",
        "true", "try", "typeof", "var", "void", "while", "with", "as", "implements", "interface",
        "let", "package", "private", "protected", "public", "static", "yield", "await",
    ]
    .into_iter()
    .collect()
});

/// A uniqueness domain for names.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScopeKey {
    /// Type names within one namespace and area.
    Namespace(String, Area),
    /// Member names on a class surface; instance and static sides are
    /// separate scopes.
    ClassSurface(String, bool),
    /// Member names inside the view projection of one interface on one
    /// type.
    View(String, String),
}

/// Syntactic normalization: generic-arity backticks and nested-type plus
/// signs become underscores, and a leading digit is guarded.
pub fn normalize_identifier(proposed: &str) -> String {
    let mut name: String = proposed
        .chars()
        .map(|c| match c {
            '`' | '+' => '_',
            other => other,
        })
        .collect();
    if name.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    name
}

#[derive(Debug, Default)]
pub struct NameReserver {
    scopes: FxHashMap<ScopeKey, FxHashSet<String>>,
}

impl NameReserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a name for `proposed` in the given scope: normalize,
    /// dodge reserved words, then find the smallest integer suffix >= 2
    /// that makes the name unique.
    pub fn reserve(&mut self, scope: ScopeKey, proposed: &str) -> String {
        let mut name = normalize_identifier(proposed);
        if RESERVED_WORDS.contains(name.as_str()) {
            name.push('_');
        }
        let taken = self.scopes.entry(scope).or_default();
        if taken.contains(&name) {
            let mut suffix = 2usize;
            loop {
                let candidate = format!("{name}{suffix}");
                if !taken.contains(&candidate) {
                    name = candidate;
                    break;
                }
                suffix += 1;
            }
        }
        taken.insert(name.clone());
        name
    }

    /// Names already recorded in a scope, if any reservation touched it.
    pub fn names_in(&self, scope: &ScopeKey) -> Option<&FxHashSet<String>> {
        self.scopes.get(scope)
    }
}

/// Populate a reserver from the graph in deterministic order and write
/// the assigned names onto a fresh graph: all type names first
/// (namespaces in graph order), then members (types in graph order;
/// instance surface, then static surface, then each view in its stored
/// lexicographic order).
pub fn apply_names(graph: &SymbolGraph) -> (SymbolGraph, NameReserver) {
    let mut reserver = NameReserver::new();
    let mut out = graph.clone();

    for namespace in &mut out.namespaces {
        for ty in &mut namespace.types {
            if ty.emit_scope == EmitScope::Omitted {
                continue;
            }
            let scope = ScopeKey::Namespace(namespace.id.clone(), namespace.area);
            ty.ts_name = Some(reserver.reserve(scope, ty.proposed_name()));
        }
    }

    for namespace in &mut out.namespaces {
        for ty in &mut namespace.types {
            if ty.emit_scope == EmitScope::Omitted {
                continue;
            }
            let type_id = ty.canonical_id.clone();

            // Constructors collapse onto the fixed `constructor` slot:
            // every overload shares one declaration.
            for is_static in [false, true] {
                let scope = ScopeKey::ClassSurface(type_id.clone(), is_static);
                let mut ctor_name: Option<String> = None;
                for member in &mut ty.members {
                    if member.is_static != is_static || member.is_omitted() {
                        continue;
                    }
                    if member.view_tag.is_view_only() {
                        continue;
                    }
                    if member.kind == MemberKind::Constructor {
                        let name = ctor_name
                            .get_or_insert_with(|| {
                                reserver.reserve(scope.clone(), "constructor")
                            })
                            .clone();
                        member.ts_name = Some(name);
                        continue;
                    }
                    member.ts_name = Some(reserver.reserve(scope.clone(), &member.name));
                }
            }

            for view in &mut ty.views {
                let scope = ScopeKey::View(type_id.clone(), view.interface_id.clone());
                for member in &mut view.members {
                    if member.is_omitted() {
                        continue;
                    }
                    member.ts_name = Some(reserver.reserve(scope.clone(), &member.name));
                }
            }
        }
    }

    out.passes_run |= PassFlags::NAMES_APPLIED;
    debug!("names applied to graph");
    (out, reserver)
}

/// Completeness audit: every symbol that will be emitted must carry an
/// assigned name. A failure here is an internal invariant violation, not
/// a user-facing diagnostic.
pub fn audit_names(graph: &SymbolGraph) -> Result<(), InternalError> {
    for (namespace, ty) in graph.types() {
        if ty.emit_scope == EmitScope::Omitted {
            continue;
        }
        if ty.ts_name.is_none() {
            return Err(InternalError::new(
                codes::INTERNAL_RESERVE_INCOMPLETE,
                format!("type '{}' in '{}' has no emission name", ty.canonical_id, namespace.id),
            ));
        }
        for member in &ty.members {
            if !member.is_omitted() && !member.view_tag.is_view_only() && member.ts_name.is_none() {
                return Err(InternalError::new(
                    codes::INTERNAL_RESERVE_INCOMPLETE,
                    format!(
                        "member '{}.{}' has no emission name",
                        ty.canonical_id, member.name
                    ),
                ));
            }
        }
        for view in &ty.views {
            for member in &view.members {
                if !member.is_omitted() && member.ts_name.is_none() {
                    return Err(InternalError::new(
                        codes::INTERNAL_RESERVE_INCOMPLETE,
                        format!(
                            "view member '{}/{}::{}' has no emission name",
                            ty.canonical_id, view.interface_id, member.name
                        ),
                    ));
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalization_rules() {
        assert_eq!(normalize_identifier("List`1"), "List_1");
        assert_eq!(normalize_identifier("Outer+Inner"), "Outer_Inner");
        assert_eq!(normalize_identifier("2D"), "_2D");
        assert_eq!(normalize_identifier("Plain"), "Plain");
    }

    #[test]
    fn test_reserved_word_gets_underscore() {
        let mut reserver = NameReserver::new();
        let scope = ScopeKey::Namespace("N".to_string(), Area::Public);
        assert_eq!(reserver.reserve(scope, "delete"), "delete_");
    }

    #[test]
    fn test_collision_gets_smallest_suffix() {
        let mut reserver = NameReserver::new();
        let scope = ScopeKey::ClassSurface("N.C".to_string(), false);
        assert_eq!(reserver.reserve(scope.clone(), "Run"), "Run");
        assert_eq!(reserver.reserve(scope.clone(), "Run"), "Run2");
        assert_eq!(reserver.reserve(scope.clone(), "Run"), "Run3");
    }

    #[test]
    fn test_scopes_are_independent() {
        let mut reserver = NameReserver::new();
        let instance = ScopeKey::ClassSurface("N.C".to_string(), false);
        let statics = ScopeKey::ClassSurface("N.C".to_string(), true);
        assert_eq!(reserver.reserve(instance, "Run"), "Run");
        assert_eq!(reserver.reserve(statics, "Run"), "Run");
    }
}
