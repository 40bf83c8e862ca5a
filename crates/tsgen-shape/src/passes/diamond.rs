//! Diamond resolution.
//!
//! A diamond is two inheritance paths supplying a member of the same name
//! (and erased signature) to the same class. The resolver elects one
//! canonical surface member: a directly-declared class member wins, else
//! the most-derived interface's copy; same-depth ties fall to the
//! lexicographically smallest interface id when the copies agree on the
//! full signature, and demote everything to views when they do not.

use tsgen_common::diagnostics::codes;
use tsgen_graph::{PassFlags, SymbolGraph, Type, TypeKind, ViewTag};

use super::conformance::{declaring_interfaces, most_derived};
use super::{ShapeContext, ShapePass};

pub struct DiamondResolver;

impl ShapePass for DiamondResolver {
    fn name(&self) -> &'static str {
        "DiamondResolver"
    }

    fn flag(&self) -> PassFlags {
        PassFlags::DIAMOND_RESOLVER
    }

    fn requires(&self) -> PassFlags {
        PassFlags::INTERFACE_RESOLVER | PassFlags::STRUCTURAL_CONFORMANCE
    }

    fn run(&self, ctx: &mut ShapeContext<'_>, graph: &SymbolGraph) -> SymbolGraph {
        let mut out = graph.clone();

        for (ns_pos, namespace) in graph.namespaces.iter().enumerate() {
            for (ty_pos, ty) in namespace.types.iter().enumerate() {
                if !matches!(ty.kind, TypeKind::Class | TypeKind::Struct) {
                    continue;
                }
                resolve_type(ctx, ty, &mut out, ns_pos, ty_pos, &namespace.id);
            }
        }
        out
    }
}

fn resolve_type(
    ctx: &mut ShapeContext<'_>,
    ty: &Type,
    out: &mut SymbolGraph,
    ns_pos: usize,
    ty_pos: usize,
    ns_id: &str,
) {
    // Group surface members by erased key, preserving first-seen order.
    let mut groups: Vec<((String, String), Vec<usize>)> = Vec::new();
    for (pos, member) in ty.members.iter().enumerate() {
        if member.view_tag != ViewTag::None {
            continue;
        }
        let key = member.erased_key();
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, positions)) => positions.push(pos),
            None => groups.push((key, vec![pos])),
        }
    }

    for (_, positions) in groups {
        if positions.len() == 1 {
            // A single surface member can still sit on a diamond: several
            // implemented interfaces declaring the same contract.
            let member = &ty.members[positions[0]];
            let declarers = declaring_interfaces(&ctx.indices, ty, member);
            if declarers.len() >= 2 {
                ctx.sink.record(
                    tsgen_common::Diagnostic::new(
                        tsgen_common::Severity::Info,
                        codes::SHAPE_DIAMOND_RESOLVED,
                        format!(
                            "member '{}' satisfies multiple interface paths: {}",
                            member.name,
                            declarers.join(", ")
                        ),
                    )
                    .with_namespace(ns_id)
                    .with_type(ty.canonical_id.clone())
                    .with_member(member.name.clone()),
                );
                if member.declaring_interface.is_none()
                    && let Some(winner) = most_derived(&ctx.indices, &declarers)
                {
                    out.namespaces[ns_pos].types[ty_pos].members[positions[0]]
                        .declaring_interface = Some(winner);
                }
            }
            continue;
        }

        elect(ctx, ty, &positions, out, ns_pos, ty_pos, ns_id);
    }
}

fn elect(
    ctx: &mut ShapeContext<'_>,
    ty: &Type,
    positions: &[usize],
    out: &mut SymbolGraph,
    ns_pos: usize,
    ty_pos: usize,
    ns_id: &str,
) {
    let name = ty.members[positions[0]].name.clone();
    let declarers: Vec<String> = positions
        .iter()
        .filter_map(|&p| ty.members[p].declaring_interface.clone())
        .collect();

    // (a) a directly-declared class member wins outright.
    let direct = positions
        .iter()
        .find(|&&p| ty.members[p].declaring_interface.is_none());
    let winner = if let Some(&direct_pos) = direct {
        Some(direct_pos)
    } else {
        // (b) the copy from the most-derived interface; ties among
        // same-depth interfaces only stand when the copies agree on the
        // full signature.
        let identical = positions
            .windows(2)
            .all(|w| ty.members[w[0]].signature == ty.members[w[1]].signature);
        let elected = most_derived(&ctx.indices, &declarers);
        match elected {
            Some(winning_iface) if identical || unique_maximum(ctx, &declarers, &winning_iface) => {
                positions
                    .iter()
                    .copied()
                    .find(|&p| ty.members[p].declaring_interface.as_deref() == Some(winning_iface.as_str()))
            }
            _ => None,
        }
    };

    match winner {
        Some(winner_pos) => {
            for &p in positions {
                if p == winner_pos {
                    continue;
                }
                let member = &mut out.namespaces[ns_pos].types[ty_pos].members[p];
                if let Some(iface) = member.declaring_interface.clone() {
                    member.view_tag = ViewTag::ViewOnly(iface);
                }
            }
            ctx.sink.record(
                tsgen_common::Diagnostic::new(
                    tsgen_common::Severity::Info,
                    codes::SHAPE_DIAMOND_RESOLVED,
                    format!(
                        "diamond on '{}' resolved; inheritance paths: {}",
                        name,
                        declarers.join(", ")
                    ),
                )
                .with_namespace(ns_id)
                .with_type(ty.canonical_id.clone())
                .with_member(name),
            );
        }
        None => {
            // (c) still ambiguous: every variant moves to its view.
            for &p in positions {
                let member = &mut out.namespaces[ns_pos].types[ty_pos].members[p];
                if let Some(iface) = member.declaring_interface.clone() {
                    member.view_tag = ViewTag::ViewOnly(iface);
                }
            }
            ctx.sink.record(
                tsgen_common::Diagnostic::new(
                    tsgen_common::Severity::Info,
                    codes::SHAPE_DIAMOND_AMBIGUOUS,
                    format!(
                        "diamond on '{}' is ambiguous; all variants demoted to views: {}",
                        name,
                        declarers.join(", ")
                    ),
                )
                .with_namespace(ns_id)
                .with_type(ty.canonical_id.clone())
                .with_member(name),
            );
        }
    }
}

/// True when `winner` strictly derives every other declarer, i.e. the
/// election was decided by depth rather than the lexicographic tie-break.
fn unique_maximum(ctx: &ShapeContext<'_>, declarers: &[String], winner: &str) -> bool {
    declarers
        .iter()
        .all(|other| other == winner || ctx.indices.interface_derives(winner, other))
}
