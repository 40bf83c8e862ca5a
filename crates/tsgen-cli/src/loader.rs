//! Symbol graph loading.
//!
//! The reflection front end hands over a fully populated graph as JSON.
//! The loader contract: every type and member arrives in its raw state,
//! with emit scope unset, no emission names, no views. A file violating that
//! contract is rejected before the pipeline sees it.

use anyhow::{Context, Result, bail};
use std::path::Path;

use tsgen_graph::{EmitScope, SymbolGraph};

pub fn load_graph(path: &Path) -> Result<SymbolGraph> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading symbol graph from '{}'", path.display()))?;
    let graph: SymbolGraph = serde_json::from_str(&text)
        .with_context(|| format!("parsing symbol graph from '{}'", path.display()))?;
    validate_raw_state(&graph)?;
    Ok(graph)
}

fn validate_raw_state(graph: &SymbolGraph) -> Result<()> {
    for (namespace, ty) in graph.types() {
        if ty.emit_scope != EmitScope::Unset {
            bail!(
                "type '{}' in '{}' arrived with a pre-assigned emit scope; the loader must deliver raw state",
                ty.canonical_id,
                namespace.id
            );
        }
        if ty.ts_name.is_some() {
            bail!(
                "type '{}' arrived with a pre-assigned emission name",
                ty.canonical_id
            );
        }
        if !ty.views.is_empty() {
            bail!("type '{}' arrived with materialized views", ty.canonical_id);
        }
        if let Some(member) = ty.members.iter().find(|m| m.ts_name.is_some()) {
            bail!(
                "member '{}.{}' arrived with a pre-assigned emission name",
                ty.canonical_id,
                member.name
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_state_accepted() {
        let graph: SymbolGraph = serde_json::from_str(
            r#"{
                "namespaces": [{
                    "id": "System.Text",
                    "area": "public",
                    "types": [{
                        "canonical_id": "System.Text.StringBuilder",
                        "kind": "class",
                        "members": [{
                            "kind": "method",
                            "name": "Append",
                            "signature": {
                                "params": [{"name": "value", "ty": {"id": "System.String", "external": true}}],
                                "ret": {"id": "System.Text.StringBuilder"}
                            }
                        }]
                    }]
                }]
            }"#,
        )
        .expect("valid graph JSON");
        assert!(validate_raw_state(&graph).is_ok());
        assert_eq!(graph.type_count(), 1);
    }

    #[test]
    fn test_preassigned_name_rejected() {
        let graph: SymbolGraph = serde_json::from_str(
            r#"{
                "namespaces": [{
                    "id": "N",
                    "area": "public",
                    "types": [{
                        "canonical_id": "N.T",
                        "kind": "class",
                        "members": [],
                        "ts_name": "T"
                    }]
                }]
            }"#,
        )
        .expect("valid graph JSON");
        assert!(validate_raw_state(&graph).is_err());
    }
}
