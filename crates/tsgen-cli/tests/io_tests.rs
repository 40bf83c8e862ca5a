//! Loader and writer round trips through the filesystem.

use tsgen_cli::{loader, run_pipeline, writer};
use tsgen_common::PipelineOptions;

const RAW_GRAPH: &str = r#"{
    "namespaces": [{
        "id": "Demo",
        "area": "public",
        "types": [{
            "canonical_id": "Demo.Greeter",
            "kind": "class",
            "members": [{
                "kind": "method",
                "name": "Greet",
                "signature": {
                    "params": [{"name": "who", "ty": {"id": "System.String", "external": true}}],
                    "ret": {"id": "System.String", "external": true}
                }
            }]
        }]
    }]
}"#;

#[test]
fn test_load_run_write_round_trip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("graph.json");
    std::fs::write(&input, RAW_GRAPH).expect("write input");

    let graph = loader::load_graph(&input).expect("graph loads");
    let outcome = run_pipeline(graph, &PipelineOptions::default()).expect("pipeline runs");
    assert!(outcome.succeeded());

    let out_dir = dir.path().join("out");
    let written = writer::write_outputs(&out_dir, &outcome).expect("outputs written");
    assert_eq!(written.len(), 2, "diagnostics and plan");

    let plan_text = std::fs::read_to_string(out_dir.join("plan.json")).expect("plan readable");
    let plan: serde_json::Value = serde_json::from_str(&plan_text).expect("plan is JSON");
    assert_eq!(plan["emit_order"][0], "Demo");
    assert_eq!(
        plan["graph"]["namespaces"][0]["types"][0]["ts_name"],
        "Greeter"
    );

    let report_text =
        std::fs::read_to_string(out_dir.join("diagnostics.json")).expect("report readable");
    let report: serde_json::Value = serde_json::from_str(&report_text).expect("report is JSON");
    assert_eq!(report["error_count"], 0);
}

#[test]
fn test_failed_build_writes_diagnostics_but_no_plan() {
    // Duplicate canonical ids force an index error, which gates the plan.
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("graph.json");
    std::fs::write(
        &input,
        r#"{
            "namespaces": [
                {"id": "A", "area": "public", "types": [
                    {"canonical_id": "A.T", "kind": "class", "members": []},
                    {"canonical_id": "A.T", "kind": "class", "members": []}
                ]}
            ]
        }"#,
    )
    .expect("write input");

    let graph = loader::load_graph(&input).expect("graph loads");
    let outcome = run_pipeline(graph, &PipelineOptions::default()).expect("pipeline runs");
    assert!(!outcome.succeeded());

    let out_dir = dir.path().join("out");
    let written = writer::write_outputs(&out_dir, &outcome).expect("outputs written");
    assert_eq!(written.len(), 1, "diagnostics only");
    assert!(out_dir.join("diagnostics.json").exists());
    assert!(!out_dir.join("plan.json").exists());
}

#[test]
fn test_loader_rejects_missing_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    assert!(loader::load_graph(&dir.path().join("absent.json")).is_err());
}
