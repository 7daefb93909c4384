// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::HashMap;
use std::fs;

use ltex::graph::{EdgeKind, LineageGraph, Vertex};
use ltex::options::AnalysisOptions;
use ltex::procedure::{empty_field_path, ProcedureId};
use ltex::store::{DependencySet, JsonDescriptionStore, JsonSummaryStore};

fn options(source: &[&str], sink: &[&str], sanitizer: &[&str], results_dir: &std::path::Path) -> AnalysisOptions {
    AnalysisOptions {
        source: source.iter().map(|s| s.to_string()).collect(),
        sink: sink.iter().map(|s| s.to_string()).collect(),
        sanitizer: sanitizer.iter().map(|s| s.to_string()).collect(),
        results_dir: results_dir.to_string_lossy().into_owned(),
        lineage_limit: None,
        dump_reachable: false,
        dump_stats: false,
    }
}

fn description_store(descriptions: &[(&str, &str)]) -> JsonDescriptionStore {
    let map: HashMap<String, String> = descriptions
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    JsonDescriptionStore::from_map(map)
}

#[test]
fn end_to_end_trivial_intraprocedural_flow_is_reported() {
    let workdir = tempfile::tempdir().unwrap();
    let summaries = JsonSummaryStore::new(workdir.path().join("summaries"));

    let mut f = LineageGraph::new();
    f.add_edge(
        &Vertex::Argument(0, empty_field_path()),
        &Vertex::Local("x".into(), empty_field_path()),
        EdgeKind::Direct,
    );
    f.add_edge(
        &Vertex::Local("x".into(), empty_field_path()),
        &Vertex::Return(empty_field_path()),
        EdgeKind::Direct,
    );
    summaries
        .put(
            &ProcedureId::new("m", "f", 1),
            DependencySet {
                callees: vec![],
                complete: true,
            },
            None,
            &f,
        )
        .unwrap();

    let descriptions = description_store(&[("m:f/1", "copies its argument to its return")]);
    let results_dir = workdir.path().join("results");
    let opts = options(&["m:f/1$arg0"], &["m:f/1$ret"], &[], &results_dir);

    let coverage = ltex::run_pipeline(&opts, &summaries, &descriptions).unwrap();
    assert!(coverage.empty_sources.is_empty());
    assert!(coverage.empty_sinks.is_empty());

    let report_path = results_dir.join("m__f__1.json");
    assert!(report_path.exists());
    let report: serde_json::Value =
        serde_json::from_slice(&fs::read(report_path).unwrap()).unwrap();
    assert_eq!(report["graph"]["edges"].as_array().unwrap().len(), 2);
}

#[test]
fn sanitizer_pruning_removes_the_summary_edge_from_the_report() {
    let workdir = tempfile::tempdir().unwrap();
    let summaries = JsonSummaryStore::new(workdir.path().join("summaries"));
    let sanitizer = ProcedureId::new("m", "san", 1);

    let mut f = LineageGraph::new();
    f.add_edge(
        &Vertex::Argument(0, empty_field_path()),
        &Vertex::Return(empty_field_path()),
        EdgeKind::Direct,
    );
    f.add_edge(
        &Vertex::Argument(0, empty_field_path()),
        &Vertex::Return(empty_field_path()),
        EdgeKind::Summary {
            callee: sanitizer.clone(),
        },
    );
    summaries
        .put(
            &ProcedureId::new("m", "f", 1),
            DependencySet {
                callees: vec![],
                complete: true,
            },
            None,
            &f,
        )
        .unwrap();

    let descriptions = description_store(&[("m:f/1", "passthrough")]);
    let results_dir = workdir.path().join("results");
    let opts = options(
        &["m:f/1$arg0"],
        &["m:f/1$ret"],
        &["m:san/1"],
        &results_dir,
    );

    ltex::run_pipeline(&opts, &summaries, &descriptions).unwrap();

    let report: serde_json::Value =
        serde_json::from_slice(&fs::read(results_dir.join("m__f__1.json")).unwrap()).unwrap();
    assert_eq!(report["graph"]["edges"].as_array().unwrap().len(), 1);
}

#[test]
fn unknown_sink_procedure_produces_no_report_and_no_error() {
    let workdir = tempfile::tempdir().unwrap();
    let summaries = JsonSummaryStore::new(workdir.path().join("summaries"));
    let descriptions = description_store(&[]);
    let results_dir = workdir.path().join("results");
    let opts = options(&["m:f/1$arg0"], &["m:ghost/1$ret"], &[], &results_dir);

    ltex::run_pipeline(&opts, &summaries, &descriptions).unwrap();
    assert!(!results_dir.exists() || fs::read_dir(&results_dir).unwrap().next().is_none());
}

#[test]
fn repeated_runs_produce_byte_identical_reports() {
    let workdir = tempfile::tempdir().unwrap();
    let summaries = JsonSummaryStore::new(workdir.path().join("summaries"));

    let mut f = LineageGraph::new();
    f.add_edge(
        &Vertex::Argument(0, empty_field_path()),
        &Vertex::Return(empty_field_path()),
        EdgeKind::Direct,
    );
    summaries
        .put(
            &ProcedureId::new("m", "f", 1),
            DependencySet {
                callees: vec![],
                complete: true,
            },
            None,
            &f,
        )
        .unwrap();
    let descriptions = description_store(&[("m:f/1", "passthrough")]);

    let first_dir = workdir.path().join("first");
    let second_dir = workdir.path().join("second");
    let opts_first = options(&["m:f/1$arg0"], &["m:f/1$ret"], &[], &first_dir);
    let opts_second = options(&["m:f/1$arg0"], &["m:f/1$ret"], &[], &second_dir);

    ltex::run_pipeline(&opts_first, &summaries, &descriptions).unwrap();
    ltex::run_pipeline(&opts_second, &summaries, &descriptions).unwrap();

    let first_bytes = fs::read(first_dir.join("m__f__1.json")).unwrap();
    let second_bytes = fs::read(second_dir.join("m__f__1.json")).unwrap();
    assert_eq!(first_bytes, second_bytes);
}

#[test]
fn missing_description_for_a_non_empty_subgraph_is_a_fatal_error() {
    let workdir = tempfile::tempdir().unwrap();
    let summaries = JsonSummaryStore::new(workdir.path().join("summaries"));

    let mut f = LineageGraph::new();
    f.add_edge(
        &Vertex::Argument(0, empty_field_path()),
        &Vertex::Return(empty_field_path()),
        EdgeKind::Direct,
    );
    summaries
        .put(
            &ProcedureId::new("m", "f", 1),
            DependencySet {
                callees: vec![],
                complete: true,
            },
            None,
            &f,
        )
        .unwrap();

    let descriptions = description_store(&[]);
    let results_dir = workdir.path().join("results");
    let opts = options(&["m:f/1$arg0"], &["m:f/1$ret"], &[], &results_dir);

    let err = ltex::run_pipeline(&opts, &summaries, &descriptions).unwrap_err();
    assert!(matches!(err, ltex::LtexError::MissingProcedureDescription { .. }));
}
