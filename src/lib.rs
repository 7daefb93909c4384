// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! An interprocedural taint-flow extractor over a persisted lineage graph.
//!
//! Control flow: Node Parser -> Caller Index (built once) -> Forward
//! Reachability ({source}) -> Backward Coreachability ({sink}, restricted)
//! -> Graph Reporter.

pub mod caller_index;
pub mod coreachability;
pub mod error;
pub mod expand;
pub mod graph;
pub mod node;
pub mod options;
pub mod procedure;
pub mod reachability;
pub mod report;
pub mod store;
pub mod util;

pub use error::{LtexError, Result};

use std::collections::HashSet;
use std::path::Path;

use node::{parse_endpoint, parse_sanitizer, Node};
use options::AnalysisOptions;
use store::{DescriptionStore, SummaryStore};

/// Endpoints that resolved to zero vertices in their named procedure. A
/// typo'd endpoint produces an empty result indistinguishable from "no
/// flow exists"; surfacing this lets a host warn the user instead.
#[derive(Debug, Default)]
pub struct EndpointCoverage {
    pub empty_sources: Vec<String>,
    pub empty_sinks: Vec<String>,
}

/// Runs the full pipeline for one query: parses endpoints, builds the
/// caller index, runs both reachability phases, and reports the result.
pub fn run_pipeline(
    options: &AnalysisOptions,
    summaries: &dyn SummaryStore,
    descriptions: &dyn DescriptionStore,
) -> Result<EndpointCoverage> {
    let sources: Vec<Node> = options
        .source
        .iter()
        .map(|literal| parse_endpoint(literal))
        .collect::<Result<_>>()?;
    let sinks: Vec<Node> = options
        .sink
        .iter()
        .map(|literal| parse_endpoint(literal))
        .collect::<Result<_>>()?;
    let sanitizers: HashSet<_> = options
        .sanitizer
        .iter()
        .map(|literal| parse_sanitizer(literal))
        .collect::<Result<_>>()?;

    let callers = caller_index::CallerIndex::build(summaries)?;
    let reachable = reachability::run(
        summaries,
        &callers,
        &sanitizers,
        &sources,
        options.lineage_limit,
    );
    let coreachable = coreachability::run(summaries, &callers, &reachable, &sinks);

    let results_dir = Path::new(&options.results_dir);
    report::report(descriptions, &coreachable, results_dir)?;
    if options.dump_reachable {
        report::report(descriptions, &reachable, &results_dir.join("reachable"))?;
    }

    Ok(EndpointCoverage {
        empty_sources: endpoints_without_vertices(&options.source, &sources, summaries),
        empty_sinks: endpoints_without_vertices(&options.sink, &sinks, summaries),
    })
}

fn endpoints_without_vertices(
    literals: &[String],
    nodes: &[Node],
    summaries: &dyn SummaryStore,
) -> Vec<String> {
    literals
        .iter()
        .zip(nodes.iter())
        .filter(|(_, node)| {
            let summary = summaries.load(&node.procedure);
            let shape = summary.as_ref().and_then(|s| s.shape.as_deref());
            expand::expand(&node.locator, shape).is_empty()
        })
        .map(|(literal, _)| literal.clone())
        .collect()
}
