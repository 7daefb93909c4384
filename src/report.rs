// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! Graph Reporter: resolves each procedure's subgraph to a
//! description and emits it to the results directory. Grounded on
//! `util/results_dumper.rs`'s `dump_ci_pts`/`dump_call_graph`
//! (group-by-procedure iteration, file-per-procedure `BufWriter` dumping),
//! with `expect`-on-I/O-error replaced by a propagated `Result` since the
//! reporter can legitimately fail.

use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::error::{LtexError, Result};
use crate::graph::LineageGraphSnapshot;
use crate::procedure::{file_stem, ProcedureId};
use crate::reachability::ReachableMap;
use crate::store::DescriptionStore;

#[derive(Debug, Serialize)]
struct ProcedureReport {
    procedure: ProcedureId,
    description: String,
    graph: LineageGraphSnapshot,
}

/// Emits one JSON document per non-empty procedure in `map` under `dir`,
/// creating the directory if absent. Procedures with an empty subgraph and
/// no resolvable description are skipped silently; a non-empty
/// subgraph with no resolvable description is a fatal `MissingProcedureDescription`.
pub fn report(
    descriptions: &dyn DescriptionStore,
    map: &ReachableMap,
    dir: &Path,
) -> Result<()> {
    if map.is_empty() {
        return Ok(());
    }
    fs::create_dir_all(dir)?;
    for (procedure, graph) in map {
        let description = descriptions.resolve(procedure);
        let description = match description {
            Some(description) => description,
            None if graph.is_empty() => continue,
            None => {
                return Err(LtexError::MissingProcedureDescription {
                    procedure: procedure.clone(),
                });
            }
        };
        let report = ProcedureReport {
            procedure: procedure.clone(),
            description,
            graph: LineageGraphSnapshot::from(graph),
        };
        let path = dir.join(format!("{}.json", file_stem(procedure)));
        let bytes = serde_json::to_vec_pretty(&report)?;
        fs::write(path, bytes)?;
    }
    Ok(())
}
