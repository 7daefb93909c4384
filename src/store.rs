// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! External interfaces: the summary store, the procedure description
//! store, and shape summaries, plus a JSON-file-backed reference
//! implementation of each. Grounded on `mir/analysis_context.rs`'s role as
//! the seam between the core algorithm and "the rest of the compiler" — here
//! that seam separates the core from "the rest of the lineage subsystem".

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::graph::{LineageGraph, LineageGraphSnapshot};
use crate::procedure::{file_stem, FieldPath, ProcedureId};

/// A procedure's declared dependency set, as read from its persisted
/// summary. `complete` is false when the producer marked the set partial.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DependencySet {
    pub callees: Vec<ProcedureId>,
    pub complete: bool,
}

/// Shape-expansion queries. Each refines a field-path prefix into the
/// finite list of field paths recorded by the summary producer; callers
/// apply the appropriate `Vertex` constructor to each result themselves.
pub trait ShapeSummary {
    fn map_return(&self, fp: &FieldPath) -> Vec<FieldPath>;
    fn map_return_of(&self, callee: &ProcedureId, fp: &FieldPath) -> Vec<FieldPath>;
    fn map_argument(&self, index: usize, fp: &FieldPath) -> Vec<FieldPath>;
    fn map_argument_of(&self, callee: &ProcedureId, index: usize, fp: &FieldPath) -> Vec<FieldPath>;
}

/// A procedure's full persisted payload: its dependency set, its shape
/// summary (if any), and its lineage graph.
pub struct Summary {
    pub dependencies: DependencySet,
    pub shape: Option<Box<dyn ShapeSummary>>,
    pub lineage: LineageGraph,
}

pub trait SummaryStore {
    /// Loads a procedure's full summary, or `None` if nothing is persisted
    /// for it ("missing summary" recovers locally as an empty graph).
    fn load(&self, procedure: &ProcedureId) -> Option<Summary>;

    /// Every known procedure paired with its dependency set, used once to
    /// build the caller index.
    fn iterate(&self) -> Vec<(ProcedureId, DependencySet)>;
}

pub trait DescriptionStore {
    fn resolve(&self, procedure: &ProcedureId) -> Option<String>;
}

/// The on-disk shape of one `map_*` query: a prefix field path paired with
/// the refinements recorded for it. A prefix absent from this list maps to
/// itself unrefined.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct JsonShapeSummary {
    pub returns: Vec<(FieldPath, Vec<FieldPath>)>,
    pub returns_of: Vec<(ProcedureId, FieldPath, Vec<FieldPath>)>,
    pub arguments: Vec<(usize, FieldPath, Vec<FieldPath>)>,
    pub arguments_of: Vec<(ProcedureId, usize, FieldPath, Vec<FieldPath>)>,
}

impl ShapeSummary for JsonShapeSummary {
    fn map_return(&self, fp: &FieldPath) -> Vec<FieldPath> {
        self.returns
            .iter()
            .find(|(prefix, _)| prefix == fp)
            .map(|(_, refinements)| refinements.clone())
            .unwrap_or_else(|| vec![fp.clone()])
    }

    fn map_return_of(&self, callee: &ProcedureId, fp: &FieldPath) -> Vec<FieldPath> {
        self.returns_of
            .iter()
            .find(|(c, prefix, _)| c == callee && prefix == fp)
            .map(|(_, _, refinements)| refinements.clone())
            .unwrap_or_else(|| vec![fp.clone()])
    }

    fn map_argument(&self, index: usize, fp: &FieldPath) -> Vec<FieldPath> {
        self.arguments
            .iter()
            .find(|(i, prefix, _)| *i == index && prefix == fp)
            .map(|(_, _, refinements)| refinements.clone())
            .unwrap_or_else(|| vec![fp.clone()])
    }

    fn map_argument_of(&self, callee: &ProcedureId, index: usize, fp: &FieldPath) -> Vec<FieldPath> {
        self.arguments_of
            .iter()
            .find(|(c, i, prefix, _)| c == callee && *i == index && prefix == fp)
            .map(|(_, _, _, refinements)| refinements.clone())
            .unwrap_or_else(|| vec![fp.clone()])
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct SummaryRecord {
    procedure: ProcedureId,
    dependencies: DependencySet,
    shape: Option<JsonShapeSummary>,
    lineage: LineageGraphSnapshot,
}

/// A summary store backed by one JSON file per procedure in a directory.
pub struct JsonSummaryStore {
    dir: PathBuf,
}

impl JsonSummaryStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        JsonSummaryStore { dir: dir.into() }
    }

    fn record_path(&self, procedure: &ProcedureId) -> PathBuf {
        self.dir.join(format!("{}.json", file_stem(procedure)))
    }

    /// Writes (or overwrites) the persisted summary for `procedure`. Used by
    /// tests and by tooling that seeds a fixture store; not part of the
    /// read-only `SummaryStore` contract.
    pub fn put(
        &self,
        procedure: &ProcedureId,
        dependencies: DependencySet,
        shape: Option<JsonShapeSummary>,
        lineage: &LineageGraph,
    ) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let record = SummaryRecord {
            procedure: procedure.clone(),
            dependencies,
            shape,
            lineage: LineageGraphSnapshot::from(lineage),
        };
        let bytes = serde_json::to_vec_pretty(&record)?;
        fs::write(self.record_path(procedure), bytes)?;
        Ok(())
    }
}

impl SummaryStore for JsonSummaryStore {
    fn load(&self, procedure: &ProcedureId) -> Option<Summary> {
        let bytes = fs::read(self.record_path(procedure)).ok()?;
        let record: SummaryRecord = serde_json::from_slice(&bytes).ok()?;
        Some(Summary {
            dependencies: record.dependencies,
            shape: record
                .shape
                .map(|shape| Box::new(shape) as Box<dyn ShapeSummary>),
            lineage: LineageGraph::from(&record.lineage),
        })
    }

    fn iterate(&self) -> Vec<(ProcedureId, DependencySet)> {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let Ok(bytes) = fs::read(&path) else { continue };
            let Ok(record) = serde_json::from_slice::<SummaryRecord>(&bytes) else {
                continue;
            };
            out.push((record.procedure, record.dependencies));
        }
        out
    }
}

/// A description store backed by a single JSON file mapping a procedure's
/// `Display` form to a human-readable description.
pub struct JsonDescriptionStore {
    descriptions: HashMap<String, String>,
}

impl JsonDescriptionStore {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = fs::read(path)?;
        let descriptions = serde_json::from_slice(&bytes)?;
        Ok(JsonDescriptionStore { descriptions })
    }

    pub fn from_map(descriptions: HashMap<String, String>) -> Self {
        JsonDescriptionStore { descriptions }
    }
}

impl DescriptionStore for JsonDescriptionStore {
    fn resolve(&self, procedure: &ProcedureId) -> Option<String> {
        self.descriptions.get(&procedure.to_string()).cloned()
    }
}
