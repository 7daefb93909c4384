// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! Caller Index: a one-pass inversion of the call relation, built
//! once from a summary store and read-only thereafter. Grounded on
//! `graph/call_graph.rs`'s single-pass builder idiom, simplified from a
//! graph to a plain multimap, since only caller lists are needed here.

use std::collections::HashMap;

use crate::error::{LtexError, Result};
use crate::procedure::ProcedureId;
use crate::store::SummaryStore;

/// Inverse of the call relation: procedure -> its known callers, in the
/// order scanned. A callee may appear multiple times for one caller; a
/// missing key denotes "no known callers recorded".
#[derive(Clone, Debug, Default)]
pub struct CallerIndex {
    callers: HashMap<ProcedureId, Vec<ProcedureId>>,
}

impl CallerIndex {
    /// Scans `store.iterate()` once, failing with `CorruptSummary` on the
    /// first procedure whose declared dependency set is marked partial.
    pub fn build(store: &dyn SummaryStore) -> Result<Self> {
        let mut callers: HashMap<ProcedureId, Vec<ProcedureId>> = HashMap::new();
        for (owner, dependencies) in store.iterate() {
            if !dependencies.complete {
                return Err(LtexError::CorruptSummary { procedure: owner });
            }
            for dependency in dependencies.callees {
                callers.entry(dependency).or_default().push(owner.clone());
            }
        }
        Ok(CallerIndex { callers })
    }

    /// Direct callers of `procedure`, in scan order. Empty when none are
    /// recorded; duplicates are preserved and iterated tolerantly.
    pub fn callers_of(&self, procedure: &ProcedureId) -> &[ProcedureId] {
        self.callers
            .get(procedure)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
