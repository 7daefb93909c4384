// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! Tagged vertex and edge-kind variants for the per-procedure lineage graph
//! Grounded on `graph/pag.rs`'s `PAGEdgeEnum`: a small closed sum type,
//! pattern-matched exhaustively everywhere it's consumed so that adding a
//! variant forces every site to be revisited.

use serde::{Deserialize, Serialize};

use crate::procedure::{FieldPath, ProcedureId};

#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Vertex {
    /// A local storage location within the procedure.
    Local(String, FieldPath),
    /// The index-th formal parameter (or subfield).
    Argument(usize, FieldPath),
    /// The formal return (or subfield).
    Return(FieldPath),
    /// A callsite-materialized actual at an outgoing call.
    ArgumentOf(ProcedureId, usize, FieldPath),
    /// A callsite-materialized return at an outgoing call.
    ReturnOf(ProcedureId, FieldPath),
    /// A closure capture.
    Captured(usize),
    /// A callsite-materialized capture at an outgoing call.
    CapturedBy(ProcedureId, usize),
    /// The distinguished `self` node.
    SelfValue,
    /// A distinguished node naming a procedure as a value.
    Function(ProcedureId),
}

#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    /// In-procedure data movement.
    Direct,
    /// Formal-to-actual crossing into a callee.
    Call,
    /// Callee-formal-to-caller crossing out of a callee.
    Return,
    /// Closure-capture movement.
    Capture,
    /// A pre-matched call/return pair elided into one intra-procedural edge.
    Summary { callee: ProcedureId },
    /// An opaque call-like edge to a builtin.
    Builtin,
    /// An opaque call-like edge resolved dynamically by function value.
    DynamicCallFunction,
    /// An opaque call-like edge resolved dynamically by module value.
    DynamicCallModule,
}

impl EdgeKind {
    /// Returns the sanitizer procedure this edge stands in for, if any.
    pub fn summary_callee(&self) -> Option<&ProcedureId> {
        match self {
            EdgeKind::Summary { callee } => Some(callee),
            _ => None,
        }
    }

    pub fn is_call(&self) -> bool {
        matches!(self, EdgeKind::Call)
    }

    pub fn is_return(&self) -> bool {
        matches!(self, EdgeKind::Return)
    }
}
