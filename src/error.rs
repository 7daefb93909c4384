// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! The core's error surface.

use thiserror::Error;

use crate::procedure::ProcedureId;

#[derive(Debug, Error)]
pub enum LtexError {
    /// A source/sink/sanitizer string deviated from the endpoint grammar.
    #[error("malformed endpoint descriptor: {literal:?}")]
    BadEndpoint { literal: String },

    /// A summary's dependency set was marked partial/incomplete while
    /// building the caller index.
    #[error("summary for {procedure} has an incomplete dependency set")]
    CorruptSummary { procedure: ProcedureId },

    /// A non-empty subgraph was produced for a procedure the description
    /// store could not resolve.
    #[error("no description available for {procedure}, which has a non-empty taint subgraph")]
    MissingProcedureDescription { procedure: ProcedureId },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LtexError>;
