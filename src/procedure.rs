// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! Procedure identifiers and field paths.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An opaque, totally-ordered, hashable identifier for a procedure.
///
/// Surface syntax describes a procedure as `(module, function, arity)`; an
/// empty module denotes the default module. Ordering is lexicographic over
/// the triple, which gives the reporter a stable, deterministic iteration
/// order without a side index.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct ProcedureId {
    pub module: String,
    pub function: String,
    pub arity: u32,
}

impl ProcedureId {
    pub fn new(module: impl Into<String>, function: impl Into<String>, arity: u32) -> Self {
        ProcedureId {
            module: module.into(),
            function: function.into(),
            arity,
        }
    }
}

impl fmt::Display for ProcedureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.module.is_empty() {
            write!(f, "{}/{}", self.function, self.arity)
        } else {
            write!(f, "{}:{}/{}", self.module, self.function, self.arity)
        }
    }
}

/// A single record-field selector. Opaque to the core: expansion over field
/// paths is delegated to the shape summary.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct Selector(pub String);

/// An ordered sequence of field selectors applied to a base location. The
/// empty sequence denotes the whole value.
pub type FieldPath = Vec<Selector>;

pub fn empty_field_path() -> FieldPath {
    Vec::new()
}

/// A filesystem-safe file stem for `procedure`. The node grammar restricts
/// module/function names to `[A-Za-z0-9_]+`, so no escaping beyond the `__`
/// separator is needed.
pub fn file_stem(procedure: &ProcedureId) -> String {
    let module = if procedure.module.is_empty() {
        "_"
    } else {
        procedure.module.as_str()
    };
    format!("{module}__{}__{}", procedure.function, procedure.arity)
}
