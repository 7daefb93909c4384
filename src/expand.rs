// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! Node→Vertex Expander: expands a locator into the concrete
//! vertices it denotes in the named procedure's graph, using shape
//! information when available. Grounded on the "insert if absent,
//! otherwise reuse" idiom of `graph/pag.rs`'s `get_or_insert_node`, applied
//! here to the shape-absent fallback rather than to graph insertion.

use crate::graph::Vertex;
use crate::node::Locator;
use crate::store::ShapeSummary;

/// Enumerates the vertices a locator denotes in its procedure's graph. Pure
/// and total: never fails, even when `shape` is `None`.
pub fn expand(locator: &Locator, shape: Option<&dyn ShapeSummary>) -> Vec<Vertex> {
    match (locator, shape) {
        (Locator::Return(fp), Some(shape)) => shape
            .map_return(fp)
            .into_iter()
            .map(Vertex::Return)
            .collect(),
        (Locator::Return(fp), None) => vec![Vertex::Return(fp.clone())],

        (Locator::Argument(index, fp), Some(shape)) => shape
            .map_argument(*index, fp)
            .into_iter()
            .map(|fp| Vertex::Argument(*index, fp))
            .collect(),
        (Locator::Argument(index, fp), None) => vec![Vertex::Argument(*index, fp.clone())],

        (Locator::ReturnOf(callee, fp), Some(shape)) => shape
            .map_return_of(callee, fp)
            .into_iter()
            .map(|fp| Vertex::ReturnOf(callee.clone(), fp))
            .collect(),
        (Locator::ReturnOf(callee, fp), None) => {
            vec![Vertex::ReturnOf(callee.clone(), fp.clone())]
        }

        (Locator::ArgumentOf(callee, index, fp), Some(shape)) => shape
            .map_argument_of(callee, *index, fp)
            .into_iter()
            .map(|fp| Vertex::ArgumentOf(callee.clone(), *index, fp))
            .collect(),
        (Locator::ArgumentOf(callee, index, fp), None) => {
            vec![Vertex::ArgumentOf(callee.clone(), *index, fp.clone())]
        }
    }
}
