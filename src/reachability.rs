// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! Forward Reachability Engine: the two-phase (follow-return
//! enabled/disabled) worklist that computes, per procedure, the subgraph of
//! edges reachable from the sources while respecting the realizability
//! rule. Grounded on `pta/propagator/propagator.rs`'s `solve_worklist`
//! (drain-primary-then-secondary loop).

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use crate::caller_index::CallerIndex;
use crate::expand::expand;
use crate::graph::{LineageGraph, Vertex};
use crate::node::{Locator, Node};
use crate::procedure::ProcedureId;
use crate::store::SummaryStore;

#[derive(Default)]
struct ProcedureState {
    accumulator: LineageGraph,
    visited: HashSet<Vertex>,
}

/// Per-procedure accumulated subgraphs reachable from the sources, ordered
/// by `ProcedureId` so downstream reporting iterates deterministically.
pub type ReachableMap = BTreeMap<ProcedureId, LineageGraph>;

/// Runs the forward reachability phase to a fixpoint.
///
/// `edge_budget`, if set, is a single counter shared across the whole run
/// (both phases); once it reaches zero, further edges are silently
/// omitted rather than recorded.
pub fn run(
    store: &dyn SummaryStore,
    callers: &CallerIndex,
    sanitizers: &HashSet<ProcedureId>,
    sources: &[Node],
    edge_budget: Option<u64>,
) -> ReachableMap {
    let mut primary: VecDeque<Node> = sources.iter().cloned().collect();
    let mut deferred: VecDeque<Node> = VecDeque::new();
    let mut flipped = false;
    let mut remaining_budget = edge_budget;
    let mut states: HashMap<ProcedureId, ProcedureState> = HashMap::new();

    loop {
        let node = match primary.pop_front() {
            Some(node) => node,
            None => {
                if !flipped && !deferred.is_empty() {
                    primary = std::mem::take(&mut deferred);
                    flipped = true;
                    continue;
                }
                break;
            }
        };

        if sanitizers.contains(&node.procedure) {
            continue;
        }

        process_node(
            store,
            callers,
            sanitizers,
            &node,
            flipped,
            &mut remaining_budget,
            &mut states,
            &mut primary,
            &mut deferred,
        );
    }

    states
        .into_iter()
        .map(|(procedure, state)| (procedure, state.accumulator))
        .collect()
}

#[allow(clippy::too_many_arguments)]
fn process_node(
    store: &dyn SummaryStore,
    callers: &CallerIndex,
    sanitizers: &HashSet<ProcedureId>,
    node: &Node,
    flipped: bool,
    remaining_budget: &mut Option<u64>,
    states: &mut HashMap<ProcedureId, ProcedureState>,
    primary: &mut VecDeque<Node>,
    deferred: &mut VecDeque<Node>,
) {
    let summary = store.load(&node.procedure);
    let shape = summary.as_ref().and_then(|s| s.shape.as_deref());
    let v0 = expand(&node.locator, shape);

    let state = states.entry(node.procedure.clone()).or_default();
    let mut stack: Vec<Vertex> = Vec::new();
    for vertex in v0 {
        if state.visited.insert(vertex.clone()) {
            enqueue_continuations(&vertex, &node.procedure, callers, flipped, primary, deferred);
            stack.push(vertex);
        }
    }

    let Some(summary) = summary else { return };

    while let Some(vertex) = stack.pop() {
        let Some(vertex_id) = summary.lineage.index_of(&vertex) else {
            continue;
        };
        let successors: Vec<_> = summary
            .lineage
            .successors(vertex_id)
            .map(|(id, kind)| (id, kind.clone()))
            .collect();
        for (target_id, kind) in successors {
            if let Some(sanitizer) = kind.summary_callee() {
                if sanitizers.contains(sanitizer) {
                    continue;
                }
            }
            if matches!(remaining_budget, Some(0)) {
                continue;
            }
            let target = summary.lineage.vertex(target_id).clone();
            let is_new_edge = state.accumulator.add_edge(&vertex, &target, kind);
            if is_new_edge {
                if let Some(remaining) = remaining_budget.as_mut() {
                    *remaining -= 1;
                }
            }
            if state.visited.insert(target.clone()) {
                enqueue_continuations(&target, &node.procedure, callers, flipped, primary, deferred);
                stack.push(target);
            }
        }
    }
}

fn enqueue_continuations(
    vertex: &Vertex,
    owner: &ProcedureId,
    callers: &CallerIndex,
    flipped: bool,
    primary: &mut VecDeque<Node>,
    deferred: &mut VecDeque<Node>,
) {
    match vertex {
        Vertex::Return(fp) if !flipped => {
            for caller in callers.callers_of(owner) {
                primary.push_back(Node::new(
                    caller.clone(),
                    Locator::ReturnOf(owner.clone(), fp.clone()),
                ));
            }
        }
        Vertex::ArgumentOf(callee, index, fp) => {
            let node = Node::new(callee.clone(), Locator::Argument(*index, fp.clone()));
            if flipped {
                primary.push_back(node);
            } else {
                deferred.push_back(node);
            }
        }
        _ => {}
    }
}
