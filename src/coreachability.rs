// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! Backward Coreachability Engine: a single-phase backward worklist
//! restricted to the forward reachable map. Grounded on the same
//! `Propagator` worklist shape as `reachability.rs`, mirrored for backward
//! traversal; missing-procedure tolerance follows `graph/pag.rs`'s
//! `Option`-returning, non-panicking node lookup idiom.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use crate::caller_index::CallerIndex;
use crate::expand::expand;
use crate::graph::{LineageGraph, Vertex};
use crate::node::{Locator, Node};
use crate::procedure::ProcedureId;
use crate::reachability::ReachableMap;
use crate::store::SummaryStore;

#[derive(Default)]
struct ProcedureState {
    accumulator: LineageGraph,
    visited: HashSet<Vertex>,
}

pub type CoreachableMap = BTreeMap<ProcedureId, LineageGraph>;

/// Runs the backward coreachability phase to a fixpoint, restricted to
/// vertices present in `reachable`.
pub fn run(
    store: &dyn SummaryStore,
    callers: &CallerIndex,
    reachable: &ReachableMap,
    sinks: &[Node],
) -> CoreachableMap {
    let mut primary: VecDeque<Node> = sinks.iter().cloned().collect();
    let mut states: HashMap<ProcedureId, ProcedureState> = HashMap::new();

    while let Some(node) = primary.pop_front() {
        let Some(reach_graph) = reachable.get(&node.procedure) else {
            // Missing-procedure tolerance: a caller that does not
            // itself reach the source has nothing to coreach within it.
            continue;
        };

        let summary = store.load(&node.procedure);
        let shape = summary.as_ref().and_then(|s| s.shape.as_deref());
        let v0 = expand(&node.locator, shape);

        let state = states.entry(node.procedure.clone()).or_default();
        let mut stack: Vec<Vertex> = Vec::new();
        for vertex in v0 {
            if reach_graph.index_of(&vertex).is_none() {
                continue;
            }
            if state.visited.insert(vertex.clone()) {
                enqueue_continuations(&vertex, &node.procedure, callers, &mut primary);
                stack.push(vertex);
            }
        }

        while let Some(vertex) = stack.pop() {
            let Some(vertex_id) = reach_graph.index_of(&vertex) else {
                continue;
            };
            let predecessors: Vec<_> = reach_graph
                .predecessors(vertex_id)
                .map(|(id, kind)| (id, kind.clone()))
                .collect();
            for (source_id, kind) in predecessors {
                let source = reach_graph.vertex(source_id).clone();
                state.accumulator.add_edge(&source, &vertex, kind);
                if state.visited.insert(source.clone()) {
                    enqueue_continuations(&source, &node.procedure, callers, &mut primary);
                    stack.push(source);
                }
            }
        }
    }

    states
        .into_iter()
        .map(|(procedure, state)| (procedure, state.accumulator))
        .collect()
}

fn enqueue_continuations(
    vertex: &Vertex,
    owner: &ProcedureId,
    callers: &CallerIndex,
    primary: &mut VecDeque<Node>,
) {
    match vertex {
        Vertex::Argument(index, fp) => {
            for caller in callers.callers_of(owner) {
                primary.push_back(Node::new(
                    caller.clone(),
                    Locator::ArgumentOf(owner.clone(), *index, fp.clone()),
                ));
            }
        }
        Vertex::ReturnOf(callee, fp) => {
            primary.push_back(Node::new(callee.clone(), Locator::Return(fp.clone())));
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::EdgeKind;
    use crate::procedure::empty_field_path;
    use crate::reachability;
    use crate::store::{DependencySet, Summary};
    use std::cell::RefCell;

    struct FixtureStore(RefCell<HashMap<ProcedureId, (DependencySet, LineageGraph)>>);

    impl FixtureStore {
        fn new() -> Self {
            FixtureStore(RefCell::new(HashMap::new()))
        }

        fn insert(&self, procedure: ProcedureId, callees: Vec<ProcedureId>, lineage: LineageGraph) {
            self.0.borrow_mut().insert(
                procedure,
                (
                    DependencySet {
                        callees,
                        complete: true,
                    },
                    lineage,
                ),
            );
        }
    }

    impl SummaryStore for FixtureStore {
        fn load(&self, procedure: &ProcedureId) -> Option<Summary> {
            let table = self.0.borrow();
            let (dependencies, lineage) = table.get(procedure)?;
            Some(Summary {
                dependencies: dependencies.clone(),
                shape: None,
                lineage: lineage.clone(),
            })
        }

        fn iterate(&self) -> Vec<(ProcedureId, DependencySet)> {
            self.0
                .borrow()
                .iter()
                .map(|(p, (d, _))| (p.clone(), d.clone()))
                .collect()
        }
    }

    fn pid(name: &str) -> ProcedureId {
        ProcedureId::new("m", name, 1)
    }

    fn fp() -> crate::procedure::FieldPath {
        empty_field_path()
    }

    #[test]
    fn s1_coreachable_equals_reachable_for_a_straight_line() {
        let store = FixtureStore::new();
        let mut f = LineageGraph::new();
        f.add_edge(&Vertex::Argument(0, fp()), &Vertex::Local("x".into(), fp()), EdgeKind::Direct);
        f.add_edge(&Vertex::Local("x".into(), fp()), &Vertex::Return(fp()), EdgeKind::Direct);
        store.insert(pid("f"), vec![], f);

        let callers = CallerIndex::build(&store).unwrap();
        let sources = vec![Node::new(pid("f"), Locator::Argument(0, fp()))];
        let reachable = reachability::run(&store, &callers, &HashSet::new(), &sources, None);

        let sinks = vec![Node::new(pid("f"), Locator::Return(fp()))];
        let coreachable = run(&store, &callers, &reachable, &sinks);

        assert_eq!(coreachable[&pid("f")].edge_count(), 2);
        assert_eq!(coreachable[&pid("f")].edge_count(), reachable[&pid("f")].edge_count());
    }

    #[test]
    fn s3_coreachability_crosses_the_call_boundary_via_a_summary_edge() {
        // A bare Call/Return pair (no Summary edge) can never seed g's own
        // Return vertex in the reachable map: crossing into f is always
        // deferred to the post-flip phase, so f's Return never re-enqueues a
        // ReturnOf continuation into g (see s3_interprocedural_with_return
        // in reachability.rs). The cross-boundary case that coreachability
        // can actually restrict against is the Summary edge, which stands in
        // for an already-matched call/return pair and lives entirely within
        // the caller's own graph.
        let store = FixtureStore::new();
        let callee = pid("f");
        let mut f = LineageGraph::new();
        f.add_edge(&Vertex::Argument(0, fp()), &Vertex::Local("x".into(), fp()), EdgeKind::Direct);
        f.add_edge(&Vertex::Local("x".into(), fp()), &Vertex::Return(fp()), EdgeKind::Direct);
        store.insert(callee.clone(), vec![], f);

        let mut g = LineageGraph::new();
        g.add_edge(
            &Vertex::Argument(0, fp()),
            &Vertex::Return(fp()),
            EdgeKind::Summary { callee: callee.clone() },
        );
        store.insert(pid("g"), vec![callee], g);

        let callers = CallerIndex::build(&store).unwrap();
        let sources = vec![Node::new(pid("g"), Locator::Argument(0, fp()))];
        let reachable = reachability::run(&store, &callers, &HashSet::new(), &sources, None);

        let sinks = vec![Node::new(pid("g"), Locator::Return(fp()))];
        let coreachable = run(&store, &callers, &reachable, &sinks);

        assert_eq!(coreachable[&pid("g")].edge_count(), 1);
        assert!(!coreachable.contains_key(&pid("f")));
    }

    #[test]
    fn s3_bare_call_return_does_not_seed_the_callers_sink_vertex() {
        let store = FixtureStore::new();
        let mut f = LineageGraph::new();
        f.add_edge(&Vertex::Argument(0, fp()), &Vertex::Local("x".into(), fp()), EdgeKind::Direct);
        f.add_edge(&Vertex::Local("x".into(), fp()), &Vertex::Return(fp()), EdgeKind::Direct);
        store.insert(pid("f"), vec![], f);

        let mut g = LineageGraph::new();
        g.add_edge(
            &Vertex::Argument(0, fp()),
            &Vertex::ArgumentOf(pid("f"), 0, fp()),
            EdgeKind::Call,
        );
        g.add_edge(
            &Vertex::ReturnOf(pid("f"), fp()),
            &Vertex::Return(fp()),
            EdgeKind::Return,
        );
        store.insert(pid("g"), vec![pid("f")], g);

        let callers = CallerIndex::build(&store).unwrap();
        let sources = vec![Node::new(pid("g"), Locator::Argument(0, fp()))];
        let reachable = reachability::run(&store, &callers, &HashSet::new(), &sources, None);

        let sinks = vec![Node::new(pid("g"), Locator::Return(fp()))];
        let coreachable = run(&store, &callers, &reachable, &sinks);

        // g's Return vertex was never reached by the forward phase (see
        // s3_interprocedural_with_return), so it can't seed the backward
        // walk either; only the (empty) entry for g itself is produced.
        assert_eq!(coreachable.len(), 1);
        assert_eq!(coreachable[&pid("g")].edge_count(), 0);
        assert!(!coreachable.contains_key(&pid("f")));
    }

    #[test]
    fn s5_unknown_sink_procedure_yields_an_empty_coreachable_map() {
        let store = FixtureStore::new();
        let callers = CallerIndex::build(&store).unwrap();
        let reachable = ReachableMap::new();
        let sinks = vec![Node::new(pid("ghost"), Locator::Return(fp()))];
        let coreachable = run(&store, &callers, &reachable, &sinks);
        assert!(coreachable.is_empty());
    }

    #[test]
    fn every_coreachable_edge_is_also_reachable() {
        let store = FixtureStore::new();
        let san = pid("san");
        let mut f = LineageGraph::new();
        f.add_edge(&Vertex::Argument(0, fp()), &Vertex::Local("x".into(), fp()), EdgeKind::Direct);
        f.add_edge(&Vertex::Local("x".into(), fp()), &Vertex::Return(fp()), EdgeKind::Direct);
        f.add_edge(
            &Vertex::Argument(0, fp()),
            &Vertex::Return(fp()),
            EdgeKind::Summary { callee: san.clone() },
        );
        store.insert(pid("f"), vec![], f);

        let callers = CallerIndex::build(&store).unwrap();
        let mut sanitizers = HashSet::new();
        sanitizers.insert(san);
        let sources = vec![Node::new(pid("f"), Locator::Argument(0, fp()))];
        let reachable = reachability::run(&store, &callers, &sanitizers, &sources, None);

        let sinks = vec![Node::new(pid("f"), Locator::Return(fp()))];
        let coreachable = run(&store, &callers, &reachable, &sinks);

        let reach_graph = &reachable[&pid("f")];
        let core_graph = &coreachable[&pid("f")];
        for (id, vertex) in core_graph.vertices() {
            for (target_id, kind) in core_graph.successors(id) {
                let target = core_graph.vertex(target_id);
                assert!(reach_graph.has_edge(vertex, target, kind));
            }
        }
    }
}
