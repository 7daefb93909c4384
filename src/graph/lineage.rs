// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! The per-procedure lineage graph. Grounded on `graph/pag.rs`'s
//! `PAG<P>`: a `petgraph::Graph` wrapped with a value-to-index map so
//! vertices are addressed by value rather than by index, and with
//! dedup-on-insert edges so a worklist can add the same edge from two
//! different propagation rounds without inflating the graph.

use std::collections::HashMap;

use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use petgraph::{Directed, Graph};
use serde::{Deserialize, Serialize};

use super::vertex::{EdgeKind, Vertex};

#[derive(Clone, Debug, Default)]
pub struct LineageGraph {
    graph: Graph<Vertex, EdgeKind, Directed>,
    index: HashMap<Vertex, NodeIndex>,
}

impl LineageGraph {
    pub fn new() -> Self {
        LineageGraph {
            graph: Graph::new(),
            index: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Returns the node index for `vertex`, inserting it if absent.
    pub fn get_or_insert(&mut self, vertex: &Vertex) -> NodeIndex {
        if let Some(&id) = self.index.get(vertex) {
            return id;
        }
        let id = self.graph.add_node(vertex.clone());
        self.index.insert(vertex.clone(), id);
        id
    }

    /// Returns the node index for `vertex` if it has already been inserted.
    pub fn index_of(&self, vertex: &Vertex) -> Option<NodeIndex> {
        self.index.get(vertex).copied()
    }

    pub fn vertex(&self, id: NodeIndex) -> &Vertex {
        &self.graph[id]
    }

    pub fn vertices(&self) -> impl Iterator<Item = (NodeIndex, &Vertex)> {
        self.graph
            .node_indices()
            .map(move |id| (id, &self.graph[id]))
    }

    /// Adds `src --kind--> dst`, first inserting either endpoint that is
    /// missing. Returns `false` when an identical edge (same endpoints and
    /// kind) already exists.
    pub fn add_edge(&mut self, src: &Vertex, dst: &Vertex, kind: EdgeKind) -> bool {
        let src_id = self.get_or_insert(src);
        let dst_id = self.get_or_insert(dst);
        self.add_edge_by_index(src_id, dst_id, kind)
    }

    pub fn add_edge_by_index(&mut self, src: NodeIndex, dst: NodeIndex, kind: EdgeKind) -> bool {
        let exists = self
            .graph
            .edges(src)
            .any(|edge| edge.target() == dst && *edge.weight() == kind);
        if exists {
            return false;
        }
        self.graph.add_edge(src, dst, kind);
        true
    }

    pub fn successors(&self, id: NodeIndex) -> impl Iterator<Item = (NodeIndex, &EdgeKind)> {
        self.graph
            .edges(id)
            .map(|edge| (edge.target(), edge.weight()))
    }

    pub fn predecessors(&self, id: NodeIndex) -> impl Iterator<Item = (NodeIndex, &EdgeKind)> {
        use petgraph::Direction::Incoming;
        self.graph
            .edges_directed(id, Incoming)
            .map(|edge| (edge.source(), edge.weight()))
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    #[cfg(test)]
    pub fn has_edge(&self, src: &Vertex, dst: &Vertex, kind: &EdgeKind) -> bool {
        let (Some(src_id), Some(dst_id)) = (self.index_of(src), self.index_of(dst)) else {
            return false;
        };
        self.graph
            .edges(src_id)
            .any(|edge| edge.target() == dst_id && edge.weight() == kind)
    }
}

/// A stable, serializable view of a `LineageGraph` keyed by vertex value
/// rather than `NodeIndex`, used by the Graph Reporter's JSON output.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LineageGraphSnapshot {
    pub vertices: Vec<Vertex>,
    pub edges: Vec<(usize, usize, EdgeKind)>,
}

impl From<&LineageGraphSnapshot> for LineageGraph {
    fn from(snapshot: &LineageGraphSnapshot) -> Self {
        let mut graph = LineageGraph::new();
        let ids: Vec<NodeIndex> = snapshot
            .vertices
            .iter()
            .map(|vertex| graph.get_or_insert(vertex))
            .collect();
        for (src, dst, kind) in &snapshot.edges {
            graph.add_edge_by_index(ids[*src], ids[*dst], kind.clone());
        }
        graph
    }
}

impl From<&LineageGraph> for LineageGraphSnapshot {
    fn from(graph: &LineageGraph) -> Self {
        let mut order: HashMap<NodeIndex, usize> = HashMap::new();
        let mut vertices = Vec::with_capacity(graph.len());
        for (position, (id, vertex)) in graph.vertices().enumerate() {
            order.insert(id, position);
            vertices.push(vertex.clone());
        }
        let mut edges = Vec::new();
        for (id, _) in graph.vertices() {
            for (target, kind) in graph.successors(id) {
                edges.push((order[&id], order[&target], kind.clone()));
            }
        }
        LineageGraphSnapshot { vertices, edges }
    }
}
