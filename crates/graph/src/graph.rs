use crate::types::{CallGraph, CallKind, Edge};
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use xref_program::FuncId;

impl CallGraph {
    /// Functions the node calls (outgoing edges)
    pub fn get_callees(&self, node: NodeIndex) -> Vec<NodeIndex> {
        self.graph
            .neighbors_directed(node, Direction::Outgoing)
            .collect()
    }

    /// Functions calling the node (incoming edges)
    pub fn get_callers(&self, node: NodeIndex) -> Vec<NodeIndex> {
        self.graph
            .neighbors_directed(node, Direction::Incoming)
            .collect()
    }

    /// Neighbors of `func` rendered as edges, sorted by (label, path)
    pub fn neighbor_edges(&self, func: FuncId, direction: Direction) -> Vec<Edge> {
        let Some(node) = self.find_node(func) else {
            return Vec::new();
        };
        let neighbors = match direction {
            Direction::Outgoing => self.get_callees(node),
            Direction::Incoming => self.get_callers(node),
        };
        let mut edges: Vec<Edge> = neighbors
            .into_iter()
            .filter_map(|idx| self.get_node(idx))
            .map(|n| n.edge())
            .collect();
        edges.sort();
        edges
    }

    /// Number of edges of the given kind
    pub fn count_kind(&self, kind: CallKind) -> usize {
        self.graph
            .edge_references()
            .filter(|e| e.weight().kind == kind)
            .count()
    }
}
