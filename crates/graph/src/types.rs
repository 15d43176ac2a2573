use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use xref_program::FuncId;

/// Compact caller/callee reference.
///
/// Field order gives the (label, path) ordering used for results.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Edge {
    /// `Name`, `(T).Name` or `(*T).Name`
    pub symbol: String,

    /// Repo-relative file path
    pub path: String,
}

/// Function node in a call graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuncNode {
    pub func: FuncId,

    /// Display label (see [`Edge::symbol`])
    pub label: String,

    /// Defining file
    pub path: String,
}

impl FuncNode {
    pub fn edge(&self) -> Edge {
        Edge {
            symbol: self.label.clone(),
            path: self.path.clone(),
        }
    }
}

/// How a call edge was derived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallKind {
    /// Direct call resolved from syntax and types
    Static,
    /// Call through an interface, connected to every implementer
    Interface,
    /// Method call on a receiver of unknown type, matched by name and arity
    Dynamic,
}

/// Call edge weight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallEdge {
    pub kind: CallKind,
    /// First call site line in the caller
    pub line: usize,
}

/// Directed call graph over concrete functions
#[derive(Debug, Clone, Default)]
pub struct CallGraph {
    /// caller -> callee
    pub graph: DiGraph<FuncNode, CallEdge>,

    /// FuncId -> NodeIndex mapping for fast lookup
    pub func_index: HashMap<FuncId, NodeIndex>,
}

impl CallGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: FuncNode) -> NodeIndex {
        let func = node.func;
        let idx = self.graph.add_node(node);
        self.func_index.insert(func, idx);
        idx
    }

    /// Add a call edge; repeated calls between the same pair keep the
    /// first edge
    pub fn add_call(&mut self, caller: FuncId, callee: FuncId, edge: CallEdge) -> bool {
        let (Some(&from), Some(&to)) = (self.func_index.get(&caller), self.func_index.get(&callee))
        else {
            return false;
        };
        if self.graph.find_edge(from, to).is_some() {
            return false;
        }
        self.graph.add_edge(from, to, edge);
        true
    }

    pub fn find_node(&self, func: FuncId) -> Option<NodeIndex> {
        self.func_index.get(&func).copied()
    }

    pub fn get_node(&self, idx: NodeIndex) -> Option<&FuncNode> {
        self.graph.node_weight(idx)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}
