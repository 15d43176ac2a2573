use crate::types::{CallEdge, CallGraph, CallKind, FuncNode};
use std::collections::HashMap;
use xref_program::{func_label, CallTarget, FuncId, FuncKind, Program, TypeId};

/// Builds call graphs over the concrete functions of a program
pub struct GraphBuilder<'p> {
    program: &'p Program,
}

impl<'p> GraphBuilder<'p> {
    pub fn new(program: &'p Program) -> Self {
        Self { program }
    }

    /// Graph with one node per concrete function and no edges
    fn nodes(&self) -> CallGraph {
        let mut graph = CallGraph::new();
        for func in self.program.funcs().iter().filter(|f| f.is_concrete()) {
            graph.add_node(FuncNode {
                func: func.id,
                label: func_label(self.program, func.id),
                path: self.program.func_path(func.id).to_string(),
            });
        }
        graph
    }

    /// Precise graph: statically resolved calls only
    pub fn build_static(&self) -> CallGraph {
        let mut graph = self.nodes();
        for call in self.program.calls() {
            if let CallTarget::Static(callee) = call.target {
                graph.add_call(
                    call.caller,
                    callee,
                    CallEdge {
                        kind: CallKind::Static,
                        line: call.line,
                    },
                );
            }
        }
        log::debug!(
            "Static call graph: {} nodes, {} edges",
            graph.node_count(),
            graph.edge_count()
        );
        graph
    }

    /// Conservative graph: static calls plus every concrete method that
    /// could receive an interface or unresolved method call
    pub fn build_dispatch(&self) -> CallGraph {
        let mut graph = self.nodes();
        let mut implementers: HashMap<TypeId, Vec<TypeId>> = HashMap::new();
        let mut by_name: HashMap<&str, Vec<FuncId>> = HashMap::new();
        for func in self.program.funcs() {
            if matches!(func.kind, FuncKind::Method { .. }) {
                by_name.entry(func.name.as_str()).or_default().push(func.id);
            }
        }

        for call in self.program.calls() {
            let (kind, callees) = match &call.target {
                CallTarget::Static(callee) => (CallKind::Static, vec![*callee]),
                CallTarget::Interface { iface, method } => {
                    let types = implementers
                        .entry(*iface)
                        .or_insert_with(|| self.implementers(*iface));
                    (CallKind::Interface, self.dispatch_targets(types, method))
                }
                CallTarget::Dynamic { method, arity } => {
                    let callees = by_name
                        .get(method.as_str())
                        .map(|candidates| {
                            candidates
                                .iter()
                                .copied()
                                .filter(|id| self.program.func(*id).signature.accepts_arity(*arity))
                                .collect()
                        })
                        .unwrap_or_default();
                    (CallKind::Dynamic, callees)
                }
            };

            for callee in callees {
                graph.add_call(
                    call.caller,
                    callee,
                    CallEdge {
                        kind,
                        line: call.line,
                    },
                );
            }
        }

        log::debug!(
            "Dispatch call graph: {} nodes, {} edges ({} via interfaces, {} by name)",
            graph.node_count(),
            graph.edge_count(),
            graph.count_kind(CallKind::Interface),
            graph.count_kind(CallKind::Dynamic)
        );
        graph
    }

    /// Concrete types whose pointer method set satisfies `iface`
    fn implementers(&self, iface: TypeId) -> Vec<TypeId> {
        self.program
            .concrete_types()
            .filter(|ty| self.program.implements(*ty, true, iface))
            .collect()
    }

    fn dispatch_targets(&self, types: &[TypeId], method: &str) -> Vec<FuncId> {
        types
            .iter()
            .filter_map(|ty| self.program.method_set(*ty, true).get(method).copied())
            .filter(|id| self.program.func(*id).is_concrete())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xref_program::GoLoader;

    const SRC: &str = r#"package shapes

type Shape interface {
	Area() float64
}

type Square struct{ side float64 }

func (s *Square) Area() float64 { return s.side * s.side }

type Circle struct{ r float64 }

func (c Circle) Area() float64 { return 3 * c.r * c.r }

type Label struct{}

func (Label) Area() string { return "" }

func Total(shapes []Shape) float64 {
	var sum float64
	for _, s := range shapes {
		sum += s.Area()
	}
	return sum
}
"#;

    fn labels(graph: &CallGraph, program: &Program, caller: &str) -> Vec<String> {
        let func = program
            .funcs()
            .iter()
            .find(|f| f.name == caller)
            .expect("caller");
        graph
            .neighbor_edges(func.id, petgraph::Direction::Outgoing)
            .into_iter()
            .map(|e| e.symbol)
            .collect()
    }

    #[test]
    fn interface_calls_only_reach_dispatch_graph() {
        let program = GoLoader::from_sources("example.com/shapes", &[("shapes.go", SRC)])
            .expect("program");
        let builder = GraphBuilder::new(&program);

        let static_graph = builder.build_static();
        let dispatch_graph = builder.build_dispatch();

        assert!(labels(&static_graph, &program, "Total").is_empty());
        // Label.Area returns string, so Label is not a Shape
        assert_eq!(
            labels(&dispatch_graph, &program, "Total"),
            vec!["(*Square).Area".to_string(), "(Circle).Area".to_string()]
        );
        assert_eq!(dispatch_graph.count_kind(CallKind::Interface), 2);
    }

    #[test]
    fn abstract_methods_are_not_nodes() {
        let program = GoLoader::from_sources("example.com/shapes", &[("shapes.go", SRC)])
            .expect("program");
        let graph = GraphBuilder::new(&program).build_static();
        // Square.Area, Circle.Area, Label.Area, Total
        assert_eq!(graph.node_count(), 4);
    }
}
