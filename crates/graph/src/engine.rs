use crate::builder::GraphBuilder;
use crate::error::{GraphError, Result};
use crate::types::{CallGraph, Edge};
use once_cell::sync::OnceCell;
use petgraph::Direction;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use xref_program::{
    parse_input_symbol, recv_label, FuncId, FuncKind, GoLoader, Program, ProgramLoader,
};

/// Resolution key of a function: receiver label (`T`, `*T` or empty),
/// bare name, defining file
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct FnKey {
    recv: String,
    name: String,
    file: String,
}

/// Immutable state reached once initialization finished
#[derive(Default)]
struct Ready {
    static_graph: CallGraph,
    dispatch_graph: CallGraph,
    by_key: BTreeMap<FnKey, FuncId>,
    init_error: Option<String>,
}

impl Ready {
    fn empty() -> Self {
        Self::default()
    }

    fn failed(error: String) -> Self {
        Self {
            init_error: Some(error),
            ..Self::default()
        }
    }

    fn build(program: &Program) -> Self {
        let builder = GraphBuilder::new(program);
        let static_graph = builder.build_static();
        let dispatch_graph = builder.build_dispatch();

        let by_key = program
            .funcs()
            .iter()
            .filter(|f| f.is_concrete())
            // several `init` funcs may share a file and cannot be named
            .filter(|f| !(f.kind == FuncKind::Function && f.name == "init"))
            .map(|f| {
                let key = FnKey {
                    recv: recv_label(program, f.id).unwrap_or_default(),
                    name: f.name.clone(),
                    file: program.func_path(f.id).to_string(),
                };
                (key, f.id)
            })
            .collect();

        log::info!(
            "Built call graphs: {} functions, {} static edges, {} dispatch edges",
            static_graph.node_count(),
            static_graph.edge_count(),
            dispatch_graph.edge_count()
        );

        Self {
            static_graph,
            dispatch_graph,
            by_key,
            init_error: None,
        }
    }

    /// Resolve a (file, symbol) query to a function.
    ///
    /// With a receiver hint the receiver must match. Without one, free
    /// functions win over methods of the same name.
    fn resolve_target(&self, file: &str, symbol: &str) -> Option<FuncId> {
        let (recv, name) = parse_input_symbol(symbol);
        let file = file.replace('\\', "/");
        let (by_key, name, file) = (&self.by_key, name.as_str(), file.as_str());
        let candidates = move || {
            by_key
                .iter()
                .filter(move |(k, _)| k.name == name && file_matches(&k.file, file))
        };

        if !recv.is_empty() {
            return candidates()
                .find(|(k, _)| k.recv == recv)
                .map(|(_, id)| *id);
        }
        candidates()
            .find(|(k, _)| k.recv.is_empty())
            .or_else(|| candidates().next())
            .map(|(_, id)| *id)
    }

    /// Union of static then dispatch neighbors, deduplicated by
    /// (label, path), sorted, at most `max` entries
    fn collect(&self, target: FuncId, direction: Direction, max: usize) -> Vec<Edge> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();

        for graph in [&self.static_graph, &self.dispatch_graph] {
            if out.len() >= max {
                break;
            }
            for edge in graph.neighbor_edges(target, direction) {
                if out.len() >= max {
                    break;
                }
                if seen.insert(edge.clone()) {
                    out.push(edge);
                }
            }
        }

        out.sort();
        out.truncate(max);
        out
    }
}

/// Defining file `defined` matches query path `query` when it is equal to
/// it or ends with it at a path boundary; an empty query matches any file
fn file_matches(defined: &str, query: &str) -> bool {
    if query.is_empty() || defined == query {
        return true;
    }
    defined
        .strip_suffix(query)
        .is_some_and(|prefix| prefix.ends_with('/') || query.starts_with('/'))
}

/// Caller/callee engine over the union of a static and a dispatch graph.
///
/// Lifecycle: uninitialized, then ready (possibly empty) after the first
/// [`init`](Self::init). Initialization runs at most once; queries on an
/// uninitialized engine return empty lists.
pub struct CallGraphEngine {
    loader: Box<dyn ProgramLoader + Send + Sync>,
    state: OnceCell<Ready>,
}

impl Default for CallGraphEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl CallGraphEngine {
    /// Engine loading Go modules
    pub fn new() -> Self {
        Self::with_loader(GoLoader::new())
    }

    pub fn with_loader(loader: impl ProgramLoader + Send + Sync + 'static) -> Self {
        Self {
            loader: Box::new(loader),
            state: OnceCell::new(),
        }
    }

    /// Load the program under `root` and build both graphs (once).
    ///
    /// A missing manifest yields an empty ready engine and `Ok`. A load
    /// failure also leaves the engine ready and empty; the error is
    /// reported to this and every later call.
    pub fn init(&self, root: &Path) -> Result<()> {
        let ready = self.state.get_or_init(|| match self.loader.load(root) {
            Ok(Some(program)) => Ready::build(&program),
            Ok(None) => {
                log::info!("No module under {}, call graph is empty", root.display());
                Ready::empty()
            }
            Err(e) => {
                log::warn!("Call graph load failed for {}: {e}", root.display());
                Ready::failed(e.to_string())
            }
        });

        match &ready.init_error {
            Some(error) => Err(GraphError::init(error.clone())),
            None => Ok(()),
        }
    }

    /// Build from an already loaded program (shared with the index).
    /// No-op when the engine is already initialized.
    pub fn init_with_program(&self, program: Arc<Program>) {
        self.state.get_or_init(|| Ready::build(&program));
    }

    pub fn is_ready(&self) -> bool {
        self.state.get().is_some()
    }

    /// Up to `max` distinct callees of the function `symbol` defined in `file`
    pub fn get_callees(&self, file: &str, symbol: &str, max: usize) -> Vec<Edge> {
        self.query(file, symbol, max, Direction::Outgoing)
    }

    /// Up to `max` distinct callers of the function `symbol` defined in `file`
    pub fn get_callers(&self, file: &str, symbol: &str, max: usize) -> Vec<Edge> {
        self.query(file, symbol, max, Direction::Incoming)
    }

    fn query(&self, file: &str, symbol: &str, max: usize, direction: Direction) -> Vec<Edge> {
        let Some(ready) = self.state.get() else {
            return Vec::new();
        };
        if max == 0 {
            return Vec::new();
        }
        match ready.resolve_target(file, symbol) {
            Some(target) => ready.collect(target, direction, max),
            None => {
                log::debug!("No call graph node for {symbol} in {file}");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_suffix_respects_path_boundaries() {
        assert!(file_matches("pkg/store/store.go", "store/store.go"));
        assert!(file_matches("pkg/store/store.go", "pkg/store/store.go"));
        assert!(file_matches("pkg/store/store.go", ""));
        assert!(!file_matches("pkg/store/kvstore.go", "store.go"));
        assert!(!file_matches("store.go", "pkg/store.go"));
    }

    #[test]
    fn init_functions_are_not_query_targets() {
        let program = GoLoader::from_sources(
            "example.com/boot",
            &[(
                "boot.go",
                "package boot\n\nfunc init() { setup() }\n\nfunc init() { setup() }\n\nfunc setup() {}\n",
            )],
        )
        .expect("program");

        let engine = CallGraphEngine::new();
        engine.init_with_program(Arc::new(program));
        assert!(engine.get_callees("boot.go", "init", 10).is_empty());
        assert_eq!(
            engine.get_callers("boot.go", "setup", 10),
            vec![Edge {
                symbol: "init".to_string(),
                path: "boot.go".to_string(),
            }]
        );
    }

    #[test]
    fn uninitialized_engine_answers_empty() {
        let engine = CallGraphEngine::new();
        assert!(!engine.is_ready());
        assert!(engine.get_callers("a.go", "F", 10).is_empty());
    }
}
