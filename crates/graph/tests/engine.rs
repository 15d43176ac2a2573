use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use xref_graph::{CallGraphEngine, Edge, GraphError};
use xref_program::GoLoader;

const STORE: &str = r#"package store

type Store interface {
	Get(key string) (string, error)
}

type Memory struct{ data map[string]string }

func NewMemory() *Memory { return &Memory{data: map[string]string{}} }

func (m *Memory) Get(key string) (string, error) { return m.data[key], nil }

type Disk struct{}

func (d Disk) Get(key string) (string, error) { return "", nil }
"#;

const SERVICE: &str = r#"package svc

import (
	"github.com/acme/cache"

	"example.com/svc/store"
)

type Service struct {
	store store.Store
}

func New() *Service {
	return &Service{store: store.NewMemory()}
}

func (s *Service) Lookup(key string) string {
	v, err := s.store.Get(key)
	if err != nil {
		return fallback(key)
	}
	return v
}

func fallback(key string) string { return key }

func Lookup(key string) string {
	return New().Lookup(key)
}

func Warm(c cache.Cache, key string) {
	c.Get(key)
}
"#;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("mkdir");
    }
    fs::write(path, content).expect("write");
}

fn module() -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    write(dir.path(), "go.mod", "module example.com/svc\n\ngo 1.22\n");
    write(dir.path(), "store/store.go", STORE);
    write(dir.path(), "service.go", SERVICE);
    dir
}

fn engine() -> (tempfile::TempDir, CallGraphEngine) {
    let dir = module();
    let engine = CallGraphEngine::new();
    engine.init(dir.path()).expect("init");
    (dir, engine)
}

fn edge(symbol: &str, path: &str) -> Edge {
    Edge {
        symbol: symbol.to_string(),
        path: path.to_string(),
    }
}

#[test]
fn callees_union_static_and_dispatch() {
    let (_dir, engine) = engine();
    let callees = engine.get_callees("service.go", "(*Service).Lookup", 10);
    assert_eq!(
        callees,
        vec![
            edge("(*Memory).Get", "store/store.go"),
            edge("(Disk).Get", "store/store.go"),
            edge("fallback", "service.go"),
        ]
    );
}

#[test]
fn static_edges_fill_the_cap_first() {
    let (_dir, engine) = engine();
    assert_eq!(
        engine.get_callees("service.go", "(*Service).Lookup", 1),
        vec![edge("fallback", "service.go")]
    );
    assert_eq!(
        engine.get_callees("service.go", "(*Service).Lookup", 2),
        vec![
            edge("(*Memory).Get", "store/store.go"),
            edge("fallback", "service.go"),
        ]
    );
    assert!(engine
        .get_callees("service.go", "(*Service).Lookup", 0)
        .is_empty());
}

#[test]
fn callers_through_interface_dispatch() {
    let (_dir, engine) = engine();
    assert_eq!(
        engine.get_callers("store/store.go", "(Disk).Get", 10),
        vec![
            edge("(*Service).Lookup", "service.go"),
            edge("Warm", "service.go"),
        ]
    );
    assert_eq!(
        engine.get_callers("service.go", "fallback", 10),
        vec![edge("(*Service).Lookup", "service.go")]
    );
}

#[test]
fn bare_symbol_prefers_free_function() {
    let (_dir, engine) = engine();
    assert_eq!(
        engine.get_callees("service.go", "Lookup", 10),
        vec![
            edge("(*Service).Lookup", "service.go"),
            edge("New", "service.go"),
        ]
    );
    // package-qualified input is reduced to the bare name
    assert_eq!(
        engine.get_callers("service.go", "svc.New", 10),
        vec![edge("Lookup", "service.go")]
    );
}

#[test]
fn untyped_receiver_calls_match_by_name_and_arity() {
    let (_dir, engine) = engine();
    assert_eq!(
        engine.get_callees("service.go", "Warm", 10),
        vec![
            edge("(*Memory).Get", "store/store.go"),
            edge("(Disk).Get", "store/store.go"),
        ]
    );
}

#[test]
fn queries_are_idempotent_sorted_and_unique() {
    let (_dir, engine) = engine();
    let first = engine.get_callers("store/store.go", "(*Memory).Get", 10);
    let second = engine.get_callers("store/store.go", "(*Memory).Get", 10);
    assert_eq!(
        serde_json::to_string(&first).expect("json"),
        serde_json::to_string(&second).expect("json")
    );

    let mut sorted = first.clone();
    sorted.sort();
    sorted.dedup();
    assert_eq!(first, sorted);
}

#[test]
fn unknown_targets_yield_empty_results() {
    let (_dir, engine) = engine();
    assert!(engine.get_callees("service.go", "Missing", 10).is_empty());
    assert!(engine.get_callees("other.go", "fallback", 10).is_empty());
    assert!(engine
        .get_callees("service.go", "(*Disk).Get", 10)
        .is_empty());
}

#[test]
fn no_manifest_is_ready_and_empty() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(dir.path(), "main.go", "package main\n\nfunc main() { run() }\n\nfunc run() {}\n");

    let engine = CallGraphEngine::new();
    engine.init(dir.path()).expect("init without go.mod");
    assert!(engine.is_ready());
    assert!(engine.get_callers("main.go", "run", 10).is_empty());
    assert!(engine.get_callees("main.go", "main", 10).is_empty());
}

#[test]
fn load_failure_collapses_to_empty_ready_state() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(dir.path(), "go.mod", "go 1.22\n");

    let engine = CallGraphEngine::new();
    let first = engine.init(dir.path());
    assert!(matches!(first, Err(GraphError::InitError(_))));
    assert!(engine.is_ready());
    assert!(engine.get_callees("main.go", "main", 10).is_empty());
    // the one-time outcome is reported again, nothing is rebuilt
    assert_eq!(engine.init(dir.path()), first);
}

#[test]
fn init_runs_once() {
    let program = GoLoader::from_sources(
        "example.com/svc",
        &[("store/store.go", STORE), ("service.go", SERVICE)],
    )
    .expect("program");

    let engine = CallGraphEngine::new();
    engine.init_with_program(Arc::new(program));

    // a later init against an empty directory does not replace the graphs
    let empty = tempfile::tempdir().expect("tempdir");
    engine.init(empty.path()).expect("init");
    assert_eq!(
        engine.get_callers("service.go", "fallback", 10),
        vec![edge("(*Service).Lookup", "service.go")]
    );
}
