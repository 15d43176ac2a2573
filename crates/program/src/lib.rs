//! # xref Program
//!
//! Whole-program representation of a Go module, built once and shared by
//! the declaration index and the call graph engine.
//!
//! ## Architecture
//!
//! ```text
//! Module root (go.mod)
//!     │
//!     ├──> GoLoader: walk *.go (.gitignore aware, skip vendor/testdata/tests)
//!     │
//!     ├──> Tree-sitter parsing → owned syntax summary per file
//!     │
//!     ├──> Checker
//!     │    ├─> declare package-level types and functions
//!     │    ├─> resolve struct fields, interface methods, signatures
//!     │    ├─> attach methods to receivers
//!     │    └─> type bodies, classify calls (static / interface / dynamic)
//!     │
//!     └──> Program: arenas of packages, units, types, funcs + call sites
//! ```
//!
//! ## Example
//!
//! ```rust
//! use xref_program::{func_label, GoLoader};
//!
//! let program = GoLoader::from_sources(
//!     "example.com/demo",
//!     &[("demo.go", "package demo\n\ntype T struct{}\n\nfunc (t *T) Run() {}\n")],
//! )
//! .unwrap();
//!
//! let run = program.funcs().iter().find(|f| f.name == "Run").unwrap();
//! assert_eq!(func_label(&program, run.id), "(*T).Run");
//! ```

mod error;
mod go;
mod loader;
mod model;
mod source;
mod symbol;
mod typecheck;

pub use error::{ProgramError, Result};
pub use loader::{GoLoader, ProgramLoader};
pub use model::{
    CallSite, CallTarget, Decl, Field, FuncId, FuncKind, FuncObj, FuncSpec, Ident,
    InterfaceMember, LineSpan, NamedType, Object, Package, PackageId, Pos, Program, Signature,
    TypeId, TypeRef, TypeShape, TypeSpec, Underlying, Unit, UnitId,
};
pub use source::{normalize_code, LineSource, SourceCache};
pub use symbol::{func_label, parse_input_symbol, recv_label, FunctionRecord};
