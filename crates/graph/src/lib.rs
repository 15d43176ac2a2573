//! # xref Graph
//!
//! Caller/callee queries over a whole program.
//!
//! ## Architecture
//!
//! ```text
//! Program (call sites: static / interface / dynamic)
//!     │
//!     ├──> Graph Builder
//!     │      ├─ Static graph: direct calls only
//!     │      └─ Dispatch graph: static calls + every concrete method
//!     │         that could receive an interface or untyped method call
//!     │
//!     └──> CallGraphEngine (built once, read-only afterwards)
//!            ├─ resolve (file, "(*T).M" | "F") → function
//!            ├─ static neighbors first, dispatch neighbors to top up
//!            └─ dedup by (label, path), sort, cap
//! ```
//!
//! The union deliberately over-approximates: dispatch edges may never be
//! taken at run time.

mod builder;
mod engine;
mod error;
mod graph;
mod types;

pub use builder::GraphBuilder;
pub use engine::CallGraphEngine;
pub use error::{GraphError, Result};
pub use types::{CallEdge, CallGraph, CallKind, Edge, FuncNode};
