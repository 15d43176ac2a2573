//! # xref Index
//!
//! Declaration index over a checked program: types, interfaces with their
//! directly declared methods, and functions/methods with receiver and
//! result types.
//!
//! ## Architecture
//!
//! ```text
//! Program (units in file order)
//!     │
//!     ├──> type specs
//!     │      ├─ interface → InterfaceDecl (declared methods only)
//!     │      └─ other     → TypeDecl (struct flag)
//!     │
//!     ├──> func decls → FuncDecl (by package and by file)
//!     │
//!     └──> Queries (read-only, "not found" is a normal answer)
//!            ├─ resolve_receiver_named
//!            ├─ receiver_decl
//!            ├─ implemented_interfaces_declaring
//!            ├─ constructors_for
//!            └─ counterpart_methods_on
//! ```

mod counterpart;
mod index;
mod types;

pub use counterpart::CounterpartRules;
pub use index::Index;
pub use types::{FuncDecl, IfaceMethod, InterfaceDecl, ReceiverMatch, TypeDecl};
