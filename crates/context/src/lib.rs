//! # xref Context
//!
//! Picks a handful of short, labeled source excerpts that explain a
//! method: the receiver type, an interface contract it satisfies, an
//! optional counterpart method and a constructor.
//!
//! ## Architecture
//!
//! ```text
//! FunctionRecord { path, name, recv }
//!     │
//!     └──> ContextSelector (Index + LineSource)
//!            ├─ resolve receiver (file first, whole program fallback)
//!            ├─ receiver_type       → type declaration
//!            ├─ interface_method    → first satisfied interface declaring it
//!            ├─ counterpart_method  → Open/Close, Get/Set, ... (opt-in)
//!            ├─ factory_constructor → New… returning T or *T
//!            └─ dedup (path, start, end), sort (path, start), cap max_refs
//! ```
//!
//! Every excerpt is clipped to `max_lines` and normalized (LF newlines,
//! trailing whitespace trimmed, URLs redacted).

mod config;
mod selector;
mod types;

pub use config::{
    ContextRefConfig, DEFAULT_MAX_LINES, DEFAULT_MAX_REFS, HARD_CAP_MAX_LINES, HARD_CAP_MAX_REFS,
};
pub use selector::{slice_lines, ContextSelector};
pub use types::{ContextRef, RefKind};
