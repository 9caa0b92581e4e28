//! High-level IR (HIR): the typed model graph and everything that reads it.
//!
//! The graph is built once per run from a [`ModelIndex`](crate::syntax::ModelIndex)
//! and never changes afterwards. Downstream consumers only use the query
//! layer on [`ModelGraph`].
//!
//! ## Key Types
//!
//! - [`ModelGraph`]: nodes, typed edges and traversal queries
//! - [`Resolver`]: reference lookup over the element index
//! - [`build_model_graph`]: the one-shot ModelIndex → ModelGraph transformation
//! - [`ValidationGate`]: pass/fail check run before code assembly
//!
//! ## Pipeline
//!
//! ```text
//! ModelIndex
//!     │
//!     ▼
//! build_model_graph     ← resolve references, collect BuildErrors
//!     │
//!     ▼
//! ModelGraph            ← read-only query layer
//!     │
//!     ▼
//! ValidationGate        ← GateReport (diagnostics)
//! ```

mod builder;
mod diagnostics;
mod graph;
mod resolve;
mod validation;

pub use builder::{BuildError, GraphBuildError, build_model_graph};
pub use diagnostics::{Diagnostic, DiagnosticCollector, RelatedInfo, Severity, codes};
pub use graph::{Edge, EdgeKind, EdgeLabel, FlatTransition, ModelGraph, Node};
pub use resolve::{ResolveResult, Resolver};
pub use validation::{DefaultGate, GateReport, ValidationGate};
