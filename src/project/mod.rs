//! Model source loading
//!
//! Collects `.sysml` source units from disk (or memory) and parses them, in
//! sorted path order, into a single [`ModelIndex`](crate::syntax::ModelIndex).

mod loader;

pub use loader::{
    LoadError, SourceUnit, collect_model_files, load_model_directory, parse_sources,
};
