//! # modelgen-base
//!
//! Model-to-code pipeline for a textual SysML v2 subset: element parser,
//! model graph IR and target code assembly.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! engine    → One generation run: load → build → gate → assemble → write
//!   ↓
//! codegen   → Generator targets, component discovery, TypeScript assembly
//!   ↓
//! hir       → ModelGraph, name resolution, graph builder, validation gate
//!   ↓
//! project   → Model directory loading
//!   ↓
//! syntax    → Element closed variants, ModelIndex
//!   ↓
//! parser    → Logos lexer, recursive-descent element scanner, error codes
//!   ↓
//! base      → Positions, line index, reserved names
//! ```

// ============================================================================
// MODULES (dependency order: base → parser → syntax → project → hir → codegen)
// ============================================================================

/// Foundation types: positions, line index, domain constants
pub mod base;

/// Parser: Logos lexer, element scanner, ParseError
pub mod parser;

/// Syntax: Element, ElementData, ModelIndex
pub mod syntax;

/// Project loading: model directories and in-memory source units
pub mod project;

/// High-level IR: ModelGraph, builder, resolver, validation
pub mod hir;

/// Target assembly: registry, components, TypeScript target
pub mod codegen;

/// End-to-end generation runs
pub mod engine;

/// Top-level error type
pub mod error;

// Re-export the pipeline entry points
pub use codegen::{GeneratedArtifact, GenerationOptions, GeneratorTarget, TargetRegistry};
pub use engine::{GenerationReport, GenerationRequest, run_generation};
pub use error::GenerationError;
pub use hir::{ModelGraph, build_model_graph};
pub use project::{SourceUnit, load_model_directory, parse_sources};
pub use syntax::ModelIndex;

// Re-export foundation types
pub use base::{LineCol, LineIndex, Position, SourceLocation, Span, TextRange, TextSize};
