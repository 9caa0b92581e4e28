//! Target assembly: from a built [`ModelGraph`](crate::hir::ModelGraph) to
//! generated source files.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ TargetRegistry      name ─▶ Box<dyn GeneratorTarget>          │
//! ├──────────────────────────────────────────────────────────────┤
//! │ components          part defs exhibiting a state machine     │
//! │ state_machine       sorted states, deduplicated transitions  │
//! │ types               referenced part types, dependency order  │
//! │ naming              casing and type mapping                  │
//! ├──────────────────────────────────────────────────────────────┤
//! │ typescript          module assembly, index.ts, config.json   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Targets never write to disk; they return [`GeneratedArtifact`]s with
//! paths relative to the output directory.

mod components;
mod naming;
mod options;
mod registry;
mod state_machine;
mod target;
mod text;
mod types;
mod typescript;

pub use components::{Component, Discovery, discover_components};
pub use naming::{
    UnknownType, find_collision, map_type, sanitize_identifier, to_camel, to_class_name,
    to_screaming_snake, to_snake,
};
pub use options::{GenerationOptions, OptionsError};
pub use registry::{RegistryError, TargetRegistry};
pub use state_machine::{DispatchRow, StateMachineModel, Transition, derive_state_machine};
pub use target::{AssemblyError, GeneratedArtifact, GeneratorTarget, TargetOutput};
pub use types::resolve_type_preamble;
pub use typescript::{TypeScriptTarget, assemble_component, generated_header};
