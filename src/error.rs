//! Top-level error of a generation run.

use std::path::PathBuf;

use thiserror::Error;

use crate::codegen::{AssemblyError, OptionsError, RegistryError};
use crate::hir::{GateReport, GraphBuildError};
use crate::parser::ParseError;
use crate::project::LoadError;

/// Why a generation run produced no output.
///
/// Every variant aborts the run before any artifact is written, except
/// [`GenerationError::Io`], which may leave earlier artifacts on disk.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Build(#[from] GraphBuildError),

    #[error("validation failed: {0}")]
    Validation(GateReport),

    #[error(transparent)]
    UnknownTarget(#[from] RegistryError),

    #[error(transparent)]
    Assembly(#[from] AssemblyError),

    #[error(transparent)]
    Config(#[from] OptionsError),

    #[error("cannot write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T, E = GenerationError> = std::result::Result<T, E>;
