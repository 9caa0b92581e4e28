//! The target abstraction: what a code generator receives and returns.

use std::path::PathBuf;

use thiserror::Error;

use super::options::GenerationOptions;
use crate::hir::{Diagnostic, ModelGraph};

/// One generated file, with a path relative to the output directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedArtifact {
    pub path: PathBuf,
    pub contents: String,
}

impl GeneratedArtifact {
    pub fn new(path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }
}

/// Artifacts plus the non-fatal findings made while assembling them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetOutput {
    pub artifacts: Vec<GeneratedArtifact>,
    pub diagnostics: Vec<Diagnostic>,
}

impl TargetOutput {
    pub fn artifact(&self, path: &str) -> Option<&GeneratedArtifact> {
        self.artifacts.iter().find(|a| a.path.as_os_str() == path)
    }
}

/// Fatal problems found while selecting or deriving components
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblyError {
    #[error("'{part}' exhibits conflicting state machines: {}", .machines.join(", "))]
    ConflictingExhibits { part: String, machines: Vec<String> },

    #[error("'{part}' exhibits '{target}', which declares no states")]
    NotAStateMachine { part: String, target: String },

    #[error("state machine '{machine}' exhibited by '{part}' has no initial state")]
    MissingInitialState { part: String, machine: String },

    #[error("cannot serialize {artifact}: {message}")]
    Serialize { artifact: String, message: String },

    #[error("components '{first}' and '{second}' both generate '{name}'")]
    DuplicateComponent {
        name: String,
        first: String,
        second: String,
    },
}

impl AssemblyError {
    pub fn serialize(artifact: &str, err: serde_json::Error) -> Self {
        Self::Serialize {
            artifact: artifact.to_string(),
            message: err.to_string(),
        }
    }
}

/// A code generator selectable by name
pub trait GeneratorTarget: Send + Sync {
    /// Registry key; matched case-insensitively.
    fn name(&self) -> &str;

    fn generate(
        &self,
        graph: &ModelGraph,
        options: &GenerationOptions,
    ) -> Result<TargetOutput, AssemblyError>;
}
