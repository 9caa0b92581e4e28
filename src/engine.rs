//! One generation run, end to end.
//!
//! ```text
//! model dir ─load─▶ ModelIndex ─build─▶ ModelGraph ─gate─▶ target ─write─▶ output dir
//! ```
//!
//! Each stage consumes the immutable result of the one before it; any
//! failure ends the run before the next stage starts.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::codegen::{GeneratedArtifact, GenerationOptions, TargetOutput, TargetRegistry, TypeScriptTarget};
use crate::error::{GenerationError, Result};
use crate::hir::{DefaultGate, Diagnostic, ValidationGate, build_model_graph};
use crate::project::{SourceUnit, load_model_directory, parse_sources};
use crate::syntax::ModelIndex;

/// Inputs of one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub model_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Registry name of the target
    pub target: String,
    pub options: GenerationOptions,
}

impl GenerationRequest {
    /// A TypeScript run with default options.
    pub fn new(model_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            model_dir: model_dir.into(),
            output_dir: output_dir.into(),
            target: TypeScriptTarget::NAME.to_string(),
            options: GenerationOptions::default(),
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the options with those read from a JSON file.
    pub fn with_options_file(mut self, path: &Path) -> Result<Self> {
        self.options = GenerationOptions::from_json_file(path)?;
        Ok(self)
    }
}

/// What a finished run wrote and found
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationReport {
    /// Written files, each joined onto the output directory
    pub written: Vec<PathBuf>,
    /// Gate findings followed by target findings
    pub diagnostics: Vec<Diagnostic>,
}

impl GenerationReport {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// Run with the built-in targets and the default validation gate.
pub fn run_generation(request: &GenerationRequest) -> Result<GenerationReport> {
    run_generation_with(request, &TargetRegistry::with_builtin_targets(), &DefaultGate)
}

pub fn run_generation_with(
    request: &GenerationRequest,
    registry: &TargetRegistry,
    gate: &dyn ValidationGate,
) -> Result<GenerationReport> {
    info!(
        model_dir = %request.model_dir.display(),
        target = %request.target,
        "generation started"
    );
    // Unknown targets fail before any parsing work.
    registry.get(&request.target)?;
    let index = load_model_directory(&request.model_dir)?;
    let output = generate_from_index(&index, registry, &request.target, &request.options, gate)?;
    let written = write_artifacts(&request.output_dir, &output.artifacts)?;
    info!(
        written = written.len(),
        diagnostics = output.diagnostics.len(),
        "generation finished"
    );
    Ok(GenerationReport {
        written,
        diagnostics: output.diagnostics,
    })
}

/// Parse in-memory sources and generate without touching the filesystem.
pub fn generate_from_sources(
    units: &[SourceUnit],
    registry: &TargetRegistry,
    target: &str,
    options: &GenerationOptions,
    gate: &dyn ValidationGate,
) -> Result<TargetOutput> {
    let index = parse_sources(units)?;
    generate_from_index(&index, registry, target, options, gate)
}

/// Build, validate and assemble from an already parsed index.
pub fn generate_from_index(
    index: &ModelIndex,
    registry: &TargetRegistry,
    target: &str,
    options: &GenerationOptions,
    gate: &dyn ValidationGate,
) -> Result<TargetOutput> {
    let target = registry.get(target)?;
    let graph = build_model_graph(index)?;

    let report = gate.check(&graph);
    if !report.passed() {
        warn!(gate = gate.name(), "validation gate failed");
        return Err(GenerationError::Validation(report));
    }
    debug!(gate = gate.name(), findings = report.diagnostics.len(), "validation gate passed");

    let mut output = target.generate(&graph, options)?;
    let mut diagnostics = report.diagnostics;
    diagnostics.append(&mut output.diagnostics);
    output.diagnostics = diagnostics;
    Ok(output)
}

/// Write artifacts below `output_dir`, creating directories as needed.
pub fn write_artifacts(output_dir: &Path, artifacts: &[GeneratedArtifact]) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(artifacts.len());
    for artifact in artifacts {
        let path = output_dir.join(&artifact.path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| GenerationError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&path, &artifact.contents).map_err(|source| GenerationError::Io {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), bytes = artifact.contents.len(), "wrote artifact");
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hir::GateReport;
    use tempfile::TempDir;

    struct RejectAll;

    impl ValidationGate for RejectAll {
        fn name(&self) -> &str {
            "reject-all"
        }

        fn check(&self, _graph: &crate::hir::ModelGraph) -> GateReport {
            GateReport::new(vec![Diagnostic::error("rejected")])
        }
    }

    const MODEL: &str = "package P {
        state def M { entry; then A; state A; }
        part def Widget { exhibit state m : M; }
    }";

    #[test]
    fn test_failed_gate_blocks_assembly() {
        let registry = TargetRegistry::with_builtin_targets();
        let result = generate_from_sources(
            &[SourceUnit::new("m.sysml", MODEL)],
            &registry,
            "typescript",
            &GenerationOptions::default(),
            &RejectAll,
        );
        assert!(matches!(result, Err(GenerationError::Validation(report)) if !report.passed()));
    }

    #[test]
    fn test_unknown_target_fails_before_loading() {
        let out = TempDir::new().unwrap();
        let request = GenerationRequest::new(out.path().join("missing"), out.path())
            .with_target("latex");
        assert!(matches!(
            run_generation(&request),
            Err(GenerationError::UnknownTarget(_))
        ));
    }

    #[test]
    fn test_write_artifacts_creates_directories() {
        let out = TempDir::new().unwrap();
        let written = write_artifacts(
            out.path(),
            &[GeneratedArtifact::new("src/nested/a.ts", "export {};\n")],
        )
        .unwrap();
        assert_eq!(written, vec![out.path().join("src/nested/a.ts")]);
        assert_eq!(fs::read_to_string(&written[0]).unwrap(), "export {};\n");
    }
}
